//! End-to-end harness test terhadap stub server lokal
//!
//! Usage:
//!   cargo test --test harness_e2e -- --nocapture

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;

use termchat_bench::network::{StubBehavior, StubHandle};
use termchat_bench::protocol::{CommandType, MAX_FRAME_SIZE};
use termchat_bench::{run_benchmark, BenchConfig, BenchError, FrameError, Stage};

fn local() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn config(addr: SocketAddr, total: u64, warmup: u32) -> BenchConfig {
    BenchConfig {
        addr: addr.to_string(),
        total_messages: total,
        warmup_rounds: warmup,
        ..Default::default()
    }
}

#[test]
fn test_five_messages_against_stub() {
    let stub = StubHandle::spawn(local(), StubBehavior::Standard).unwrap();

    let report = run_benchmark(config(stub.addr(), 5, 0)).unwrap();
    println!("{}", report);

    assert_eq!(report.messages, 5);
    assert!(report.min <= report.avg);
    assert!(report.avg <= report.max);
    assert!(report.qps > 0.0);

    let mut expected = vec![CommandType::RegisterReq, CommandType::LoginReq];
    expected.extend([CommandType::P2pMsgReq; 5]);
    assert_eq!(stub.received(), expected);

    stub.shutdown().unwrap();
}

#[test]
fn test_default_warmup_against_stub() {
    let stub = StubHandle::spawn(local(), StubBehavior::Standard).unwrap();

    let report = run_benchmark(config(stub.addr(), 50, 100)).unwrap();

    assert_eq!(report.messages, 50);
    assert_eq!(stub.received().len(), 2 + 100 + 50);

    stub.shutdown().unwrap();
}

#[test]
fn test_mismatched_register_reply_stops_handshake() {
    let stub = StubHandle::spawn(local(), StubBehavior::LoginForRegister).unwrap();

    match run_benchmark(config(stub.addr(), 5, 0)) {
        Err(BenchError::UnexpectedResponse {
            stage,
            expected,
            actual,
        }) => {
            assert_eq!(stage, Stage::Register);
            assert_eq!(expected, CommandType::RegisterRes);
            assert_eq!(actual, CommandType::LoginRes);
        }
        other => panic!("expected handshake failure, got {:?}", other),
    }

    // LOGIN_REQ tidak pernah dikirim
    assert_eq!(stub.received(), vec![CommandType::RegisterReq]);

    stub.shutdown().unwrap();
}

#[test]
fn test_connection_refused() {
    let addr = TcpListener::bind(local()).unwrap().local_addr().unwrap();

    let err = run_benchmark(config(addr, 5, 0)).unwrap_err();
    assert!(matches!(err, BenchError::Connect { .. }));
    assert_eq!(err.stage(), Some(Stage::Connect));
}

/// Server mentah: baca satu frame request, tulis `reply`, lalu tutup
fn raw_server(reply: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind(local()).unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            // Frame dibaca habis supaya close mengirim FIN, bukan RST
            let mut header = [0u8; 4];
            if stream.read_exact(&mut header).is_ok() {
                let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
                let _ = stream.read_exact(&mut body);
            }
            let _ = stream.write_all(&reply);
        }
    });

    addr
}

#[test]
fn test_oversized_reply_is_rejected() {
    let header = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes().to_vec();
    let addr = raw_server(header);

    match run_benchmark(config(addr, 5, 0)) {
        Err(BenchError::Frame {
            stage: Stage::Register,
            source: FrameError::TooLarge { len, .. },
        }) => assert_eq!(len, MAX_FRAME_SIZE + 1),
        other => panic!("expected TooLarge, got {:?}", other),
    }
}

#[test]
fn test_server_closing_mid_frame() {
    let mut partial = 64u32.to_be_bytes().to_vec();
    partial.extend_from_slice(&[0u8; 10]);
    let addr = raw_server(partial);

    match run_benchmark(config(addr, 5, 0)) {
        Err(BenchError::Frame {
            stage: Stage::Register,
            source: FrameError::Truncated { got, expected },
        }) => {
            assert_eq!(got, 10);
            assert_eq!(expected, 64);
        }
        other => panic!("expected Truncated, got {:?}", other),
    }
}

#[test]
fn test_server_closing_without_reply() {
    let addr = raw_server(Vec::new());

    let err = run_benchmark(config(addr, 5, 0)).unwrap_err();
    assert!(matches!(
        err,
        BenchError::Frame {
            stage: Stage::Register,
            source: FrameError::Closed,
        }
    ));
}
