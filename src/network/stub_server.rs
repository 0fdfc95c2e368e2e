//! Stub server dengan event-driven I/O
//!
//! Menggunakan mio untuk non-blocking I/O multiplexing. Server ini
//! menjawab request termchat dengan reply sukses tetap, cukup untuk
//! menjalankan benchmark tanpa backend asli.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, info, warn};

use crate::protocol::{
    decode_frame, encode_frame, AuthResult, BincodeCodec, CommandType, Envelope, P2pAck, Payload,
};

const SERVER_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 128;
const READ_CHUNK_SIZE: usize = 64 * 1024;
/// Timeout poll, menentukan seberapa cepat stop flag terbaca
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Log command yang diterima server, urut kedatangan
pub type ReceivedLog = Arc<Mutex<Vec<CommandType>>>;

/// Cara stub server menjawab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StubBehavior {
    /// REGISTER_RES / LOGIN_RES / P2P_MSG_RES sesuai request
    #[default]
    Standard,
    /// Jawab REGISTER_REQ dengan LOGIN_RES (protocol violation)
    LoginForRegister,
}

/// Pembuat reply; terpisah dari map koneksi supaya borrow tidak bentrok
struct Responder {
    behavior: StubBehavior,
    received: ReceivedLog,
    next_user_id: u64,
    next_msg_id: u64,
}

impl Responder {
    fn respond(&mut self, req: &Envelope) -> Envelope {
        if let Ok(mut log) = self.received.lock() {
            log.push(req.cmd);
        }

        let ok = AuthResult {
            success: true,
            ..Default::default()
        };

        let payload = match (&req.payload, self.behavior) {
            (Some(Payload::RegisterReq(_)), StubBehavior::LoginForRegister) => {
                Some(Payload::LoginRes(ok))
            }
            (Some(Payload::RegisterReq(_)), StubBehavior::Standard) => {
                Some(Payload::RegisterRes(ok))
            }
            (Some(Payload::LoginReq(_)), _) => {
                self.next_user_id += 1;
                Some(Payload::LoginRes(AuthResult {
                    user_id: self.next_user_id,
                    ..ok
                }))
            }
            (Some(Payload::P2pMsgReq(_)), _) => {
                self.next_msg_id += 1;
                Some(Payload::P2pMsgRes(P2pAck {
                    success: true,
                    msg_id: self.next_msg_id,
                }))
            }
            _ => None,
        };

        match payload {
            Some(payload) => Envelope::new(req.seq, payload),
            None => Envelope::bare(CommandType::Unknown, req.seq),
        }
    }
}

/// Koneksi client di sisi stub
struct StubConn {
    stream: TcpStream,
    addr: SocketAddr,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
    wants_write: bool,
}

/// Stub server
pub struct StubServer {
    poll: Poll,
    listener: TcpListener,
    conns: HashMap<Token, StubConn>,
    next_token: usize,
    responder: Responder,
    codec: BincodeCodec,
}

impl StubServer {
    /// Bind server; port 0 memilih port ephemeral
    pub fn bind(addr: SocketAddr, behavior: StubBehavior) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, SERVER_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            listener,
            conns: HashMap::new(),
            next_token: 1,
            responder: Responder {
                behavior,
                received: Arc::new(Mutex::new(Vec::new())),
                next_user_id: 0,
                next_msg_id: 0,
            },
            codec: BincodeCodec,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle ke log command yang diterima
    pub fn received(&self) -> ReceivedLog {
        Arc::clone(&self.responder.received)
    }

    /// Event loop; berhenti saat `stop` di-set
    pub fn run(&mut self, stop: &AtomicBool) -> io::Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        info!(
            addr = %self.listener.local_addr()?,
            behavior = ?self.responder.behavior,
            "stub server listening"
        );

        while !stop.load(Ordering::Relaxed) {
            match self.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            for event in events.iter() {
                match event.token() {
                    SERVER_TOKEN => self.accept_connections()?,
                    token => {
                        let mut alive = true;
                        if event.is_readable() {
                            alive = self.handle_read(token);
                        }
                        if alive && event.is_writable() {
                            alive = self.flush(token);
                        }
                        if !alive {
                            self.close(token);
                        }
                    }
                }
            }
        }

        info!("stub server stopped");
        Ok(())
    }

    fn accept_connections(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    stream.set_nodelay(true)?;
                    self.poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)?;

                    info!(%addr, ?token, "client connected");
                    self.conns.insert(
                        token,
                        StubConn {
                            stream,
                            addr,
                            read_buf: Vec::with_capacity(READ_CHUNK_SIZE),
                            write_buf: Vec::new(),
                            wants_write: false,
                        },
                    );
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Baca sampai WouldBlock lalu jawab setiap frame lengkap
    ///
    /// Returns false jika koneksi harus ditutup.
    fn handle_read(&mut self, token: Token) -> bool {
        let Some(conn) = self.conns.get_mut(&token) else {
            return true;
        };

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut eof = false;
        loop {
            match conn.stream.read(&mut chunk) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => conn.read_buf.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(addr = %conn.addr, "read error: {}", e);
                    return false;
                }
            }
        }

        let mut consumed = 0;
        loop {
            match decode_frame(&self.codec, &conn.read_buf[consumed..]) {
                Ok(Some((req, used))) => {
                    consumed += used;
                    debug!(cmd = ?req.cmd, seq = req.seq, "request");

                    let reply = self.responder.respond(&req);
                    if let Err(e) = encode_frame(&self.codec, &reply, &mut conn.write_buf) {
                        warn!(addr = %conn.addr, "encode reply failed: {}", e);
                        return false;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(addr = %conn.addr, "dropping client: {}", e);
                    return false;
                }
            }
        }
        conn.read_buf.drain(..consumed);

        if eof {
            // Jawaban yang tersisa tetap dikirim sebelum close
            let _ = self.flush(token);
            return false;
        }
        self.flush(token)
    }

    /// Tulis write buffer sampai habis atau WouldBlock
    fn flush(&mut self, token: Token) -> bool {
        let Some(conn) = self.conns.get_mut(&token) else {
            return true;
        };

        let mut written = 0;
        while written < conn.write_buf.len() {
            match conn.stream.write(&conn.write_buf[written..]) {
                Ok(0) => {
                    warn!(addr = %conn.addr, "socket accepted zero bytes");
                    return false;
                }
                Ok(n) => written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(addr = %conn.addr, "write error: {}", e);
                    return false;
                }
            }
        }
        conn.write_buf.drain(..written);

        // WRITABLE hanya didaftarkan selama masih ada data pending
        let wants_write = !conn.write_buf.is_empty();
        if wants_write != conn.wants_write {
            let interest = if wants_write {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };
            if let Err(e) = self
                .poll
                .registry()
                .reregister(&mut conn.stream, token, interest)
            {
                warn!(addr = %conn.addr, "reregister failed: {}", e);
                return false;
            }
            conn.wants_write = wants_write;
        }
        true
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.conns.remove(&token) {
            let _ = self.poll.registry().deregister(&mut conn.stream);
            info!(addr = %conn.addr, "client disconnected");
        }
    }
}

/// Stub server yang berjalan di thread sendiri
pub struct StubHandle {
    addr: SocketAddr,
    received: ReceivedLog,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<io::Result<()>>,
}

impl StubHandle {
    /// Bind lalu jalankan event loop di background thread
    pub fn spawn(addr: SocketAddr, behavior: StubBehavior) -> io::Result<Self> {
        let mut server = StubServer::bind(addr, behavior)?;
        let local = server.local_addr()?;
        let received = server.received();
        let stop = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&stop);
        let thread = thread::spawn(move || server.run(&flag));

        Ok(Self {
            addr: local,
            received,
            stop,
            thread,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Snapshot command yang sudah diterima
    pub fn received(&self) -> Vec<CommandType> {
        self.received
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Set stop flag dan tunggu event loop selesai
    pub fn shutdown(self) -> io::Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        self.thread
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stub server thread panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Credentials;

    fn responder(behavior: StubBehavior) -> Responder {
        Responder {
            behavior,
            received: Arc::new(Mutex::new(Vec::new())),
            next_user_id: 0,
            next_msg_id: 0,
        }
    }

    #[test]
    fn test_standard_replies_echo_seq() {
        let mut r = responder(StubBehavior::Standard);

        let reply = r.respond(&Envelope::register(5, Credentials::new("u", "p")));
        assert_eq!(reply.cmd, CommandType::RegisterRes);
        assert_eq!(reply.seq, 5);

        let reply = r.respond(&Envelope::login(6, Credentials::new("u", "p")));
        assert_eq!(reply.cmd, CommandType::LoginRes);

        let reply = r.respond(&Envelope::p2p_message(7, 2, b"x"));
        assert_eq!(reply.cmd, CommandType::P2pMsgRes);
        assert_eq!(reply.seq, 7);
        assert!(reply.validate().is_ok());
    }

    #[test]
    fn test_mismatch_behavior() {
        let mut r = responder(StubBehavior::LoginForRegister);
        let reply = r.respond(&Envelope::register(0, Credentials::new("u", "p")));
        assert_eq!(reply.cmd, CommandType::LoginRes);
    }

    #[test]
    fn test_unhandled_command_gets_unknown() {
        let mut r = responder(StubBehavior::Standard);
        let reply = r.respond(&Envelope::bare(CommandType::GetFriendListReq, 11));

        assert_eq!(reply.cmd, CommandType::Unknown);
        assert_eq!(reply.seq, 11);
        assert!(reply.payload.is_none());
        assert_eq!(
            *r.received.lock().unwrap(),
            vec![CommandType::GetFriendListReq]
        );
    }
}
