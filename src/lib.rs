//! termchat-bench - Single-Connection Latency Benchmark
//!
//! Arsitektur:
//! - protocol: Envelope schema + length-prefixed framing
//! - network: TCP session dan stub server (mio)
//! - bench: closed-loop harness (handshake, warmup, measurement, report)

pub mod bench;
pub mod error;
pub mod network;
pub mod protocol;

pub use bench::{run_benchmark, BenchConfig, BenchReport, Harness, LatencyStats};
pub use error::{BenchError, CodecError, FrameError, Stage};
