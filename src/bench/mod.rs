//! Benchmark Layer: closed-loop harness
//!
//! Satu koneksi, satu thread, strictly sequential. Throughput dibatasi
//! latency round trip, bukan bandwidth send.

mod config;
mod harness;
mod stats;

pub use config::{
    BenchConfig, BENCH_PASSWORD, BENCH_PAYLOAD, BENCH_USERNAME, DEFAULT_ADDR,
    DEFAULT_RECEIVER_ID, DEFAULT_TOTAL_MESSAGES, DEFAULT_WARMUP_ROUNDS,
};
pub use harness::{run_benchmark, Harness};
pub use stats::{BenchReport, LatencyStats};
