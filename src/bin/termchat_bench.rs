//! termchat Benchmark Binary - Single User, Closed Loop
//!
//! Satu koneksi TCP, register + login, warmup, lalu N round trip P2P
//! yang diukur satu per satu.
//!
//! Usage:
//!   cargo run --release --bin termchat_bench -- --addr 127.0.0.1:1316 -n 10000

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use termchat_bench::bench::{
    BenchConfig, DEFAULT_ADDR, DEFAULT_RECEIVER_ID, DEFAULT_TOTAL_MESSAGES,
    DEFAULT_WARMUP_ROUNDS,
};
use termchat_bench::run_benchmark;

#[derive(Debug, Parser)]
#[command(name = "termchat_bench", version, about = "Single-connection latency benchmark")]
struct Args {
    /// Server address
    #[arg(long, env = "TERMCHAT_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Total messages to measure
    #[arg(short = 'n', long = "messages", default_value_t = DEFAULT_TOTAL_MESSAGES)]
    messages: u64,

    /// Untimed round trips before measurement
    #[arg(long, default_value_t = DEFAULT_WARMUP_ROUNDS)]
    warmup: u32,

    /// Receiver id for P2P messages
    #[arg(long, default_value_t = DEFAULT_RECEIVER_ID)]
    receiver: u64,
}

impl Args {
    fn into_config(self) -> BenchConfig {
        BenchConfig {
            addr: self.addr,
            total_messages: self.messages,
            warmup_rounds: self.warmup,
            receiver_id: self.receiver,
            ..Default::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn run(config: BenchConfig) -> anyhow::Result<()> {
    println!("=== Stage 1: Single User Benchmark ===");
    println!(
        "Target server: {}, messages: {}, warmup: {}\n",
        config.addr, config.total_messages, config.warmup_rounds
    );

    let report = run_benchmark(config).context("benchmark aborted")?;

    println!("\n{}", report);
    Ok(())
}

fn main() {
    init_tracing();
    let config = Args::parse().into_config();

    if let Err(e) = run(config) {
        error!("{:#}", e);
        eprintln!("❌ Benchmark error: {:#}", e);
        std::process::exit(1);
    }
}
