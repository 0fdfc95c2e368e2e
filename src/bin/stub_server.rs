//! termchat Stub Server
//!
//! Server minimal yang menjawab register/login/P2P dengan sukses, untuk
//! menjalankan benchmark tanpa backend asli.
//!
//! Usage:
//!   cargo run --release --bin stub_server -- --bind 127.0.0.1:1316

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use termchat_bench::network::{StubBehavior, StubServer};

#[derive(Debug, Parser)]
#[command(name = "stub_server", version, about = "termchat protocol stub server")]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1:1316")]
    bind: SocketAddr,

    /// Reply LOGIN_RES to REGISTER_REQ (protocol violation)
    #[arg(long)]
    mismatch_register: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    let behavior = if args.mismatch_register {
        StubBehavior::LoginForRegister
    } else {
        StubBehavior::Standard
    };

    let mut server = StubServer::bind(args.bind, behavior)
        .with_context(|| format!("bind {}", args.bind))?;

    // Tidak pernah di-set: jalan sampai proses di-kill
    let stop = AtomicBool::new(false);
    server.run(&stop).context("event loop")?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{:#}", e);
        eprintln!("❌ Server error: {:#}", e);
        std::process::exit(1);
    }
}
