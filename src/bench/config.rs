//! Konfigurasi benchmark

use crate::error::BenchError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:1316";
pub const DEFAULT_TOTAL_MESSAGES: u64 = 10_000;
pub const DEFAULT_WARMUP_ROUNDS: u32 = 100;

/// Identitas tetap untuk semua run
pub const BENCH_USERNAME: &str = "bench_baseline";
pub const BENCH_PASSWORD: &str = "password";

pub const DEFAULT_RECEIVER_ID: u64 = 2;
pub const BENCH_PAYLOAD: &[u8] = b"Benchmark Payload Data";

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// `host:port` server
    pub addr: String,
    /// Jumlah round trip yang diukur (N)
    pub total_messages: u64,
    /// Round trip sebelum measurement, timing dibuang
    pub warmup_rounds: u32,
    pub username: String,
    pub password: String,
    /// Target P2P untuk semua request
    pub receiver_id: u64,
    pub payload: Vec<u8>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            total_messages: DEFAULT_TOTAL_MESSAGES,
            warmup_rounds: DEFAULT_WARMUP_ROUNDS,
            username: BENCH_USERNAME.to_string(),
            password: BENCH_PASSWORD.to_string(),
            receiver_id: DEFAULT_RECEIVER_ID,
            payload: BENCH_PAYLOAD.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.addr.trim().is_empty() {
            return Err(BenchError::Config("server address is empty".into()));
        }
        // Average dibagi N
        if self.total_messages == 0 {
            return Err(BenchError::Config(
                "total message count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
