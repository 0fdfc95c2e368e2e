//! Closed-loop benchmark harness
//!
//! Alur linear, tanpa kembali ke tahap sebelumnya:
//! connect -> register -> login -> warmup -> measurement -> report
//!
//! Setiap send langsung diikuti receive yang blocking; request berikutnya
//! baru dikirim setelah response sebelumnya lengkap. Error di tahap mana
//! pun menghentikan seluruh run tanpa statistik parsial.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::config::BenchConfig;
use super::stats::{BenchReport, LatencyStats};
use crate::error::{BenchError, Stage};
use crate::network::Session;
use crate::protocol::{
    BincodeCodec, CommandType, Credentials, Envelope, EnvelopeCodec, FramedStream, Payload,
};

/// Benchmark harness di atas satu framed stream
pub struct Harness<S: Read + Write, C> {
    stream: FramedStream<S, C>,
    config: BenchConfig,
}

impl Harness<TcpStream, BincodeCodec> {
    /// Validasi config lalu buka koneksi TCP
    pub fn connect(config: BenchConfig) -> Result<Self, BenchError> {
        config.validate()?;

        let session = Session::connect(&config.addr).map_err(|source| BenchError::Connect {
            addr: config.addr.clone(),
            source,
        })?;

        Ok(Self::new(session.into_framed(), config))
    }
}

impl<S, C> Harness<S, C>
where
    S: Read + Write,
    C: EnvelopeCodec<Message = Envelope>,
{
    pub fn new(stream: FramedStream<S, C>, config: BenchConfig) -> Self {
        Self { stream, config }
    }

    /// Jalankan handshake, warmup, dan measurement
    ///
    /// Koneksi ditutup saat harness di-drop, termasuk pada jalur error.
    pub fn run(mut self) -> Result<BenchReport, BenchError> {
        self.config.validate()?;

        self.handshake()?;
        self.warmup()?;
        let (stats, total) = self.measure()?;

        let report = BenchReport::from_stats(&stats, total);
        info!(
            messages = report.messages,
            qps = report.qps,
            frames_sent = self.stream.frames_sent(),
            frames_received = self.stream.frames_received(),
            "benchmark complete"
        );
        Ok(report)
    }

    /// Satu round trip: send lalu tunggu response
    fn exchange(&mut self, stage: Stage, req: &Envelope) -> Result<Envelope, BenchError> {
        self.stream
            .send(req)
            .map_err(|source| BenchError::Frame { stage, source })?;
        self.stream
            .receive()
            .map_err(|source| BenchError::Frame { stage, source })
    }

    /// Round trip yang discriminant reply-nya harus `req.cmd.response()`
    fn checked_exchange(&mut self, stage: Stage, req: &Envelope) -> Result<Envelope, BenchError> {
        let reply = self.exchange(stage, req)?;
        if let Some(expected) = req.cmd.response() {
            expect_command(stage, &reply, expected)?;
        }
        Ok(reply)
    }

    /// Register lalu login
    ///
    /// Login request baru dibuat setelah discriminant reply register dicek.
    pub fn handshake(&mut self) -> Result<(), BenchError> {
        let credentials = Credentials::new(&self.config.username, &self.config.password);

        let register = Envelope::register(0, credentials.clone());
        let reply = self.checked_exchange(Stage::Register, &register)?;
        warn_if_rejected(Stage::Register, &reply);

        let login = Envelope::login(1, credentials);
        let reply = self.checked_exchange(Stage::Login, &login)?;
        warn_if_rejected(Stage::Login, &reply);

        info!(username = %self.config.username, "logged in");
        Ok(())
    }

    /// Round trip tanpa timing untuk menstabilkan buffer dan state TCP
    pub fn warmup(&mut self) -> Result<(), BenchError> {
        let receiver = self.config.receiver_id;
        let payload = self.config.payload.clone();

        for round in 0..self.config.warmup_rounds {
            let req = Envelope::p2p_message(round as u64, receiver, &payload);
            self.exchange(Stage::Warmup(round), &req)?;
        }

        info!(rounds = self.config.warmup_rounds, "warmup completed");
        Ok(())
    }

    /// N round trip yang diukur
    ///
    /// Returns accumulator latency dan wall-clock seluruh fase.
    pub fn measure(&mut self) -> Result<(LatencyStats, Duration), BenchError> {
        let receiver = self.config.receiver_id;
        let payload = self.config.payload.clone();
        let total = self.config.total_messages;

        info!(messages = total, "measurement started");
        let started = Instant::now();

        let stats = (0..total).try_fold(LatencyStats::new(), |mut stats, seq| {
            let stage = Stage::Measure(seq);
            let req = Envelope::p2p_message(seq, receiver, &payload);

            let sent_at = Instant::now();
            let reply = self.exchange(stage, &req)?;
            let latency = sent_at.elapsed();

            if reply.seq != seq {
                return Err(BenchError::SequenceMismatch {
                    stage,
                    expected: seq,
                    actual: reply.seq,
                });
            }

            stats.record(latency);
            debug!(seq, cmd = ?reply.cmd, latency_us = latency.as_micros() as u64, "round trip");
            Ok(stats)
        })?;

        Ok((stats, started.elapsed()))
    }
}

fn expect_command(stage: Stage, reply: &Envelope, expected: CommandType) -> Result<(), BenchError> {
    if reply.cmd != expected {
        return Err(BenchError::UnexpectedResponse {
            stage,
            expected,
            actual: reply.cmd,
        });
    }
    Ok(())
}

/// Server bisa menjawab success=false (misalnya user sudah terdaftar);
/// run tetap lanjut karena hanya discriminant yang menentukan.
fn warn_if_rejected(stage: Stage, reply: &Envelope) {
    if let Some(Payload::RegisterRes(result) | Payload::LoginRes(result)) = &reply.payload {
        if !result.success {
            warn!(%stage, error = %result.error_msg, "server reported failure");
        }
    }
}

/// Connect lalu jalankan satu benchmark penuh
pub fn run_benchmark(config: BenchConfig) -> Result<BenchReport, BenchError> {
    Harness::connect(config)?.run()
}
