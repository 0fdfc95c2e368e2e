//! Error types per layer
//!
//! Tidak ada retry: setiap error di sini menghentikan run.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::protocol::CommandType;

/// Error dari serialization capability
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("command {cmd:?} carries {payload:?} payload")]
    CommandMismatch {
        cmd: CommandType,
        payload: CommandType,
    },

    #[error("command {cmd:?} requires a payload")]
    MissingPayload { cmd: CommandType },
}

/// Error framing transport
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("transport error while {op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// EOF sebelum byte header pertama
    #[error("connection closed by peer")]
    Closed,

    /// EOF di tengah header atau body
    #[error("stream ended mid-frame: got {got} of {expected} bytes")]
    Truncated { got: usize, expected: usize },

    #[error("frame too large: {len} bytes (max {max})")]
    TooLarge { len: usize, max: usize },

    #[error("encode failed: {0}")]
    Encode(#[source] CodecError),

    #[error("decode failed: {0}")]
    Decode(#[source] CodecError),
}

impl FrameError {
    pub(crate) fn transport(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Transport { op, source }
    }
}

/// Tahap benchmark, untuk diagnostik
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Register,
    Login,
    /// Warmup round ke-n
    Warmup(u32),
    /// Measurement dengan seq ini
    Measure(u64),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Register => write!(f, "register"),
            Self::Login => write!(f, "login"),
            Self::Warmup(round) => write!(f, "warmup (round {})", round),
            Self::Measure(seq) => write!(f, "measurement (seq {})", seq),
        }
    }
}

/// Error harness; semua fatal
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} failed: {source}")]
    Frame {
        stage: Stage,
        #[source]
        source: FrameError,
    },

    #[error("{stage} failed: expected {expected:?}, got {actual:?}")]
    UnexpectedResponse {
        stage: Stage,
        expected: CommandType,
        actual: CommandType,
    },

    #[error("{stage} failed: response seq {actual} does not match request seq {expected}")]
    SequenceMismatch {
        stage: Stage,
        expected: u64,
        actual: u64,
    },
}

impl BenchError {
    /// Tahap tempat error terjadi
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Config(_) => None,
            Self::Connect { .. } => Some(Stage::Connect),
            Self::Frame { stage, .. }
            | Self::UnexpectedResponse { stage, .. }
            | Self::SequenceMismatch { stage, .. } => Some(*stage),
        }
    }
}
