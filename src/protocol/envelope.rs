//! Envelope: tagged union untuk semua request/response termchat
//!
//! Layout logis:
//! ┌──────────────────────────────────────────────┐
//! │ cmd (CommandType) │ seq │ timestamp │ payload │
//! └──────────────────────────────────────────────┘
//!
//! `cmd` dan varian `payload` harus selalu cocok. Server meng-echo `seq`
//! pada response, sehingga response bisa dikorelasikan ke request-nya.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CodecError;

/// Tipe command dalam protokol termchat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    /// Reply server untuk command yang tidak dikenal
    Unknown,
    RegisterReq,
    RegisterRes,
    LoginReq,
    LoginRes,
    P2pMsgReq,
    P2pMsgRes,
    AddFriendReq,
    AddFriendRes,
    HandleFriendReq,
    HandleFriendRes,
    GetFriendListReq,
    GetFriendListRes,
}

impl CommandType {
    /// True jika command punya varian `Payload` sendiri
    ///
    /// `Unknown` dan command friend tidak dimodelkan, jadi boleh tanpa payload.
    pub fn requires_payload(self) -> bool {
        matches!(
            self,
            Self::RegisterReq
                | Self::RegisterRes
                | Self::LoginReq
                | Self::LoginRes
                | Self::P2pMsgReq
                | Self::P2pMsgRes
        )
    }

    /// Response yang diharapkan untuk sebuah request
    ///
    /// Returns `None` untuk command yang bukan request.
    pub fn response(self) -> Option<Self> {
        match self {
            Self::RegisterReq => Some(Self::RegisterRes),
            Self::LoginReq => Some(Self::LoginRes),
            Self::P2pMsgReq => Some(Self::P2pMsgRes),
            Self::AddFriendReq => Some(Self::AddFriendRes),
            Self::HandleFriendReq => Some(Self::HandleFriendRes),
            Self::GetFriendListReq => Some(Self::GetFriendListRes),
            _ => None,
        }
    }
}

/// Username + password untuk register dan login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Hasil register/login dari server
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    pub error_msg: String,
    /// Diisi server saat login berhasil
    pub user_id: u64,
}

/// Pesan peer-to-peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2pMessage {
    pub receiver_id: u64,
    pub content: Vec<u8>,
    /// Unix timestamp (detik) saat pesan dikirim
    pub timestamp: i64,
}

/// Ack server untuk pesan peer-to-peer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct P2pAck {
    pub success: bool,
    pub msg_id: u64,
}

/// Payload envelope; varian menentukan command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    RegisterReq(Credentials),
    RegisterRes(AuthResult),
    LoginReq(Credentials),
    LoginRes(AuthResult),
    P2pMsgReq(P2pMessage),
    P2pMsgRes(P2pAck),
}

impl Payload {
    /// Discriminant yang cocok dengan varian ini
    pub fn command(&self) -> CommandType {
        match self {
            Self::RegisterReq(_) => CommandType::RegisterReq,
            Self::RegisterRes(_) => CommandType::RegisterRes,
            Self::LoginReq(_) => CommandType::LoginReq,
            Self::LoginRes(_) => CommandType::LoginRes,
            Self::P2pMsgReq(_) => CommandType::P2pMsgReq,
            Self::P2pMsgRes(_) => CommandType::P2pMsgRes,
        }
    }
}

/// Satu request atau response di atas koneksi
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub cmd: CommandType,
    /// Correlation id, di-echo oleh server
    pub seq: u64,
    /// Unix timestamp (detik)
    pub timestamp: i64,
    pub payload: Option<Payload>,
}

impl Envelope {
    /// Membuat envelope dengan `cmd` diturunkan dari payload
    pub fn new(seq: u64, payload: Payload) -> Self {
        Self {
            cmd: payload.command(),
            seq,
            timestamp: unix_now(),
            payload: Some(payload),
        }
    }

    /// Envelope tanpa payload, misalnya reply `Unknown`
    pub fn bare(cmd: CommandType, seq: u64) -> Self {
        Self {
            cmd,
            seq,
            timestamp: unix_now(),
            payload: None,
        }
    }

    pub fn register(seq: u64, credentials: Credentials) -> Self {
        Self::new(seq, Payload::RegisterReq(credentials))
    }

    pub fn login(seq: u64, credentials: Credentials) -> Self {
        Self::new(seq, Payload::LoginReq(credentials))
    }

    /// Request P2P dengan timestamp wall-clock saat ini
    pub fn p2p_message(seq: u64, receiver_id: u64, content: &[u8]) -> Self {
        Self::new(
            seq,
            Payload::P2pMsgReq(P2pMessage {
                receiver_id,
                content: content.to_vec(),
                timestamp: unix_now(),
            }),
        )
    }

    /// Cek bahwa varian payload cocok dengan `cmd`
    pub fn validate(&self) -> Result<(), CodecError> {
        match &self.payload {
            Some(payload) if payload.command() != self.cmd => Err(CodecError::CommandMismatch {
                cmd: self.cmd,
                payload: payload.command(),
            }),
            None if self.cmd.requires_payload() => {
                Err(CodecError::MissingPayload { cmd: self.cmd })
            }
            _ => Ok(()),
        }
    }
}

/// Unix timestamp dalam detik
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
