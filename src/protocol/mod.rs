//! Protocol Layer: Envelope + length-prefixed framing
//!
//! Prinsip desain:
//! - Length prefix, bukan delimiter: O(1) per message, aman untuk body biner
//! - Hard bound 10 MiB per frame, dicek sebelum alokasi
//! - Schema di belakang trait codec, framing tidak bergantung padanya

mod codec;
mod envelope;
mod framing;

pub use codec::{BincodeCodec, EnvelopeCodec, RawCodec};
pub use envelope::{
    unix_now, AuthResult, CommandType, Credentials, Envelope, P2pAck, P2pMessage, Payload,
};
pub use framing::{decode_frame, encode_frame, FramedStream, LENGTH_PREFIX_SIZE, MAX_FRAME_SIZE};

#[cfg(test)]
pub(crate) use framing::MemoryStream;
