//! Serialization capability untuk envelope
//!
//! Framing tidak tahu format body. Codec di-inject ke transport supaya
//! framing bisa dites dengan schema palsu.

use bincode::Options;

use super::envelope::Envelope;
use crate::error::CodecError;

/// Encode/decode satu message ke/dari body frame
pub trait EnvelopeCodec {
    type Message;

    fn encode(&self, msg: &Self::Message) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Message, CodecError>;
}

/// Fixint encoding; body harus habis terpakai, sisa byte = decode error
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Codec produksi: serde + bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl EnvelopeCodec for BincodeCodec {
    type Message = Envelope;

    #[inline]
    fn encode(&self, msg: &Envelope) -> Result<Vec<u8>, CodecError> {
        bincode_options()
            .serialize(msg)
            .map_err(CodecError::Bincode)
    }

    #[inline]
    fn decode(&self, bytes: &[u8]) -> Result<Envelope, CodecError> {
        let env: Envelope = bincode_options()
            .deserialize(bytes)
            .map_err(CodecError::Bincode)?;
        env.validate()?;
        Ok(env)
    }
}

/// Codec identitas: body frame adalah message itu sendiri
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl EnvelopeCodec for RawCodec {
    type Message = Vec<u8>;

    fn encode(&self, msg: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(msg.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}
