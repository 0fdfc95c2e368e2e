//! Length-prefixed framing
//!
//! Wire format per message:
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ length (u32, big-endian) │ body (`length` bytes)        │
//! └──────────────────────────┴──────────────────────────────┘
//!
//! Tidak ada padding atau terminator. `length` dibatasi `MAX_FRAME_SIZE`
//! di kedua arah, dan dicek SEBELUM buffer body dialokasikan.

use std::io::{self, BufReader, Read, Write};

use super::codec::EnvelopeCodec;
use crate::error::FrameError;

pub const LENGTH_PREFIX_SIZE: usize = 4;
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024; // 10 MiB

/// Buffer read sisi client, tuned untuk reply kecil
const READ_BUFFER_SIZE: usize = 64 * 1024;

#[inline(always)]
fn check_len(len: usize) -> Result<(), FrameError> {
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(())
}

/// Encode satu message sebagai frame, append ke `out`
///
/// Returns jumlah byte yang ditambahkan (prefix + body).
pub fn encode_frame<C: EnvelopeCodec>(
    codec: &C,
    msg: &C::Message,
    out: &mut Vec<u8>,
) -> Result<usize, FrameError> {
    let body = codec.encode(msg).map_err(FrameError::Encode)?;
    check_len(body.len())?;

    out.reserve(LENGTH_PREFIX_SIZE + body.len());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);

    Ok(LENGTH_PREFIX_SIZE + body.len())
}

/// Decode frame pertama dari buffer (untuk reader non-blocking)
///
/// Returns `Ok(None)` jika buffer belum berisi frame lengkap, atau
/// message beserta jumlah byte yang dikonsumsi.
pub fn decode_frame<C: EnvelopeCodec>(
    codec: &C,
    buf: &[u8],
) -> Result<Option<(C::Message, usize)>, FrameError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    check_len(len)?;

    let end = LENGTH_PREFIX_SIZE + len;
    if buf.len() < end {
        return Ok(None);
    }

    let msg = codec
        .decode(&buf[LENGTH_PREFIX_SIZE..end])
        .map_err(FrameError::Decode)?;
    Ok(Some((msg, end)))
}

/// Baca sampai `buf` penuh atau EOF; returns jumlah byte terbaca
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::transport("reading frame")(e)),
        }
    }
    Ok(filled)
}

/// Blocking framed stream
///
/// Read lewat `BufReader`, write sebagai satu buffer contiguous
/// (prefix + body) lalu flush. Buffer read/write dipakai ulang antar
/// message.
pub struct FramedStream<S: Read + Write, C> {
    inner: BufReader<S>,
    codec: C,
    write_buf: Vec<u8>,
    read_buf: Vec<u8>,
    frames_sent: u64,
    frames_received: u64,
}

impl<S: Read + Write, C: EnvelopeCodec> FramedStream<S, C> {
    pub fn new(stream: S, codec: C) -> Self {
        Self {
            inner: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
            codec,
            write_buf: Vec::new(),
            read_buf: Vec::new(),
            frames_sent: 0,
            frames_received: 0,
        }
    }

    /// Kirim satu message; bytes sudah di-flush saat return
    pub fn send(&mut self, msg: &C::Message) -> Result<(), FrameError> {
        self.write_buf.clear();
        encode_frame(&self.codec, msg, &mut self.write_buf)?;

        let stream = self.inner.get_mut();
        stream
            .write_all(&self.write_buf)
            .map_err(FrameError::transport("writing frame"))?;
        stream
            .flush()
            .map_err(FrameError::transport("flushing frame"))?;

        self.frames_sent += 1;
        Ok(())
    }

    /// Terima tepat satu message
    pub fn receive(&mut self) -> Result<C::Message, FrameError> {
        let mut header = [0u8; LENGTH_PREFIX_SIZE];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Err(FrameError::Closed),
            got if got < LENGTH_PREFIX_SIZE => {
                return Err(FrameError::Truncated {
                    got,
                    expected: LENGTH_PREFIX_SIZE,
                })
            }
            _ => {}
        }

        let len = u32::from_be_bytes(header) as usize;
        check_len(len)?;

        self.read_buf.clear();
        self.read_buf.resize(len, 0);
        let got = read_full(&mut self.inner, &mut self.read_buf)?;
        if got < len {
            return Err(FrameError::Truncated { got, expected: len });
        }

        let msg = self
            .codec
            .decode(&self.read_buf)
            .map_err(FrameError::Decode)?;
        self.frames_received += 1;
        Ok(msg)
    }

    pub fn get_ref(&self) -> &S {
        self.inner.get_ref()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }
}

/// In-memory stream: read dari input tetap, write dikumpulkan
#[cfg(test)]
pub(crate) struct MemoryStream {
    input: io::Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

#[cfg(test)]
impl MemoryStream {
    pub fn new(input: Vec<u8>) -> Self {
        Self {
            input: io::Cursor::new(input),
            output: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

#[cfg(test)]
impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
