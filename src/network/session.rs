//! Client session: satu TcpStream + framing
//!
//! Koneksi dibuka sekali dan ditutup lewat `Drop` di semua jalur keluar.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::protocol::{BincodeCodec, FramedStream};

/// Socket buffer size (send dan receive)
const SOCKET_BUFFER_SIZE: i32 = 256 * 1024; // 256KB

/// Framed connection ke server termchat
pub struct Session {
    framed: FramedStream<TcpStream, BincodeCodec>,
    peer: SocketAddr,
}

impl Session {
    /// Buka koneksi TCP ke `addr`
    ///
    /// Tidak ada retry; error dial langsung dikembalikan.
    pub fn connect(addr: &str) -> io::Result<Self> {
        let target = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} resolves to no address", addr),
            )
        })?;

        let stream = TcpStream::connect(target)?;
        Self::from_stream(stream)
    }

    /// Wrap stream yang sudah terhubung
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        // Disable Nagle: setiap request adalah satu write kecil
        stream.set_nodelay(true)?;
        set_socket_buffers(&stream);

        let peer = stream.peer_addr()?;
        info!(%peer, "connected (TCP_NODELAY=true)");

        Ok(Self {
            framed: FramedStream::new(stream, BincodeCodec),
            peer,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_framed(self) -> FramedStream<TcpStream, BincodeCodec> {
        let Self { framed, peer } = self;
        debug!(%peer, "session handed over to framed stream");
        framed
    }
}

/// Perbesar SO_SNDBUF/SO_RCVBUF; error diabaikan, tidak semua platform support
#[cfg(unix)]
fn set_socket_buffers(stream: &TcpStream) {
    use std::os::unix::io::AsRawFd;

    let fd = stream.as_raw_fd();
    let optval: libc::c_int = SOCKET_BUFFER_SIZE;
    for opt in [libc::SO_SNDBUF, libc::SO_RCVBUF] {
        let rc = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                opt,
                &optval as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc != 0 {
            debug!(opt, "setsockopt failed: {}", io::Error::last_os_error());
        }
    }
}

#[cfg(not(unix))]
fn set_socket_buffers(_stream: &TcpStream) {
    let _ = SOCKET_BUFFER_SIZE;
}
