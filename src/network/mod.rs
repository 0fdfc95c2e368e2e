//! Network Layer: client session + stub server
//!
//! - Session: blocking std TcpStream, TCP_NODELAY, satu koneksi per run
//! - Stub server: mio event loop (epoll/kqueue/IOCP) untuk test dan demo

mod session;
mod stub_server;

pub use session::Session;
pub use stub_server::{ReceivedLog, StubBehavior, StubHandle, StubServer};
