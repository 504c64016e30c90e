use super::service::AppService;
use may::coroutine::JoinHandle;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Start accepting connections on `addr`, one coroutine per connection.
///
/// # Errors
///
/// Returns an error if `addr` resolves to nothing or cannot be bound.
pub fn start_server<A: ToSocketAddrs>(service: AppService, addr: A) -> io::Result<ServerHandle> {
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing"))?;
    let accept_loop = may_minihttp::HttpServer(service).start(addr)?;
    Ok(ServerHandle { addr, accept_loop })
}

/// A running accept loop.
pub struct ServerHandle {
    addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the bound address until it accepts a connection, for up to ~250ms.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if no connection succeeds in time.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to exit.
    pub fn stop(self) {
        // SAFETY: the accept loop is ours and is only cancelled here.
        #[allow(unsafe_code)]
        unsafe {
            self.accept_loop.coroutine().cancel();
        }
        // Cancellation surfaces as a join error.
        let _cancelled = self.accept_loop.join().is_err();
        debug!(addr = %self.addr, "Accept loop stopped");
    }
}
