use std::io::Read;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::info;

use crate::error::{Result, TransportError};

/// A connected relay stream — implements `Read`.
///
/// Wraps a TCP connection to the relay socket. The tap never writes to the
/// relay; the write half is left alone and only `shutdown` touches it.
#[derive(Debug)]
pub struct RelayStream {
    inner: TcpStream,
}

impl RelayStream {
    /// Connect to the relay at `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port)).map_err(|source| {
            TransportError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        info!(%addr, "connected to relay");
        Ok(Self { inner: stream })
    }

    /// Connect with an upper bound on how long connection establishment may take.
    ///
    /// Each resolved address is tried in turn; the last failure wins.
    pub fn connect_timeout(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let resolved: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?
            .collect();

        if resolved.is_empty() {
            return Err(TransportError::NoAddress(addr));
        }

        let mut last_err = None;
        for candidate in &resolved {
            match TcpStream::connect_timeout(candidate, timeout) {
                Ok(stream) => {
                    info!(%addr, "connected to relay");
                    return Ok(Self { inner: stream });
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(TransportError::Connect {
            addr,
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotConnected, "no candidate succeeded")
            }),
        })
    }

    /// Set a read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The clone shares the socket, so shutting it down also unblocks the
    /// original — this is how cancellation force-closes an in-flight read.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self { inner: cloned })
    }

    /// Force-close both directions of the stream.
    ///
    /// A reader blocked on this socket returns immediately (EOF or error).
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }

    /// Address of the relay endpoint.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }
}

impl Read for RelayStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn connect_and_read() {
        let (listener, port) = local_listener();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"relay bytes").unwrap();
        });

        let mut stream = RelayStream::connect("127.0.0.1", port).unwrap();
        let mut buf = [0u8; 16];
        let n = stream.read(&mut buf).unwrap();

        assert_eq!(&buf[..n], b"relay bytes");
        server.join().unwrap();
    }

    #[test]
    fn connect_refused_reports_address() {
        let (listener, port) = local_listener();
        drop(listener);

        let err = RelayStream::connect("127.0.0.1", port).unwrap_err();
        match err {
            TransportError::Connect { addr, .. } => {
                assert_eq!(addr, format!("127.0.0.1:{port}"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shutdown_unblocks_reader() {
        let (listener, port) = local_listener();

        let server = thread::spawn(move || {
            // Hold the connection open without sending anything.
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let stream = RelayStream::connect("127.0.0.1", port).unwrap();
        let killer = stream.try_clone().unwrap();

        let reader = thread::spawn(move || {
            let mut stream = stream;
            let mut buf = [0u8; 8];
            // Returns 0 (EOF) or an error once the socket is shut down.
            stream.read(&mut buf).unwrap_or(0)
        });

        thread::sleep(Duration::from_millis(50));
        killer.shutdown().unwrap();

        let read = reader.join().unwrap();
        assert_eq!(read, 0);
        server.join().unwrap();
    }

    #[test]
    fn connect_timeout_to_dead_port_fails() {
        let (listener, port) = local_listener();
        drop(listener);

        let err = RelayStream::connect_timeout("127.0.0.1", port, Duration::from_millis(200));
        assert!(err.is_err());
    }

    #[test]
    fn read_timeout_applies() {
        let (listener, port) = local_listener();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let mut stream = RelayStream::connect("127.0.0.1", port).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(30)))
            .unwrap();

        let mut buf = [0u8; 8];
        let err = stream.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ));
        server.join().unwrap();
    }
}
