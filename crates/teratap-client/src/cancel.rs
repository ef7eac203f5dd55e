use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use teratap_transport::RelayStream;

/// Cooperative stop signal for a running tap.
///
/// Clones share the signal. The session loop spends its life inside a
/// blocking read, so `cancel` also force-closes the registered relay stream;
/// without that the loop would only notice the flag at the next frame.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    stream: Mutex<Option<RelayStream>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and force-close the registered stream, if any.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Ok(guard) = self.inner.stream.lock() {
            if let Some(stream) = guard.as_ref() {
                if let Err(err) = stream.shutdown() {
                    debug!(%err, "relay stream already closed on cancel");
                }
            }
        }
    }

    /// Whether `cancel` has been called on any clone of this token.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register the live session stream so `cancel` can unblock reads on it.
    pub(crate) fn register(&self, stream: RelayStream) {
        if let Ok(mut guard) = self.inner.stream.lock() {
            // A cancel that raced this registration must still close the stream.
            if self.inner.cancelled.load(Ordering::SeqCst) {
                let _ = stream.shutdown();
            }
            *guard = Some(stream);
        }
    }

    /// Drop the registered stream once its session is over.
    pub(crate) fn clear(&self) {
        if let Ok(mut guard) = self.inner.stream.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let seen_by_worker = token.clone();

        token.cancel();

        assert!(seen_by_worker.is_cancelled());
    }

    #[test]
    fn cancel_closes_the_registered_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            // Returns once the tap side shuts the socket down.
            let _ = stream.read(&mut buf);
        });

        let stream = RelayStream::connect("127.0.0.1", port).unwrap();
        let token = CancelToken::new();
        token.register(stream.try_clone().unwrap());

        let reader = thread::spawn(move || {
            let mut stream = stream;
            let mut buf = [0u8; 4];
            stream.read(&mut buf).unwrap_or(0)
        });

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert_eq!(reader.join().unwrap(), 0);
        server.join().unwrap();
    }

    #[test]
    fn register_after_cancel_closes_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            let _ = stream.read(&mut buf);
        });

        let mut stream = RelayStream::connect("127.0.0.1", port).unwrap();
        let token = CancelToken::new();

        token.cancel();
        token.register(stream.try_clone().unwrap());

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap_or(0), 0);
        server.join().unwrap();
    }
}
