use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use teratap_decode::{DecodeConfig, DecodedMessage};
use teratap_frame::{Frame, FrameError, FrameReader, ReaderConfig, StreamStats};
use teratap_schema::{OpcodeTable, SchemaCatalog};
use teratap_transport::RelayStream;

use crate::cancel::CancelToken;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::stats::TapStats;

/// Relay host the game proxy binds by default.
pub const DEFAULT_RELAY_HOST: &str = "127.0.0.1";

/// Relay port the game proxy binds by default.
pub const DEFAULT_RELAY_PORT: u16 = 7802;

/// Pause between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Relay endpoint and decoding limits for a tap.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Pause between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Frame accumulation limits.
    pub reader: ReaderConfig,
    /// Message walk limits.
    pub decode: DecodeConfig,
    /// Message names dropped before decoding.
    pub blacklist: HashSet<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RELAY_HOST.to_string(),
            port: DEFAULT_RELAY_PORT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reader: ReaderConfig::default(),
            decode: DecodeConfig::default(),
            blacklist: HashSet::new(),
        }
    }
}

/// A passive tap on the relay stream.
///
/// Connects to the relay, splits the byte stream into frames, resolves each
/// opcode against the revision's table, decodes messages that have a
/// definition and hands them to subscribers. A session that dies for any
/// reason is retried after [`ClientConfig::reconnect_delay`] until the
/// cancel token fires.
///
/// The tap never writes to the relay.
pub struct TapClient {
    config: ClientConfig,
    catalog: Arc<SchemaCatalog>,
    opcodes: Arc<OpcodeTable>,
    dispatcher: Dispatcher,
    stats: TapStats,
    cancel: CancelToken,
}

impl TapClient {
    pub fn new(
        config: ClientConfig,
        catalog: Arc<SchemaCatalog>,
        opcodes: Arc<OpcodeTable>,
    ) -> Self {
        Self {
            config,
            catalog,
            opcodes,
            dispatcher: Dispatcher::new(),
            stats: TapStats::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops the run loop from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters, shared with the run loop.
    pub fn stats(&self) -> TapStats {
        self.stats.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe a handler to one message name.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&DecodedMessage) + Send + 'static,
    {
        self.dispatcher.subscribe(name, handler);
    }

    /// Subscribe a handler to every decoded message.
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: Fn(&DecodedMessage) + Send + 'static,
    {
        self.dispatcher.subscribe_all(handler);
    }

    /// Run sessions until cancelled.
    ///
    /// Connection failures and mid-session stream errors are logged and
    /// retried after the configured pause, mirroring how the relay itself
    /// comes and goes with the game process.
    pub fn run(&self) {
        while !self.cancel.is_cancelled() {
            match self.run_once() {
                Ok(stats) => {
                    debug!(frames = stats.frames, "session ended");
                }
                Err(err) => {
                    warn!(%err, "session failed");
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }
            self.stats.record_reconnect();
            info!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "reconnecting after delay"
            );
            self.sleep_unless_cancelled(self.config.reconnect_delay);
        }
    }

    /// Run a single session: connect, drain frames until the stream ends.
    ///
    /// Returns the session's stream counters on a clean end (relay closed
    /// the connection, or the tap was cancelled). Connection and I/O
    /// failures surface as errors; [`TapClient::run`] is the retrying
    /// wrapper around this.
    pub fn run_once(&self) -> Result<StreamStats> {
        let stream = RelayStream::connect(&self.config.host, self.config.port)?;
        match stream.try_clone() {
            Ok(handle) => self.cancel.register(handle),
            Err(err) => warn!(%err, "no cancel handle for this session"),
        }

        let mut reader = FrameReader::with_config(stream, self.config.reader.clone());
        let outcome = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            match reader.read_frame() {
                Ok(frame) => self.handle_frame(&frame),
                Err(FrameError::ConnectionClosed) => {
                    info!("relay closed the connection");
                    break Ok(());
                }
                Err(err) => {
                    if self.cancel.is_cancelled() {
                        // The forced shutdown surfaces as an I/O error.
                        break Ok(());
                    }
                    break Err(err);
                }
            }
        };

        self.cancel.clear();
        let stats = reader.stats();
        self.stats.merge_stream(stats);
        outcome.map(|()| stats).map_err(Into::into)
    }

    fn handle_frame(&self, frame: &Frame) {
        self.stats.record_frame();

        let name = match self.opcodes.name_of(frame.opcode) {
            Some(name) => name,
            None => {
                self.stats.record_unknown_opcode();
                debug!(
                    opcode = %format_args!("{:#06x}", frame.opcode),
                    direction = %frame.direction,
                    "opcode has no name in this revision"
                );
                return;
            }
        };

        if self.config.blacklist.contains(name) {
            self.stats.record_blacklisted();
            return;
        }

        let schema = match self.catalog.get(name) {
            Some(schema) => schema,
            None => {
                self.stats.record_missing_schema();
                debug!(message = name, "no definition for message");
                return;
            }
        };

        let message = DecodedMessage::from_frame(frame, name, schema, &self.config.decode);
        self.stats.record_decoded();
        self.dispatcher.publish(&message);
    }

    fn sleep_unless_cancelled(&self, total: Duration) {
        const SLICE: Duration = Duration::from_millis(50);
        let mut remaining = total;
        while remaining > Duration::ZERO && !self.cancel.is_cancelled() {
            let step = remaining.min(SLICE);
            thread::sleep(step);
            remaining -= step;
        }
    }
}
