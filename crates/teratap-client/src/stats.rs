use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use teratap_frame::StreamStats;

/// Shared counters for a running tap.
///
/// Clones share the same counters, so another thread can watch progress
/// while the session loop runs. Stream-level counters (corrupt spans,
/// discarded bytes) are folded in when each session ends.
#[derive(Debug, Clone, Default)]
pub struct TapStats {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    decoded: AtomicU64,
    unknown_opcode: AtomicU64,
    missing_schema: AtomicU64,
    blacklisted: AtomicU64,
    reconnects: AtomicU64,
    corrupt_frames: AtomicU64,
    bytes_discarded: AtomicU64,
    buffer_resets: AtomicU64,
}

impl TapStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&self) {
        self.inner.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decoded(&self) {
        self.inner.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_opcode(&self) {
        self.inner.unknown_opcode.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_missing_schema(&self) {
        self.inner.missing_schema.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blacklisted(&self) {
        self.inner.blacklisted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconnect(&self) {
        self.inner.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a finished session's stream counters in.
    pub(crate) fn merge_stream(&self, stats: StreamStats) {
        self.inner
            .corrupt_frames
            .fetch_add(stats.corrupt_frames, Ordering::Relaxed);
        self.inner
            .bytes_discarded
            .fetch_add(stats.bytes_discarded, Ordering::Relaxed);
        self.inner
            .buffer_resets
            .fetch_add(stats.buffer_resets, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.inner.frames.load(Ordering::Relaxed),
            decoded: self.inner.decoded.load(Ordering::Relaxed),
            unknown_opcode: self.inner.unknown_opcode.load(Ordering::Relaxed),
            missing_schema: self.inner.missing_schema.load(Ordering::Relaxed),
            blacklisted: self.inner.blacklisted.load(Ordering::Relaxed),
            reconnects: self.inner.reconnects.load(Ordering::Relaxed),
            corrupt_frames: self.inner.corrupt_frames.load(Ordering::Relaxed),
            bytes_discarded: self.inner.bytes_discarded.load(Ordering::Relaxed),
            buffer_resets: self.inner.buffer_resets.load(Ordering::Relaxed),
        }
    }
}

/// Counter values captured by [`TapStats::snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames received across all sessions.
    pub frames: u64,
    /// Frames decoded and published to subscribers.
    pub decoded: u64,
    /// Frames whose opcode has no name in the revision's table.
    pub unknown_opcode: u64,
    /// Frames whose message name has no compiled definition.
    pub missing_schema: u64,
    /// Frames dropped because their name is blacklisted.
    pub blacklisted: u64,
    /// Reconnect attempts after the first session.
    pub reconnects: u64,
    /// Spans dropped by the frame reader for disagreeing length fields.
    pub corrupt_frames: u64,
    /// Bytes thrown away while re-synchronizing.
    pub bytes_discarded: u64,
    /// Times the receive buffer hit its cap and was cleared.
    pub buffer_resets: u64,
}
