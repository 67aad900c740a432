use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::error::{ConversionError, ConversionErrorKind};

#[derive(Debug, Default)]
pub struct ConversionStats {
    in_flight: AtomicUsize,
    started: AtomicU64,
    succeeded: AtomicU64,
    codec_failures: AtomicU64,
    transport_failures: AtomicU64,
    lifecycle_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionStatsSnapshot {
    pub in_flight: usize,
    pub started: u64,
    pub succeeded: u64,
    pub codec_failures: u64,
    pub transport_failures: u64,
    pub lifecycle_failures: u64,
}

/// Decrements the in-flight gauge when the call finishes or is dropped.
pub struct InFlightGuard<'a> {
    stats: &'a ConversionStats,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ConversionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> InFlightGuard<'_> {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard { stats: self }
    }

    pub fn record<T>(&self, result: &Result<T, ConversionError>) {
        let counter = match result {
            Ok(_) => &self.succeeded,
            Err(e) => match e.kind() {
                ConversionErrorKind::Codec => &self.codec_failures,
                ConversionErrorKind::Transport => &self.transport_failures,
                ConversionErrorKind::Lifecycle => &self.lifecycle_failures,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> ConversionStatsSnapshot {
        ConversionStatsSnapshot {
            in_flight: self.in_flight.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            codec_failures: self.codec_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            lifecycle_failures: self.lifecycle_failures.load(Ordering::Relaxed),
        }
    }
}
