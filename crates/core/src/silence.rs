use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ConfigError, non_zero};
use crate::signal::{SignalDetail, TimingSignal};

pub const DEFAULT_SILENCE_THRESHOLD_MS: u64 = 3000;

const NO_BASELINE: u64 = u64::MAX;

/// Tracks time since the last transcript activity.
///
/// Silence is an absence, so nothing arrives to announce it: the host polls
/// `detect_silence` on a fixed cadence. The baseline lives in an atomic so a
/// poll task can share the detector through an `Arc` while the segment path
/// keeps calling `on_transcript`.
#[derive(Debug)]
pub struct SilenceDetector {
    last_activity: AtomicU64,
    threshold_ms: u64,
}

impl SilenceDetector {
    pub fn new(threshold_ms: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            last_activity: AtomicU64::new(NO_BASELINE),
            threshold_ms: non_zero("silence_threshold_ms", threshold_ms)?,
        })
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Emits a silence signal once `now` is at least the threshold past the
    /// last activity. The very first call of a session only records `now`.
    pub fn detect_silence(&self, now: u64) -> Option<TimingSignal> {
        let last = match self.last_activity.compare_exchange(
            NO_BASELINE,
            now,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return None,
            Err(last) => last,
        };

        let elapsed = now.saturating_sub(last);
        if elapsed < self.threshold_ms {
            return None;
        }

        let confidence = (elapsed as f32 / (self.threshold_ms as f32 * 2.0)).min(1.0);
        tracing::trace!(elapsed_ms = elapsed, confidence, "silence detected");

        Some(TimingSignal::new(
            confidence,
            now,
            SignalDetail::Silence {
                silence_duration_ms: elapsed,
                last_speech_ms: last,
            },
        ))
    }

    /// Must be called for every incoming segment.
    pub fn on_transcript(&self, timestamp: u64) {
        self.last_activity.store(timestamp, Ordering::Release);
    }

    pub fn last_activity(&self) -> Option<u64> {
        match self.last_activity.load(Ordering::Acquire) {
            NO_BASELINE => None,
            last => Some(last),
        }
    }

    pub fn reset(&self) {
        self.last_activity.store(NO_BASELINE, Ordering::Release);
    }
}
