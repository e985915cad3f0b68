use serde::{Deserialize, Serialize};

/// Duration assumed for a segment that arrives without one.
pub const DEFAULT_SEGMENT_DURATION_MS: u64 = 5000;

/// One unit of transcribed speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            text: text.into(),
            timestamp,
            duration_ms: None,
            word_count: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = Some(word_count);
        self
    }

    /// Empty or whitespace-only segments carry nothing to analyze.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Reported word count, or a whitespace token count when absent or zero.
    pub fn words(&self) -> usize {
        self.word_count
            .filter(|count| *count > 0)
            .unwrap_or_else(|| self.text.split_whitespace().count())
    }

    /// Reported duration, or the default when absent or zero.
    pub fn duration(&self) -> u64 {
        self.duration_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_SEGMENT_DURATION_MS)
    }
}
