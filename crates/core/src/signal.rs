use std::fmt;

use serde::{Deserialize, Serialize};

use crate::energy::Pace;

/// The four timing observations the analyzer knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Silence,
    TopicShift,
    EnergyChange,
    NaturalPause,
}

impl SignalKind {
    /// Contribution of this kind to the interruption score.
    pub fn weight(self) -> f32 {
        match self {
            SignalKind::Silence => 0.4,
            SignalKind::TopicShift => 0.3,
            SignalKind::NaturalPause => 0.3,
            SignalKind::EnergyChange => 0.2,
        }
    }

    /// Human-readable label, e.g. "Topic Shift".
    pub fn title(self) -> &'static str {
        match self {
            SignalKind::Silence => "Silence",
            SignalKind::TopicShift => "Topic Shift",
            SignalKind::EnergyChange => "Energy Change",
            SignalKind::NaturalPause => "Natural Pause",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Silence => "silence",
            SignalKind::TopicShift => "topic_shift",
            SignalKind::EnergyChange => "energy_change",
            SignalKind::NaturalPause => "natural_pause",
        };
        f.write_str(name)
    }
}

/// Which energy transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyChange {
    /// The previous sample was intense or very fast and the speaker has calmed down.
    HighToLow { previous_pace: Pace, current_pace: Pace },
    /// Pace dropped more than 30% below the recent average.
    PaceSlowdown { previous_wpm: f32, current_wpm: f32 },
}

/// Per-kind payload. Each variant carries exactly what its detector measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDetail {
    Silence {
        silence_duration_ms: u64,
        last_speech_ms: u64,
    },
    TopicShift {
        previous_topic_similarity: f32,
        segment_excerpt: String,
    },
    EnergyChange(EnergyChange),
    NaturalPause {
        ends_with_period: bool,
        ends_with_question: bool,
        ends_with_exclamation: bool,
        has_transition: bool,
        last_words: String,
    },
}

impl SignalDetail {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalDetail::Silence { .. } => SignalKind::Silence,
            SignalDetail::TopicShift { .. } => SignalKind::TopicShift,
            SignalDetail::EnergyChange(_) => SignalKind::EnergyChange,
            SignalDetail::NaturalPause { .. } => SignalKind::NaturalPause,
        }
    }
}

/// A typed, confidence-scored observation about conversational timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSignal {
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub timestamp: u64,
    pub detail: SignalDetail,
}

impl TimingSignal {
    pub fn new(confidence: f32, timestamp: u64, detail: SignalDetail) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            timestamp,
            detail,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.detail.kind()
    }
}
