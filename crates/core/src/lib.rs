pub mod config;
pub mod context;
pub mod embedding;
pub mod energy;
pub mod error;
pub mod history;
pub mod intent;
pub mod monitor;
pub mod pause;
pub mod segment;
pub mod session;
pub mod signal;
pub mod silence;
pub mod timing;
pub mod topic;

use serde::{Deserialize, Serialize};

use crate::intent::IntentScore;
use crate::segment::TranscriptSegment;
use crate::timing::TimingOpportunity;

/// What the session hands to the decision sink.
///
/// The sink owns every side effect (speaking, searching, staying quiet). The
/// core only reports when it would be appropriate to interject and what the
/// latest utterance asked for. Silence-triggered decisions carry no intent
/// because there was no utterance to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub opportunity: TimingOpportunity,
    pub intent: Option<IntentScore>,
}

/// Inputs the host feeds into a running `CohostSession`.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// A transcribed utterance, delivered in chronological order.
    Segment(TranscriptSegment),
    /// Ends the listening session and resets all detectors.
    Stop,
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
