//! Natural pause scoring.
//!
//! Sentence endings and transitional phrases mark points where a co-host can
//! step in without talking over the speaker.

use crate::signal::{SignalDetail, TimingSignal};

const TRANSITION_PHRASES: &[&str] = &[
    "anyway",
    "so",
    "moving on",
    "next",
    "also",
    "furthermore",
    "another thing",
    "by the way",
    "speaking of which",
    "that said",
    "in any case",
];

const PERIOD_CUE: f32 = 0.4;
const QUESTION_CUE: f32 = 0.5;
const EXCLAMATION_CUE: f32 = 0.3;
const TRANSITION_CUE: f32 = 0.4;
const MIN_PAUSE_SCORE: f32 = 0.4;

const LAST_WORDS: usize = 5;

/// Scores sentence-final punctuation and transition phrases in `text`.
///
/// Returns a signal when the combined cues reach 0.4. Transition phrases are
/// matched anywhere in the text, case-insensitively.
pub fn detect_natural_pause(text: &str, timestamp: u64) -> Option<TimingSignal> {
    let trimmed = text.trim();
    let ends_with_period = trimmed.ends_with('.');
    let ends_with_question = trimmed.ends_with('?');
    let ends_with_exclamation = trimmed.ends_with('!');

    let lower = trimmed.to_lowercase();
    let has_transition = TRANSITION_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase));

    let mut score = 0.0;
    if ends_with_period {
        score += PERIOD_CUE;
    }
    if ends_with_question {
        score += QUESTION_CUE;
    }
    if ends_with_exclamation {
        score += EXCLAMATION_CUE;
    }
    if has_transition {
        score += TRANSITION_CUE;
    }

    if score < MIN_PAUSE_SCORE {
        return None;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let last_words = words[words.len().saturating_sub(LAST_WORDS)..].join(" ");

    Some(TimingSignal::new(
        score.min(1.0),
        timestamp,
        SignalDetail::NaturalPause {
            ends_with_period,
            ends_with_question,
            ends_with_exclamation,
            has_transition,
            last_words,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confidence(text: &str) -> Option<f32> {
        detect_natural_pause(text, 0).map(|signal| signal.confidence)
    }

    #[test]
    fn sentence_endings() {
        assert_eq!(confidence("We wrapped the segment."), Some(0.4));
        assert_eq!(confidence("Did you catch that?"), Some(0.5));
        assert_eq!(confidence("Wild!"), None);
        assert_eq!(confidence("and then we"), None);
    }

    #[test]
    fn transitions_add_to_endings() {
        let signal = detect_natural_pause("Anyway, moving on to the main event.", 9).unwrap();
        assert!((signal.confidence - 0.8).abs() < 1e-6);
        assert_eq!(signal.timestamp, 9);

        let question = confidence("Anyway what do you think?").unwrap();
        assert!((question - 0.9).abs() < 1e-6);
        assert_eq!(confidence("by the way we have a guest"), Some(0.4));
    }

    #[test]
    fn records_cues_and_last_words() {
        let signal =
            detect_natural_pause("  That said, the numbers were really good this week. ", 0)
                .unwrap();
        assert_eq!(
            signal.detail,
            SignalDetail::NaturalPause {
                ends_with_period: true,
                ends_with_question: false,
                ends_with_exclamation: false,
                has_transition: true,
                last_words: "were really good this week.".to_string(),
            }
        );
    }

    #[test]
    fn short_text_keeps_all_words() {
        let signal = detect_natural_pause("Right.", 0).unwrap();
        match signal.detail {
            SignalDetail::NaturalPause { last_words, .. } => assert_eq!(last_words, "Right."),
            other => panic!("unexpected detail: {other:?}"),
        }
    }
}
