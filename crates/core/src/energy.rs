use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, non_zero};
use crate::history::BoundedHistory;
use crate::segment::TranscriptSegment;
use crate::signal::{EnergyChange, SignalDetail, TimingSignal};

pub const DEFAULT_ENERGY_HISTORY: usize = 10;

/// Samples that must precede the current one before a change can be judged.
const MIN_PRIOR_SAMPLES: usize = 3;
const SLOWDOWN_RATIO: f32 = 0.3;

const INTENSITY_WORDS: &[&str] = &[
    "amazing",
    "incredible",
    "awesome",
    "wow",
    "unbelievable",
    "crazy",
    "insane",
    "literally",
    "absolutely",
    "definitely",
    "really",
    "very",
    "super",
    "extremely",
    "totally",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Slow,
    Normal,
    Fast,
    VeryFast,
}

impl Pace {
    /// `<100` slow, `100..=140` normal, `(140, 180]` fast, `>180` very fast.
    pub fn from_wpm(words_per_minute: f32) -> Self {
        if words_per_minute < 100.0 {
            Pace::Slow
        } else if words_per_minute > 180.0 {
            Pace::VeryFast
        } else if words_per_minute > 140.0 {
            Pace::Fast
        } else {
            Pace::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn from_score(score: usize) -> Self {
        match score {
            0 => Intensity::Low,
            1..=3 => Intensity::Medium,
            _ => Intensity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMetrics {
    pub pace: Pace,
    pub intensity: Intensity,
    pub words_per_minute: f32,
    pub exclamation_count: usize,
    pub question_count: usize,
}

/// Averages over the whole energy history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageEnergy {
    pub pace: Pace,
    pub intensity: Intensity,
    pub words_per_minute: f32,
    pub exclamations: f32,
    pub questions: f32,
}

pub struct EnergyDetector {
    history: BoundedHistory<EnergyMetrics>,
}

impl EnergyDetector {
    pub fn new(history_capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            history: BoundedHistory::with_capacity(non_zero("energy_history", history_capacity)?),
        })
    }

    /// Measures pace and intensity for `segment` and records the sample.
    pub fn analyze_energy(&mut self, segment: &TranscriptSegment) -> EnergyMetrics {
        let text = segment.text.as_str();
        let words_per_minute = segment.words() as f32 * 60_000.0 / segment.duration() as f32;

        let exclamation_count = text.matches('!').count();
        let question_count = text.matches('?').count();
        let score = exclamation_count * 2
            + question_count
            + count_caps_runs(text)
            + count_intensity_words(text);

        let metrics = EnergyMetrics {
            pace: Pace::from_wpm(words_per_minute),
            intensity: Intensity::from_score(score),
            words_per_minute,
            exclamation_count,
            question_count,
        };
        self.history.push(metrics.clone());
        metrics
    }

    /// Compares `current`, the sample just recorded by `analyze_energy`,
    /// against the samples that came before it.
    pub fn detect_energy_change(
        &self,
        current: &EnergyMetrics,
        timestamp: u64,
    ) -> Option<TimingSignal> {
        let prior_len = self.history.len().saturating_sub(1);
        if prior_len < MIN_PRIOR_SAMPLES {
            return None;
        }
        let prior: Vec<&EnergyMetrics> = self.history.iter().take(prior_len).collect();
        let previous = prior.last()?;
        let avg_wpm = prior.iter().map(|m| m.words_per_minute).sum::<f32>() / prior_len as f32;

        let was_high = previous.intensity == Intensity::High || previous.pace == Pace::VeryFast;
        let now_calm = current.intensity == Intensity::Low || current.pace == Pace::Slow;
        if was_high && now_calm {
            return Some(TimingSignal::new(
                0.8,
                timestamp,
                SignalDetail::EnergyChange(EnergyChange::HighToLow {
                    previous_pace: previous.pace,
                    current_pace: current.pace,
                }),
            ));
        }

        if avg_wpm > 0.0 {
            let change = (current.words_per_minute - avg_wpm).abs() / avg_wpm;
            if change > SLOWDOWN_RATIO && current.words_per_minute < avg_wpm {
                return Some(TimingSignal::new(
                    0.6,
                    timestamp,
                    SignalDetail::EnergyChange(EnergyChange::PaceSlowdown {
                        previous_wpm: avg_wpm,
                        current_wpm: current.words_per_minute,
                    }),
                ));
            }
        }

        None
    }

    pub fn current_energy(&self) -> Option<&EnergyMetrics> {
        self.history.latest()
    }

    pub fn average_energy(&self) -> Option<AverageEnergy> {
        if self.history.is_empty() {
            return None;
        }
        let n = self.history.len() as f32;
        let words_per_minute = self.history.iter().map(|m| m.words_per_minute).sum::<f32>() / n;
        let exclamations = self.history.iter().map(|m| m.exclamation_count as f32).sum::<f32>() / n;
        let questions = self.history.iter().map(|m| m.question_count as f32).sum::<f32>() / n;

        let score = exclamations * 2.0 + questions;
        let intensity = if score == 0.0 {
            Intensity::Low
        } else if score > 2.0 {
            Intensity::High
        } else {
            Intensity::Medium
        };

        Some(AverageEnergy {
            pace: Pace::from_wpm(words_per_minute),
            intensity,
            words_per_minute,
            exclamations,
            questions,
        })
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Runs of two or more consecutive capitals ("WOW", "NASA").
fn count_caps_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_uppercase() {
            run += 1;
        } else {
            if run >= 2 {
                runs += 1;
            }
            run = 0;
        }
    }
    if run >= 2 {
        runs += 1;
    }
    runs
}

fn count_intensity_words(text: &str) -> usize {
    let lower = text.to_lowercase();
    INTENSITY_WORDS
        .iter()
        .filter(|word| lower.contains(*word))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalKind;

    fn segment(text: &str, words: usize, duration_ms: u64) -> TranscriptSegment {
        TranscriptSegment::new(text, 0)
            .with_word_count(words)
            .with_duration(duration_ms)
    }

    #[test]
    fn pace_boundaries() {
        assert_eq!(Pace::from_wpm(99.0), Pace::Slow);
        assert_eq!(Pace::from_wpm(100.0), Pace::Normal);
        assert_eq!(Pace::from_wpm(140.0), Pace::Normal);
        assert_eq!(Pace::from_wpm(140.5), Pace::Fast);
        assert_eq!(Pace::from_wpm(180.0), Pace::Fast);
        assert_eq!(Pace::from_wpm(180.5), Pace::VeryFast);
    }

    #[test]
    fn intensity_boundaries() {
        assert_eq!(Intensity::from_score(0), Intensity::Low);
        assert_eq!(Intensity::from_score(1), Intensity::Medium);
        assert_eq!(Intensity::from_score(3), Intensity::Medium);
        assert_eq!(Intensity::from_score(4), Intensity::High);
    }

    #[test]
    fn words_per_minute_from_segment() {
        let mut detector = EnergyDetector::new(10).unwrap();
        assert_eq!(detector.analyze_energy(&segment("a", 99, 60_000)).pace, Pace::Slow);
        assert_eq!(detector.analyze_energy(&segment("a", 100, 60_000)).pace, Pace::Normal);
        assert_eq!(detector.analyze_energy(&segment("a", 140, 60_000)).pace, Pace::Normal);
        assert_eq!(detector.analyze_energy(&segment("a", 180, 60_000)).pace, Pace::Fast);
        assert_eq!(detector.analyze_energy(&segment("a", 181, 60_000)).pace, Pace::VeryFast);

        // 10 words over the default five seconds.
        let metrics = detector.analyze_energy(&TranscriptSegment::new(
            "one two three four five six seven eight nine ten",
            0,
        ));
        assert_eq!(metrics.words_per_minute, 120.0);
    }

    #[test]
    fn intensity_markers_are_counted() {
        let mut detector = EnergyDetector::new(10).unwrap();
        let calm = detector.analyze_energy(&segment("we met at noon", 4, 2_000));
        assert_eq!(calm.intensity, Intensity::Low);

        let curious = detector.analyze_energy(&segment("did we meet at noon?", 5, 2_000));
        assert_eq!(curious.intensity, Intensity::Medium);
        assert_eq!(curious.question_count, 1);

        // 2 exclamations (4) + two caps runs + "wow" and "amazing".
        let loud = detector.analyze_energy(&segment("WOW that was AMAZING!!", 4, 2_000));
        assert_eq!(loud.intensity, Intensity::High);
        assert_eq!(loud.exclamation_count, 2);
    }

    #[test]
    fn history_is_bounded() {
        let mut detector = EnergyDetector::new(10).unwrap();
        for _ in 0..25 {
            detector.analyze_energy(&segment("steady talk", 2, 1_000));
        }
        assert_eq!(detector.history.len(), 10);
    }

    #[test]
    fn needs_three_prior_samples() {
        let mut detector = EnergyDetector::new(10).unwrap();
        for _ in 0..2 {
            detector.analyze_energy(&segment("WOW this is AMAZING!!", 200, 60_000));
        }
        let calm = detector.analyze_energy(&segment("ok then", 50, 60_000));
        assert!(detector.detect_energy_change(&calm, 1).is_none());
    }

    #[test]
    fn high_to_low_transition() {
        let mut detector = EnergyDetector::new(10).unwrap();
        for _ in 0..3 {
            detector.analyze_energy(&segment("WOW this is AMAZING!!", 200, 60_000));
        }
        let calm = detector.analyze_energy(&segment("ok then", 50, 60_000));
        let signal = detector.detect_energy_change(&calm, 42).expect("energy drop");
        assert_eq!(signal.kind(), SignalKind::EnergyChange);
        assert_eq!(signal.confidence, 0.8);
        assert_eq!(signal.timestamp, 42);
        assert_eq!(
            signal.detail,
            SignalDetail::EnergyChange(EnergyChange::HighToLow {
                previous_pace: Pace::VeryFast,
                current_pace: Pace::Slow,
            })
        );
    }

    #[test]
    fn pace_slowdown() {
        let mut detector = EnergyDetector::new(10).unwrap();
        for _ in 0..3 {
            detector.analyze_energy(&segment("did it work?", 120, 60_000));
        }
        let slower = detector.analyze_energy(&segment("did it work?", 60, 60_000));
        let signal = detector.detect_energy_change(&slower, 7).expect("slowdown");
        assert_eq!(signal.confidence, 0.6);
        match signal.detail {
            SignalDetail::EnergyChange(EnergyChange::PaceSlowdown {
                previous_wpm,
                current_wpm,
            }) => {
                assert_eq!(previous_wpm, 120.0);
                assert_eq!(current_wpm, 60.0);
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn speeding_up_is_not_a_change() {
        let mut detector = EnergyDetector::new(10).unwrap();
        for _ in 0..3 {
            detector.analyze_energy(&segment("did it work?", 100, 60_000));
        }
        let faster = detector.analyze_energy(&segment("did it work?", 170, 60_000));
        assert!(detector.detect_energy_change(&faster, 0).is_none());
    }

    #[test]
    fn average_energy_over_history() {
        let mut detector = EnergyDetector::new(10).unwrap();
        assert!(detector.average_energy().is_none());
        detector.analyze_energy(&segment("go!", 100, 60_000));
        detector.analyze_energy(&segment("go", 200, 60_000));

        let average = detector.average_energy().unwrap();
        assert_eq!(average.words_per_minute, 150.0);
        assert_eq!(average.pace, Pace::Fast);
        assert_eq!(average.exclamations, 0.5);
        assert_eq!(average.intensity, Intensity::Medium);
        assert_eq!(detector.current_energy().unwrap().words_per_minute, 200.0);

        detector.reset();
        assert!(detector.current_energy().is_none());
    }
}
