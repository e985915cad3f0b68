use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;
use crate::embedding::EmbeddingProvider;
use crate::energy::{AverageEnergy, EnergyDetector, EnergyMetrics};
use crate::error::ConfigError;
use crate::pause::detect_natural_pause;
use crate::segment::TranscriptSegment;
use crate::signal::{SignalKind, TimingSignal};
use crate::silence::SilenceDetector;
use crate::topic::TopicShiftDetector;

/// Share of `min_score` a score needs to count as a good time.
const GOOD_TIME_RATIO: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    InterruptNow,
    GoodTime,
    Wait,
}

/// Verdict on whether now is a good moment to interject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingOpportunity {
    pub score: f32,
    pub signals: Vec<TimingSignal>,
    pub recommendation: Recommendation,
    pub reasoning: String,
}

impl TimingOpportunity {
    pub fn from_signals(signals: Vec<TimingSignal>, score: f32, min_score: f32) -> Self {
        let (mut recommendation, mut reasoning) = if score >= min_score {
            let titles: Vec<&str> = signals.iter().map(|s| s.kind().title()).collect();
            (
                Recommendation::InterruptNow,
                format!("Strong interruption opportunity detected: {}", titles.join(", ")),
            )
        } else if score >= min_score * GOOD_TIME_RATIO {
            (
                Recommendation::GoodTime,
                format!("Moderate interruption opportunity. Score: {:.0}%", score * 100.0),
            )
        } else {
            (
                Recommendation::Wait,
                format!("Not a good time to interrupt. Score too low: {:.0}%", score * 100.0),
            )
        };

        let has = |kind: SignalKind| signals.iter().any(|s| s.kind() == kind);

        // Silence only shows up here when the monitor carries a fresh one into a segment.

        if has(SignalKind::Silence) && has(SignalKind::TopicShift) {
            recommendation = Recommendation::InterruptNow;
            reasoning = "Excellent timing: topic shift during silence".to_string();
        }
        if has(SignalKind::NaturalPause) && has(SignalKind::EnergyChange) {
            recommendation = Recommendation::InterruptNow;
            reasoning = "Natural pause with energy drop: host wrapping up".to_string();
        }

        Self {
            score,
            signals,
            recommendation,
            reasoning,
        }
    }

    pub fn is_interrupt_now(&self) -> bool {
        self.recommendation == Recommendation::InterruptNow
    }
}

/// Runs every detector over a segment and reports what fired.
pub struct TimingAnalyzer {
    silence: Arc<SilenceDetector>,
    topic: TopicShiftDetector,
    energy: EnergyDetector,
}

impl TimingAnalyzer {
    pub fn new(
        config: &TimingConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            silence: Arc::new(SilenceDetector::new(config.silence_threshold_ms)?),
            topic: TopicShiftDetector::new(
                provider,
                config.topic_window,
                config.embedding_cache_capacity,
                config.topic_shift_threshold,
                config.embedding_timeout(),
            )?,
            energy: EnergyDetector::new(config.energy_history)?,
        })
    }

    /// Signals for one utterance. Silence is not among them; it is polled
    /// separately through [`TimingAnalyzer::check_silence`].
    pub async fn analyze_segment(&mut self, segment: &TranscriptSegment) -> Vec<TimingSignal> {
        if segment.is_blank() {
            return Vec::new();
        }

        let mut signals = Vec::new();
        self.silence.on_transcript(segment.timestamp);

        if let Some(pause) = detect_natural_pause(&segment.text, segment.timestamp) {
            signals.push(pause);
        }

        let metrics = self.energy.analyze_energy(segment);
        if let Some(change) = self.energy.detect_energy_change(&metrics, segment.timestamp) {
            signals.push(change);
        }

        if let Some(shift) = self.topic.detect_topic_shift(segment).await {
            signals.push(shift);
        }

        tracing::debug!(
            timestamp = segment.timestamp,
            signals = signals.len(),
            "analyzed segment"
        );
        signals
    }

    pub fn check_silence(&self, now: u64) -> Option<TimingSignal> {
        self.silence.detect_silence(now)
    }

    /// Handle for a poll task running alongside the segment path.
    pub fn silence_detector(&self) -> Arc<SilenceDetector> {
        Arc::clone(&self.silence)
    }

    /// Weighted average confidence; 0 when nothing fired.
    pub fn calculate_interruption_score(signals: &[TimingSignal]) -> f32 {
        let (total, weights) = signals.iter().fold((0.0, 0.0), |(total, weights), signal| {
            let weight = signal.kind().weight();
            (total + signal.confidence * weight, weights + weight)
        });
        if weights > 0.0 { total / weights } else { 0.0 }
    }

    pub fn current_energy(&self) -> Option<&EnergyMetrics> {
        self.energy.current_energy()
    }

    pub fn average_energy(&self) -> Option<AverageEnergy> {
        self.energy.average_energy()
    }

    pub fn reset(&mut self) {
        self.silence.reset();
        self.topic.reset();
        self.energy.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{HashingEmbedder, MockEmbeddingProvider};
    use crate::signal::{EnergyChange, SignalDetail};

    fn silence(confidence: f32) -> TimingSignal {
        TimingSignal::new(
            confidence,
            10_000,
            SignalDetail::Silence {
                silence_duration_ms: 3000,
                last_speech_ms: 7000,
            },
        )
    }

    fn topic_shift(confidence: f32) -> TimingSignal {
        TimingSignal::new(
            confidence,
            10_000,
            SignalDetail::TopicShift {
                previous_topic_similarity: 1.0 - confidence,
                segment_excerpt: "new topic".into(),
            },
        )
    }

    fn natural_pause(confidence: f32) -> TimingSignal {
        TimingSignal::new(
            confidence,
            10_000,
            SignalDetail::NaturalPause {
                ends_with_period: true,
                ends_with_question: false,
                ends_with_exclamation: false,
                has_transition: false,
                last_words: "and that was it.".into(),
            },
        )
    }

    fn energy_change(confidence: f32) -> TimingSignal {
        TimingSignal::new(
            confidence,
            10_000,
            SignalDetail::EnergyChange(EnergyChange::PaceSlowdown {
                previous_wpm: 200.0,
                current_wpm: 90.0,
            }),
        )
    }

    fn analyzer() -> TimingAnalyzer {
        TimingAnalyzer::new(&TimingConfig::default(), Arc::new(HashingEmbedder::default())).unwrap()
    }

    #[test]
    fn empty_signals_score_zero() {
        assert_eq!(TimingAnalyzer::calculate_interruption_score(&[]), 0.0);
    }

    #[test]
    fn score_is_weighted_average() {
        // (1.0 * 0.4 + 0.5 * 0.2) / 0.6
        let score = TimingAnalyzer::calculate_interruption_score(&[silence(1.0), energy_change(0.5)]);
        assert!((score - 0.5 / 0.6).abs() < 1e-6);

        let single = TimingAnalyzer::calculate_interruption_score(&[natural_pause(0.4)]);
        assert!((single - 0.4).abs() < 1e-6);
    }

    #[test]
    fn recommendation_thresholds() {
        let strong = TimingOpportunity::from_signals(vec![silence(0.9)], 0.9, 0.7);
        assert_eq!(strong.recommendation, Recommendation::InterruptNow);
        assert_eq!(strong.reasoning, "Strong interruption opportunity detected: Silence");

        // 0.7 * 0.7 = 0.49
        let moderate = TimingOpportunity::from_signals(vec![natural_pause(0.5)], 0.5, 0.7);
        assert_eq!(moderate.recommendation, Recommendation::GoodTime);
        assert_eq!(moderate.reasoning, "Moderate interruption opportunity. Score: 50%");

        let weak = TimingOpportunity::from_signals(vec![natural_pause(0.4)], 0.4, 0.7);
        assert_eq!(weak.recommendation, Recommendation::Wait);
        assert_eq!(weak.reasoning, "Not a good time to interrupt. Score too low: 40%");
        assert!(!weak.is_interrupt_now());
    }

    #[test]
    fn strong_reasoning_lists_every_signal() {
        let opportunity =
            TimingOpportunity::from_signals(vec![natural_pause(0.9), topic_shift(0.9)], 0.9, 0.7);
        assert_eq!(
            opportunity.reasoning,
            "Strong interruption opportunity detected: Natural Pause, Topic Shift"
        );
    }

    #[test]
    fn silence_with_topic_shift_overrides_low_score() {
        let signals = vec![silence(0.1), topic_shift(0.1)];
        let score = TimingAnalyzer::calculate_interruption_score(&signals);
        assert!(score < 0.49);

        let opportunity = TimingOpportunity::from_signals(signals, score, 0.7);
        assert_eq!(opportunity.recommendation, Recommendation::InterruptNow);
        assert!(opportunity.reasoning.contains("topic shift during silence"));
    }

    #[test]
    fn pause_with_energy_change_overrides_low_score() {
        let signals = vec![natural_pause(0.4), energy_change(0.1)];
        let opportunity = TimingOpportunity::from_signals(signals, 0.1, 0.7);
        assert_eq!(opportunity.recommendation, Recommendation::InterruptNow);
        assert!(opportunity.reasoning.contains("host wrapping up"));
    }

    #[test]
    fn opportunity_serializes_snake_case() {
        let opportunity = TimingOpportunity::from_signals(vec![], 0.0, 0.7);
        let json = serde_json::to_value(&opportunity).unwrap();
        assert_eq!(json["recommendation"], "wait");
    }

    #[tokio::test]
    async fn blank_segment_is_a_no_op() {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed().never();
        let mut analyzer = TimingAnalyzer::new(&TimingConfig::default(), Arc::new(mock)).unwrap();

        let signals = analyzer.analyze_segment(&TranscriptSegment::new("   \n", 5000)).await;
        assert!(signals.is_empty());
        assert!(analyzer.current_energy().is_none());
        assert_eq!(analyzer.silence_detector().last_activity(), None);
    }

    #[tokio::test]
    async fn segment_feeds_silence_baseline_and_pause() {
        let mut analyzer = analyzer();
        let signals = analyzer
            .analyze_segment(&TranscriptSegment::new("That is all for today.", 1_000))
            .await;

        assert!(signals.iter().any(|s| s.kind() == SignalKind::NaturalPause));
        assert!(signals.iter().all(|s| s.kind() != SignalKind::TopicShift));
        assert_eq!(analyzer.silence_detector().last_activity(), Some(1_000));
        assert!(analyzer.current_energy().is_some());

        assert!(analyzer.check_silence(2_000).is_none());
        let quiet = analyzer.check_silence(4_000).expect("silence after threshold");
        assert_eq!(quiet.kind(), SignalKind::Silence);
    }

    #[tokio::test]
    async fn reset_behaves_like_new_session() {
        let mut analyzer = analyzer();
        for (i, text) in ["first topic here", "second thing now", "and a third"].iter().enumerate() {
            analyzer
                .analyze_segment(&TranscriptSegment::new(*text, i as u64 * 1000))
                .await;
        }
        assert!(analyzer.average_energy().is_some());

        analyzer.reset();
        assert!(analyzer.current_energy().is_none());
        assert!(analyzer.average_energy().is_none());
        assert_eq!(analyzer.silence_detector().last_activity(), None);

        // No prior window, so an unrelated segment cannot shift topics.
        let signals = analyzer
            .analyze_segment(&TranscriptSegment::new("sourdough baking tips", 50_000))
            .await;
        assert!(signals.iter().all(|s| s.kind() != SignalKind::TopicShift));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TimingConfig {
            min_interruption_score: 2.0,
            ..Default::default()
        };
        assert!(TimingAnalyzer::new(&config, Arc::new(HashingEmbedder::default())).is_err());
    }
}
