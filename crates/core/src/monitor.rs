use std::sync::Arc;

use crate::config::TimingConfig;
use crate::embedding::EmbeddingProvider;
use crate::energy::EnergyMetrics;
use crate::error::ConfigError;
use crate::history::BoundedHistory;
use crate::segment::TranscriptSegment;
use crate::signal::TimingSignal;
use crate::silence::SilenceDetector;
use crate::timing::{TimingAnalyzer, TimingOpportunity};

/// Session-level bookkeeping on top of a `TimingAnalyzer`: the latest
/// signals, a bounded signal history and the current opportunity.
///
/// A silence reported no more than one poll interval before a segment is
/// scored together with that segment's signals.
pub struct TimingMonitor {
    analyzer: TimingAnalyzer,
    min_score: f32,
    silence_carry_ms: u64,
    recent_silence: Option<TimingSignal>,
    latest_signals: Vec<TimingSignal>,
    history: BoundedHistory<TimingSignal>,
    total_signals: usize,
    opportunity: Option<TimingOpportunity>,
}

impl TimingMonitor {
    pub fn new(
        config: &TimingConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            analyzer: TimingAnalyzer::new(config, provider)?,
            min_score: config.min_interruption_score,
            silence_carry_ms: config.silence_check_interval_ms,
            recent_silence: None,
            latest_signals: Vec::new(),
            history: BoundedHistory::with_capacity(config.signal_history),
            total_signals: 0,
            opportunity: None,
        })
    }

    /// Analyzes a segment. Returns a fresh opportunity only when something fired;
    /// otherwise the previous opportunity stays current.
    pub async fn observe_segment(&mut self, segment: &TranscriptSegment) -> Option<TimingOpportunity> {
        let carry = self.silence_carry_ms;
        let silence = self
            .recent_silence
            .take()
            .filter(|s| segment.timestamp.saturating_sub(s.timestamp) <= carry);

        let mut signals = self.analyzer.analyze_segment(segment).await;
        if signals.is_empty() {
            return None;
        }
        self.track(&signals);

        if let Some(silence) = silence {
            signals.insert(0, silence);
        }
        let score = TimingAnalyzer::calculate_interruption_score(&signals);
        Some(self.publish(signals, score))
    }

    /// A polled silence signal scores on its own confidence.
    pub fn observe_silence(&mut self, signal: TimingSignal) -> TimingOpportunity {
        let score = signal.confidence;
        self.track(std::slice::from_ref(&signal));
        self.recent_silence = Some(signal.clone());
        self.publish(vec![signal], score)
    }

    fn track(&mut self, signals: &[TimingSignal]) {
        for signal in signals {
            self.history.push(signal.clone());
        }
        self.total_signals += signals.len();
    }

    fn publish(&mut self, signals: Vec<TimingSignal>, score: f32) -> TimingOpportunity {
        self.latest_signals = signals.clone();

        let opportunity = TimingOpportunity::from_signals(signals, score, self.min_score);
        tracing::info!(
            score = opportunity.score,
            recommendation = ?opportunity.recommendation,
            reasoning = %opportunity.reasoning,
            "timing opportunity"
        );
        self.opportunity = Some(opportunity.clone());
        opportunity
    }

    pub fn should_interrupt(&self) -> bool {
        self.opportunity
            .as_ref()
            .is_some_and(TimingOpportunity::is_interrupt_now)
    }

    pub fn timing_opportunity(&self) -> Option<&TimingOpportunity> {
        self.opportunity.as_ref()
    }

    pub fn latest_signals(&self) -> &[TimingSignal] {
        &self.latest_signals
    }

    /// Oldest first.
    pub fn signal_history(&self) -> Vec<TimingSignal> {
        self.history.to_vec()
    }

    pub fn total_signals_detected(&self) -> usize {
        self.total_signals
    }

    pub fn current_energy(&self) -> Option<&EnergyMetrics> {
        self.analyzer.current_energy()
    }

    pub fn silence_detector(&self) -> Arc<SilenceDetector> {
        self.analyzer.silence_detector()
    }

    pub fn reset(&mut self) {
        self.analyzer.reset();
        self.latest_signals.clear();
        self.recent_silence = None;
        self.history.clear();
        self.total_signals = 0;
        self.opportunity = None;
    }
}
