use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::TimingConfig;
use crate::context::ContextProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::ConfigError;
use crate::intent::{IntentClassifier, IntentConfig};
use crate::monitor::TimingMonitor;
use crate::segment::TranscriptSegment;
use crate::signal::TimingSignal;
use crate::silence::SilenceDetector;
use crate::{Decision, SessionInput, now_ms};

const SILENCE_CHANNEL_CAPACITY: usize = 8;

/// One listening session: timing monitor, intent classifier and the context
/// they read from.
pub struct CohostSession<C: ContextProvider> {
    monitor: TimingMonitor,
    classifier: IntentClassifier,
    context: C,
    check_interval: Duration,
}

impl<C: ContextProvider> CohostSession<C> {
    pub fn new(
        timing: &TimingConfig,
        intent: IntentConfig,
        provider: Arc<dyn EmbeddingProvider>,
        context: C,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            monitor: TimingMonitor::new(timing, provider)?,
            classifier: IntentClassifier::new(intent)?,
            context,
            check_interval: timing.silence_check_interval(),
        })
    }

    pub fn monitor(&self) -> &TimingMonitor {
        &self.monitor
    }

    /// Analyzes one utterance and, when it opens a timing opportunity, sends a
    /// decision carrying the utterance's classified intent.
    pub async fn process_segment(
        &mut self,
        segment: TranscriptSegment,
        decision_tx: &mpsc::Sender<Decision>,
    ) -> Result<()> {
        let Some(opportunity) = self.monitor.observe_segment(&segment).await else {
            return Ok(());
        };

        let intent =
            self.classifier
                .classify(&segment.text, &self.context.context(), segment.timestamp);
        tracing::debug!(kind = ?intent.kind, confidence = intent.confidence, "classified segment");

        decision_tx
            .send(Decision {
                opportunity,
                intent: Some(intent),
            })
            .await
            .context("Failed to send decision")
    }

    pub async fn process_silence(
        &mut self,
        signal: TimingSignal,
        decision_tx: &mpsc::Sender<Decision>,
    ) -> Result<()> {
        let opportunity = self.monitor.observe_silence(signal);
        decision_tx
            .send(Decision {
                opportunity,
                intent: None,
            })
            .await
            .context("Failed to send silence decision")
    }

    /// Drives the session until `Stop` arrives or every input sender is gone,
    /// then resets all detectors.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<SessionInput>,
        decision_tx: mpsc::Sender<Decision>,
    ) -> Result<()> {
        let (silence_tx, mut silence_rx) = mpsc::channel(SILENCE_CHANNEL_CAPACITY);
        let poller =
            spawn_silence_poll(self.monitor.silence_detector(), self.check_interval, silence_tx);
        tracing::info!("Cohost session started");

        let result = loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(SessionInput::Segment(segment)) => {
                        if let Err(e) = self.process_segment(segment, &decision_tx).await {
                            break Err(e);
                        }
                    }
                    Some(SessionInput::Stop) | None => break Ok(()),
                },
                Some(signal) = silence_rx.recv() => {
                    if let Err(e) = self.process_silence(signal, &decision_tx).await {
                        break Err(e);
                    }
                }
            }
        };

        poller.abort();
        self.monitor.reset();
        tracing::info!("Cohost session ended");
        result
    }
}

/// Polls `detector` against the wall clock every `every` and forwards silence
/// signals. Stops once the receiving side is gone.
pub fn spawn_silence_poll(
    detector: Arc<SilenceDetector>,
    every: Duration,
    silence_tx: mpsc::Sender<TimingSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(signal) = detector.detect_silence(now_ms()) else {
                continue;
            };
            match silence_tx.try_send(signal) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Dropping silence signal, session is still busy")
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConversationContext;
    use crate::embedding::HashingEmbedder;
    use crate::intent::IntentKind;
    use crate::signal::SignalKind;
    use crate::timing::Recommendation;
    use tokio::sync::watch;

    fn quiet_config() -> TimingConfig {
        // Long poll interval: only the initial tick runs, which just records a baseline.
        TimingConfig {
            silence_check_interval_ms: 3_600_000,
            ..Default::default()
        }
    }

    fn session<C: ContextProvider>(config: &TimingConfig, context: C) -> CohostSession<C> {
        CohostSession::new(
            config,
            IntentConfig::default(),
            Arc::new(HashingEmbedder::default()),
            context,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn segment_with_opportunity_sends_decision() {
        let mut session = session(&quiet_config(), ConversationContext::default());
        let (decision_tx, mut decision_rx) = mpsc::channel(4);

        session
            .process_segment(
                TranscriptSegment::new("Anyway, what do you think about the trade?", now_ms()),
                &decision_tx,
            )
            .await
            .unwrap();

        let decision = decision_rx.try_recv().expect("a decision should have been sent");
        assert!(
            decision
                .opportunity
                .signals
                .iter()
                .any(|s| s.kind() == SignalKind::NaturalPause)
        );
        let intent = decision.intent.expect("segment decisions carry an intent");
        assert_eq!(intent.kind, IntentKind::Conversation);
    }

    #[tokio::test]
    async fn segment_without_signals_sends_nothing() {
        let mut session = session(&quiet_config(), ConversationContext::default());
        let (decision_tx, mut decision_rx) = mpsc::channel(4);

        session
            .process_segment(TranscriptSegment::new("and then we kept driving", now_ms()), &decision_tx)
            .await
            .unwrap();
        assert!(decision_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn silence_decision_has_no_intent() {
        let mut session = session(&quiet_config(), ConversationContext::default());
        let (decision_tx, mut decision_rx) = mpsc::channel(4);

        let detector = session.monitor().silence_detector();
        detector.on_transcript(1_000);
        let signal = detector.detect_silence(7_000).unwrap();
        session.process_silence(signal, &decision_tx).await.unwrap();

        let decision = decision_rx.try_recv().unwrap();
        assert!(decision.intent.is_none());
        assert_eq!(decision.opportunity.recommendation, Recommendation::InterruptNow);
    }

    #[tokio::test]
    async fn run_reads_context_and_stops_cleanly() {
        let (context_tx, context_rx) = watch::channel(ConversationContext::default());
        let session = session(&quiet_config(), context_rx);
        let (input_tx, input_rx) = mpsc::channel(8);
        let (decision_tx, mut decision_rx) = mpsc::channel(8);
        let handle = tokio::spawn(session.run(input_rx, decision_tx));

        context_tx.send_modify(|ctx| ctx.has_recent_context = true);
        input_tx
            .send(SessionInput::Segment(TranscriptSegment::new("why?", now_ms())))
            .await
            .unwrap();
        input_tx.send(SessionInput::Stop).await.unwrap();

        let decision = decision_rx.recv().await.expect("decision for the question");
        assert_eq!(decision.intent.unwrap().kind, IntentKind::FollowUp);

        handle.await.unwrap().unwrap();
        // The session dropped its sender on the way out.
        assert!(decision_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_ends_when_inputs_close() {
        let session = session(&quiet_config(), ConversationContext::default());
        let (input_tx, input_rx) = mpsc::channel(1);
        let (decision_tx, _decision_rx) = mpsc::channel(1);
        let handle = tokio::spawn(session.run(input_rx, decision_tx));

        drop(input_tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("session should stop once inputs close")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn run_reports_polled_silence() {
        let config = TimingConfig {
            silence_threshold_ms: 30,
            silence_check_interval_ms: 10,
            ..Default::default()
        };
        let session = session(&config, ConversationContext::default());
        let (input_tx, input_rx) = mpsc::channel(1);
        // Roomy enough that repeated silence never blocks the session before Stop.
        let (decision_tx, mut decision_rx) = mpsc::channel(256);
        let handle = tokio::spawn(session.run(input_rx, decision_tx));

        let decision = tokio::time::timeout(Duration::from_secs(2), decision_rx.recv())
            .await
            .expect("silence should be reported")
            .unwrap();
        assert!(decision.intent.is_none());
        assert_eq!(decision.opportunity.signals[0].kind(), SignalKind::Silence);

        input_tx.send(SessionInput::Stop).await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
