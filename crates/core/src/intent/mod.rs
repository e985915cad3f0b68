//! Priority-ordered intent scoring.
//!
//! Every utterance is scored into four additive buckets by a fixed sequence of
//! rules. The highest bucket wins; ties go to the bucket listed first in
//! [`IntentKind::PRIORITY`]. A top score under the floor is not trusted and
//! the utterance is treated as plain conversation.

mod lexicon;

use serde::{Deserialize, Serialize};

use crate::context::ConversationContext;
use crate::error::ConfigError;

pub use lexicon::{DomainCue, DualEntity, IntentConfig, RecencyCue};
use lexicon::{contains_any, contains_word, opens_with_any};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    FollowUp,
    Conversation,
    SearchWeb,
    SearchVideo,
}

impl IntentKind {
    /// Tie-break order, strongest first.
    pub const PRIORITY: [IntentKind; 4] = [
        IntentKind::FollowUp,
        IntentKind::Conversation,
        IntentKind::SearchWeb,
        IntentKind::SearchVideo,
    ];

    fn rank(self) -> usize {
        match self {
            IntentKind::FollowUp => 0,
            IntentKind::Conversation => 1,
            IntentKind::SearchWeb => 2,
            IntentKind::SearchVideo => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recency {
    Day,
    Week,
    Month,
    Year,
}

impl Recency {
    pub fn as_str(self) -> &'static str {
        match self {
            Recency::Day => "day",
            Recency::Week => "week",
            Recency::Month => "month",
            Recency::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    #[default]
    Standard,
    Pro,
}

/// Voice the co-host should answer in when the utterance is conversational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Strategic,
    Hype,
    Reflective,
    Creative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency: Option<Recency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<SearchTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub kind: IntentKind,
    /// The winning bucket's raw score, not a probability.
    pub confidence: f32,
    pub reasoning: Vec<String>,
    pub metadata: IntentMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketScores {
    pub follow_up: f32,
    pub conversation: f32,
    pub search_web: f32,
    pub search_video: f32,
}

impl BucketScores {
    pub fn get(&self, kind: IntentKind) -> f32 {
        match kind {
            IntentKind::FollowUp => self.follow_up,
            IntentKind::Conversation => self.conversation,
            IntentKind::SearchWeb => self.search_web,
            IntentKind::SearchVideo => self.search_video,
        }
    }

    /// Buckets from highest to lowest score, ties in priority order.
    pub fn ranked(&self) -> Vec<(IntentKind, f32)> {
        let mut ranked: Vec<(IntentKind, f32)> = IntentKind::PRIORITY
            .iter()
            .map(|kind| (*kind, self.get(*kind)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.rank().cmp(&b.0.rank())));
        ranked
    }

    pub fn winner(&self) -> (IntentKind, f32) {
        self.ranked()[0]
    }
}

/// Everything the rules produced before a winner is picked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSheet {
    pub scores: BucketScores,
    pub reasoning: Vec<String>,
    pub metadata: IntentMetadata,
}

pub struct IntentClassifier {
    config: IntentConfig,
}

impl IntentClassifier {
    pub fn new(config: IntentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IntentConfig {
        &self.config
    }

    /// Runs every rule and returns the raw bucket totals.
    pub fn score(&self, query: &str, ctx: &ConversationContext, now_ms: u64) -> ScoreSheet {
        let cfg = &self.config;
        let q = query.trim().to_lowercase();
        let mut s = BucketScores::default();
        let mut reasoning = Vec::new();

        if contains_any(&q, &cfg.explicit_web) {
            s.search_web += 100.0;
            reasoning.push("Explicit web search keyword detected (+100 web)".to_string());
        }
        if contains_any(&q, &cfg.explicit_video) {
            s.search_video += 100.0;
            reasoning.push("Explicit video command detected (+100 video)".to_string());
        }

        if ctx.has_recent_context
            && q.split_whitespace().count() <= cfg.follow_up_max_words
            && opens_with_any(&q, &cfg.follow_up_openers)
        {
            s.follow_up += 80.0;
            reasoning.push("Follow-up question detected (+80 follow-up)".to_string());
        }

        let active = ctx.has_recent_context
            && ctx
                .last_timestamp
                .is_some_and(|last| now_ms.saturating_sub(last) < cfg.active_window_ms)
            && ctx.turn_count.is_some_and(|turns| turns >= cfg.min_active_turns);
        if active {
            s.search_web *= 0.5;
            s.conversation += 30.0;
            reasoning
                .push("Active conversation detected (+30 conversation, -50% search)".to_string());
        }

        let mut segment_matched = false;
        if let Some(topic) = ctx.segment_topic() {
            if mentions_topic(&q, topic) {
                segment_matched = true;
                s.conversation += 40.0;
                s.search_web = (s.search_web - 20.0).max(0.0);
                reasoning.push(format!(
                    "Query relates to current segment topic: \"{topic}\" (+40 conversation, -20 search)"
                ));
            }
        }
        if !segment_matched {
            if let Some(topic) = ctx.episode_topic() {
                if mentions_topic(&q, topic) {
                    s.conversation += 30.0;
                    s.search_web = (s.search_web - 15.0).max(0.0);
                    reasoning.push(format!(
                        "Query relates to episode topic: \"{topic}\" (+30 conversation, -15 search)"
                    ));
                }
            }
        }

        if opens_with_any(&q, &cfg.greetings) {
            s.conversation += 60.0;
            reasoning.push("Greeting detected (+60 conversation)".to_string());
        }
        if contains_any(&q, &cfg.opinion) {
            s.conversation += 70.0;
            reasoning.push("Opinion request detected (+70 conversation)".to_string());
        }
        if contains_any(&q, &cfg.personal) {
            s.conversation += 70.0;
            reasoning.push("Personal question detected (+70 conversation)".to_string());
        }
        if opens_with_any(&q, &cfg.reactions) {
            s.conversation += 50.0;
            reasoning.push("Reaction detected (+50 conversation)".to_string());
        }

        for entity in cfg.dual_entities.iter().filter(|e| q.contains(e.name.as_str())) {
            let name = entity.name.to_uppercase();
            if contains_any(&q, &entity.news_context) {
                s.search_web += 50.0;
                reasoning.push(format!("{name} in news context (+50 web)"));
            } else if contains_any(&q, &entity.video_context) {
                s.search_video += 50.0;
                reasoning.push(format!("{name} in video context (+50 video)"));
            } else {
                s.search_web += 15.0;
                s.search_video += 15.0;
                reasoning.push(format!("{name} mentioned but context ambiguous (+15 both)"));
            }
        }
        if contains_any(&q, &cfg.video_channels) {
            s.search_video += 40.0;
            reasoning.push("Video-only channel mentioned (+40 video)".to_string());
        }

        let has_news = contains_any(&q, &cfg.news);
        if has_news {
            s.search_web += 40.0;
            reasoning.push("News topic keyword detected (+40 web)".to_string());
        }
        if contains_any(&q, &cfg.freshness) {
            s.search_web += 35.0;
            reasoning.push("Real-time data request (+35 web)".to_string());
        }
        if contains_any(&q, &cfg.trending) {
            if has_news {
                s.search_web += 30.0;
                reasoning.push("Trending + news context (+30 web)".to_string());
            } else {
                s.search_video += 20.0;
                s.search_web += 10.0;
                reasoning.push("Trending keyword (ambiguous, +20 video, +10 web)".to_string());
            }
        }
        if opens_with_any(&q, &cfg.factual_prefixes) {
            s.conversation += 30.0;
            reasoning.push("Simple factual question (+30 conversation)".to_string());
        }

        let metadata = self.extract_metadata(&q, &mut reasoning);

        tracing::debug!(
            follow_up = s.follow_up,
            conversation = s.conversation,
            search_web = s.search_web,
            search_video = s.search_video,
            "intent bucket scores"
        );

        ScoreSheet {
            scores: s,
            reasoning,
            metadata,
        }
    }

    /// Picks exactly one intent for `query`. Never fails.
    pub fn classify(&self, query: &str, ctx: &ConversationContext, now_ms: u64) -> IntentScore {
        let ScoreSheet {
            scores,
            mut reasoning,
            mut metadata,
        } = self.score(query, ctx, now_ms);
        let (kind, score) = scores.winner();

        if score < self.config.score_floor {
            reasoning.push("No strong intent detected, defaulting to conversation".to_string());
            return IntentScore {
                kind: IntentKind::Conversation,
                confidence: self.config.fallback_confidence,
                reasoning,
                metadata: IntentMetadata {
                    mode: Some(ResponseMode::Creative),
                    ..Default::default()
                },
            };
        }

        if kind == IntentKind::Conversation {
            metadata.mode = Some(self.infer_mode(&query.to_lowercase()));
        }

        tracing::debug!(?kind, confidence = score, "intent classified");
        IntentScore {
            kind,
            confidence: score,
            reasoning,
            metadata,
        }
    }

    fn extract_metadata(&self, q: &str, reasoning: &mut Vec<String>) -> IntentMetadata {
        let mut metadata = IntentMetadata::default();

        if let Some(cue) = self
            .config
            .recency_cues
            .iter()
            .find(|cue| contains_any(q, &cue.phrases))
        {
            metadata.recency = Some(cue.recency);
            reasoning.push(format!("Time filter detected: {}", cue.recency.as_str()));
        }

        if let Some(cue) = self
            .config
            .domain_cues
            .iter()
            .find(|cue| cue.keywords.iter().any(|kw| contains_word(q, kw)))
        {
            metadata.domains = Some(cue.domains.clone());
            reasoning.push(format!("Domain filter detected: {}", cue.category));
        }

        if contains_any(q, &self.config.pro_tier_cues) {
            metadata.model_tier = Some(SearchTier::Pro);
            reasoning.push("Pro search tier requested (detailed analysis)".to_string());
        }

        metadata
    }

    fn infer_mode(&self, q: &str) -> ResponseMode {
        let cfg = &self.config;
        if contains_any(q, &cfg.strategic_cues) {
            ResponseMode::Strategic
        } else if contains_any(q, &cfg.hype_cues) {
            ResponseMode::Hype
        } else if contains_any(q, &cfg.reflective_cues) {
            ResponseMode::Reflective
        } else {
            ResponseMode::Creative
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self {
            config: IntentConfig::default(),
        }
    }
}

/// Any topic word longer than three characters appearing in the query.
fn mentions_topic(query: &str, topic: &str) -> bool {
    topic
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .any(|word| query.contains(word))
}

const REAL_TIME_KEYWORDS: &[&str] = &[
    "weather", "stock", "price", "score", "live", "breaking", "current", "latest", "now", "today",
    "right now",
];

/// Cheap keyword check for utterances that need live data.
pub fn needs_real_time_data(text: &str) -> bool {
    let lower = text.to_lowercase();
    REAL_TIME_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
