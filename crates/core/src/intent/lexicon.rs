//! Phrase tables and matching helpers for the intent classifier.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, non_zero};

use super::Recency;

/// A name that is both a news outlet and a video channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualEntity {
    pub name: String,
    pub news_context: Vec<String>,
    pub video_context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyCue {
    pub recency: Recency,
    pub phrases: Vec<String>,
}

/// Keyword category mapped to a hostname allow-list for the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCue {
    pub category: String,
    pub keywords: Vec<String>,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub explicit_web: Vec<String>,
    pub explicit_video: Vec<String>,
    pub follow_up_openers: Vec<String>,
    pub follow_up_max_words: usize,
    pub greetings: Vec<String>,
    pub opinion: Vec<String>,
    pub personal: Vec<String>,
    pub reactions: Vec<String>,
    pub dual_entities: Vec<DualEntity>,
    pub video_channels: Vec<String>,
    pub news: Vec<String>,
    pub freshness: Vec<String>,
    pub trending: Vec<String>,
    pub factual_prefixes: Vec<String>,
    /// Checked in order; the first matching cue wins.
    pub recency_cues: Vec<RecencyCue>,
    /// Checked in order; the first matching category wins.
    pub domain_cues: Vec<DomainCue>,
    pub pro_tier_cues: Vec<String>,
    pub strategic_cues: Vec<String>,
    pub hype_cues: Vec<String>,
    pub reflective_cues: Vec<String>,
    /// Top scores below this fall back to conversation.
    pub score_floor: f32,
    pub fallback_confidence: f32,
    /// How recent the last exchange must be for the conversation to count as active.
    pub active_window_ms: u64,
    pub min_active_turns: u32,
}

fn phrases(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            explicit_web: phrases(&[
                "search for",
                "look up",
                "find information about",
                "research",
                "google",
            ]),
            explicit_video: phrases(&[
                "watch",
                "play video",
                "show me video",
                "find videos",
                "pull up video",
            ]),
            follow_up_openers: phrases(&[
                "why",
                "how",
                "when",
                "where",
                "what about",
                "tell me more",
                "explain",
                "continue",
                "elaborate",
            ]),
            follow_up_max_words: 3,
            greetings: phrases(&["hey", "hello", "hi", "what's up", "sup", "yo"]),
            opinion: phrases(&[
                "what do you think",
                "your opinion",
                "do you like",
                "your favorite",
                "your take",
            ]),
            personal: phrases(&[
                "who are you",
                "what can you do",
                "your name",
                "introduce yourself",
                "about you",
            ]),
            reactions: phrases(&[
                "cool",
                "interesting",
                "wow",
                "nice",
                "awesome",
                "that's wild",
                "no way",
                "really",
            ]),
            dual_entities: vec![
                DualEntity {
                    name: "cnn".into(),
                    news_context: phrases(&[
                        "news from cnn",
                        "cnn report",
                        "according to cnn",
                        "cnn said",
                        "breaking cnn",
                    ]),
                    video_context: phrases(&[
                        "watch cnn",
                        "cnn video",
                        "cnn coverage",
                        "cnn live stream",
                    ]),
                },
                DualEntity {
                    name: "espn".into(),
                    news_context: phrases(&[
                        "espn news",
                        "espn report",
                        "scores",
                        "standings",
                        "stats",
                        "trade",
                    ]),
                    video_context: phrases(&[
                        "watch espn",
                        "espn video",
                        "highlights",
                        "game",
                        "match",
                    ]),
                },
            ],
            video_channels: phrases(&[
                "joe rogan",
                "jre",
                "lex fridman",
                "mkbhd",
                "marques brownlee",
                "linus tech tips",
                "mrbeast",
                "pewdiepie",
                "ninja",
            ]),
            news: phrases(&[
                "news",
                "headlines",
                "breaking",
                "report",
                "reported",
                "according to",
            ]),
            freshness: phrases(&[
                "latest",
                "current",
                "today",
                "now",
                "right now",
                "just happened",
                "live",
            ]),
            trending: phrases(&["trending", "viral", "popular"]),
            factual_prefixes: phrases(&[
                "what is",
                "define",
                "meaning of",
                "how do you spell",
                "what's",
            ]),
            recency_cues: vec![
                RecencyCue {
                    recency: Recency::Day,
                    phrases: phrases(&["today", "today's", "this morning", "right now"]),
                },
                RecencyCue {
                    recency: Recency::Week,
                    phrases: phrases(&[
                        "this week",
                        "past week",
                        "last week",
                        "recent",
                        "recently",
                    ]),
                },
                RecencyCue {
                    recency: Recency::Month,
                    phrases: phrases(&["this month", "past month", "last month"]),
                },
                RecencyCue {
                    recency: Recency::Year,
                    phrases: phrases(&["this year", "past year", "last year"]),
                },
            ],
            domain_cues: vec![
                DomainCue {
                    category: "news".into(),
                    keywords: phrases(&["news", "headlines", "breaking", "report"]),
                    domains: phrases(&[
                        "cnn.com",
                        "bbc.com",
                        "reuters.com",
                        "apnews.com",
                        "npr.org",
                    ]),
                },
                DomainCue {
                    category: "tech".into(),
                    keywords: phrases(&[
                        "tech",
                        "technology",
                        "silicon valley",
                        "startup",
                        "ai",
                        "software",
                    ]),
                    domains: phrases(&[
                        "techcrunch.com",
                        "theverge.com",
                        "arstechnica.com",
                        "wired.com",
                    ]),
                },
                DomainCue {
                    category: "academic".into(),
                    keywords: phrases(&["research", "study", "academic", "scientific", "journal"]),
                    domains: phrases(&[
                        "scholar.google.com",
                        "arxiv.org",
                        "pubmed.ncbi.nlm.nih.gov",
                    ]),
                },
            ],
            pro_tier_cues: phrases(&["detailed", "in-depth", "comprehensive"]),
            strategic_cues: phrases(&["plan", "strategy", "analytics"]),
            hype_cues: phrases(&["let's go", "hype", "🔥"]),
            reflective_cues: phrases(&["how did", "feedback", "what went"]),
            score_floor: 20.0,
            fallback_confidence: 50.0,
            active_window_ms: 30_000,
            min_active_turns: 2,
        }
    }
}

impl IntentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.score_floor < 0.0 {
            return Err(ConfigError::Negative {
                name: "score_floor",
                value: self.score_floor,
            });
        }
        if self.fallback_confidence < 0.0 {
            return Err(ConfigError::Negative {
                name: "fallback_confidence",
                value: self.fallback_confidence,
            });
        }
        non_zero("follow_up_max_words", self.follow_up_max_words)?;
        non_zero("active_window_ms", self.active_window_ms)?;
        Ok(())
    }
}

pub(crate) fn contains_any(text: &str, list: &[String]) -> bool {
    list.iter().any(|phrase| text.contains(phrase.as_str()))
}

/// True when `text` starts with `phrase` and the phrase ends on a word
/// boundary, so "hi" does not open "history".
pub(crate) fn opens_with(text: &str, phrase: &str) -> bool {
    text.strip_prefix(phrase)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
}

pub(crate) fn opens_with_any(text: &str, list: &[String]) -> bool {
    list.iter().any(|phrase| opens_with(text, phrase))
}

/// Whole-word containment; "ai" matches "new ai chips" but not "said".
pub(crate) fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
