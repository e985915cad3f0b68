use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What the live show is about right now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowContext {
    pub episode_topic: Option<String>,
    pub segment_topic: Option<String>,
    pub is_live: bool,
}

/// Snapshot of the surrounding dialogue, read once per classified utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    pub has_recent_context: bool,
    /// Epoch ms of the last assistant exchange.
    pub last_timestamp: Option<u64>,
    pub turn_count: Option<u32>,
    pub recent_messages: Vec<String>,
    pub show: Option<ShowContext>,
}

impl ConversationContext {
    pub fn segment_topic(&self) -> Option<&str> {
        self.show.as_ref()?.segment_topic.as_deref()
    }

    pub fn episode_topic(&self) -> Option<&str> {
        self.show.as_ref()?.episode_topic.as_deref()
    }
}

/// Read-only, pull-based source of conversation context.
pub trait ContextProvider: Send + Sync {
    fn context(&self) -> ConversationContext;
}

impl ContextProvider for ConversationContext {
    fn context(&self) -> ConversationContext {
        self.clone()
    }
}

/// Lets the host publish context updates while a session is running.
impl ContextProvider for watch::Receiver<ConversationContext> {
    fn context(&self) -> ConversationContext {
        self.borrow().clone()
    }
}
