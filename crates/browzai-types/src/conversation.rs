use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

const TITLE_MAX_CHARS: usize = 60;

/// Conversation thread owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation plus its ordered message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWithMessages {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Derive a conversation title from the prompt that started it
pub fn title_from_prompt(prompt: &str) -> String {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= TITLE_MAX_CHARS {
        return collapsed;
    }

    let mut title: String = collapsed.chars().take(TITLE_MAX_CHARS - 1).collect();
    title.push('…');
    title
}
