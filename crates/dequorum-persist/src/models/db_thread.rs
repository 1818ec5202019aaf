use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::{Message, Tag};

/// Database-agnostic thread model
///
/// Tags are stored by name so both filter strategies can run against the
/// thread record alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

/// A visible thread together with its visible messages in creation order.
#[derive(Debug, Clone)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub messages: Vec<Message>,
    pub message_count: usize,
}

/// Everything needed to create a thread and its opening message in one unit.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub owner_id: String,
    pub title: String,
    pub tags: Vec<Tag>,
    pub first_message: String,
}

impl NewThread {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}
