use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Database-agnostic message model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub author_id: String,
    pub body: String,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated reply waiting to be stored.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub thread_id: String,
    pub author_id: String,
    pub body: String,
}
