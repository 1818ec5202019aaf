use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::{Message, Tag, Thread};

/// MongoDB-specific Thread model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

/// MongoDB-specific Message model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: ObjectId,
    pub author_id: String,
    pub body: String,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTag {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

// Conversions from MongoDB-specific to database-agnostic models

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id.to_hex(),
            owner_id: thread.owner_id,
            title: thread.title,
            tags: thread.tags,
            visible: thread.visible,
            created_at: thread.created_at,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id.to_hex(),
            thread_id: msg.thread_id.to_hex(),
            author_id: msg.author_id,
            body: msg.body,
            visible: msg.visible,
            created_at: msg.created_at,
        }
    }
}

impl From<MongoTag> for Tag {
    fn from(tag: MongoTag) -> Self {
        Self {
            id: tag.id.to_hex(),
            name: tag.name,
        }
    }
}
