use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::filter::ThreadFilter;
use crate::models::{Message, NewMessage, NewThread, Tag, Thread, ThreadDetail};
use crate::trait_client::ForumStore;

/// In-process store backed by vectors behind one lock.
///
/// Ids are sequential per entity kind and records are kept in insertion
/// order, so reversing a vector gives most-recent-first.
#[derive(Default)]
pub struct MemoryForumStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_tag_id: u64,
    next_thread_id: u64,
    next_message_id: u64,
    tags: Vec<Tag>,
    threads: Vec<Thread>,
    messages: Vec<Message>,
}

impl Inner {
    fn visible_thread(&self, thread_id: &str) -> Option<&Thread> {
        self.threads
            .iter()
            .find(|thread| thread.id == thread_id && thread.visible)
    }

    fn push_message(&mut self, thread_id: &str, author_id: &str, body: &str) -> Message {
        self.next_message_id += 1;
        let message = Message {
            id: self.next_message_id.to_string(),
            thread_id: thread_id.to_string(),
            author_id: author_id.to_string(),
            body: body.to_string(),
            visible: true,
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }
}

impl MemoryForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the given tag names
    pub async fn with_tags(names: &[&str]) -> Result<Self> {
        let store = Self::new();
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        store.ensure_tags(&names).await?;
        Ok(store)
    }

    /// Mark a thread as moderated. Returns false when the id is unknown.
    pub async fn hide_thread(&self, thread_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.threads.iter_mut().find(|thread| thread.id == thread_id) {
            Some(thread) => {
                thread.visible = false;
                true
            }
            None => false,
        }
    }

    /// Mark a message as moderated. Returns false when the id is unknown.
    pub async fn hide_message(&self, message_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.messages.iter_mut().find(|message| message.id == message_id) {
            Some(message) => {
                message.visible = false;
                true
            }
            None => false,
        }
    }

    /// Raw record counts, hidden ones included
    pub async fn counts(&self) -> (usize, usize) {
        let inner = self.inner.read().await;
        (inner.threads.len(), inner.messages.len())
    }
}

#[async_trait]
impl ForumStore for MemoryForumStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut inner = self.inner.write().await;
        let mut tags = Vec::with_capacity(names.len());

        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let existing = inner.tags.iter().find(|tag| tag.name == name).cloned();
            let tag = match existing {
                Some(tag) => tag,
                None => {
                    inner.next_tag_id += 1;
                    let tag = Tag {
                        id: inner.next_tag_id.to_string(),
                        name: name.to_string(),
                    };
                    inner.tags.push(tag.clone());
                    tag
                }
            };
            tags.push(tag);
        }

        Ok(tags)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let inner = self.inner.read().await;
        let mut tags = inner.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_tags(&self, ids: &[String]) -> Result<Vec<Tag>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tags
            .iter()
            .filter(|tag| ids.contains(&tag.id))
            .cloned()
            .collect())
    }

    async fn count_visible_threads(&self, filter: &ThreadFilter) -> Result<u64> {
        let inner = self.inner.read().await;
        let count = inner
            .threads
            .iter()
            .filter(|thread| thread.visible && filter.matches(&thread.tags))
            .count();
        Ok(count as u64)
    }

    async fn list_visible_threads(
        &self,
        filter: &ThreadFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Thread>> {
        let inner = self.inner.read().await;
        let threads = inner
            .threads
            .iter()
            .rev()
            .filter(|thread| thread.visible && filter.matches(&thread.tags))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(threads)
    }

    async fn get_visible_thread_with_messages(&self, thread_id: &str) -> Result<Option<ThreadDetail>> {
        let inner = self.inner.read().await;
        let Some(thread) = inner.visible_thread(thread_id).cloned() else {
            return Ok(None);
        };

        let messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|message| message.thread_id == thread.id && message.visible)
            .cloned()
            .collect();

        Ok(Some(ThreadDetail {
            message_count: messages.len(),
            thread,
            messages,
        }))
    }

    async fn create_thread(&self, new_thread: NewThread) -> Result<(Thread, Message)> {
        let mut inner = self.inner.write().await;

        inner.next_thread_id += 1;
        let thread = Thread {
            id: inner.next_thread_id.to_string(),
            owner_id: new_thread.owner_id.clone(),
            title: new_thread.title.clone(),
            tags: new_thread.tag_names(),
            visible: true,
            created_at: Utc::now(),
        };
        inner.threads.push(thread.clone());

        let message = inner.push_message(&thread.id, &new_thread.owner_id, &new_thread.first_message);
        Ok((thread, message))
    }

    async fn create_message(&self, new_message: NewMessage) -> Result<Message> {
        let mut inner = self.inner.write().await;
        if inner.visible_thread(&new_message.thread_id).is_none() {
            return Err(PersistError::ThreadNotFound(new_message.thread_id));
        }
        Ok(inner.push_message(&new_message.thread_id, &new_message.author_id, &new_message.body))
    }
}
