use std::time::Duration;

use mongodb::{Client, ClientSession, bson::doc, bson::oid::ObjectId, options::ClientOptions};
use async_trait::async_trait;
use chrono::Utc;

use crate::trait_client::ForumStore;
use crate::filter::ThreadFilter;
use crate::models::{Message, NewMessage, NewThread, Tag, Thread, ThreadDetail};
use crate::dbs::mongo::models::{MongoMessage, MongoThread};
use crate::dbs::mongo::repositories::{MongoMessageRepository, MongoTagRepository, MongoThreadRepository};
use crate::error::{Result, PersistError};

/// Connection settings for [`MongoForumStore`]
#[derive(Debug, Clone)]
pub struct MongoStoreOptions {
    pub database: String,
    pub pool_size: u32,
    pub timeout_ms: u64,
    /// Wrap thread creation in a multi-document transaction. Needs a replica
    /// set. Without it the thread is written hidden and published once its
    /// opening message is stored.
    pub transactions: bool,
}

pub struct MongoForumStore {
    client: Client,
    database: String,
    transactions: bool,
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
    tag_repo: MongoTagRepository,
}

impl MongoForumStore {
    /// Connect to MongoDB and create the store
    pub async fn connect(mongodb_uri: &str, options: MongoStoreOptions) -> Result<Self> {
        let mut client_options = ClientOptions::parse(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        client_options.max_pool_size = Some(options.pool_size);
        client_options.connect_timeout = Some(Duration::from_millis(options.timeout_ms));
        client_options.server_selection_timeout = Some(Duration::from_millis(options.timeout_ms));

        let client = Client::with_options(client_options)
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let thread_repo = MongoThreadRepository::new(&client, &options.database);
        let message_repo = MongoMessageRepository::new(&client, &options.database);
        let tag_repo = MongoTagRepository::new(&client, &options.database);
        tag_repo.ensure_indexes().await?;

        Ok(Self {
            client,
            database: options.database,
            transactions: options.transactions,
            thread_repo,
            message_repo,
            tag_repo,
        })
    }

    async fn create_thread_in_transaction(
        &self,
        thread: &MongoThread,
        message: &MongoMessage,
    ) -> Result<()> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        if let Err(e) = self.insert_pair(thread, message, &mut session).await {
            if let Err(abort_err) = session.abort_transaction().await {
                tracing::warn!("Failed to abort thread transaction: {}", abort_err);
            }
            return Err(e);
        }

        session.commit_transaction().await?;
        Ok(())
    }

    async fn insert_pair(
        &self,
        thread: &MongoThread,
        message: &MongoMessage,
        session: &mut ClientSession,
    ) -> Result<()> {
        self.thread_repo.insert_thread(thread, Some(&mut *session)).await?;
        self.message_repo.save_message(message, Some(session)).await?;
        Ok(())
    }

    /// Insert the thread hidden, add its opening message, then publish it.
    ///
    /// Readers and repliers never see the thread before its first message
    /// exists. Any failure removes what was written.
    async fn create_thread_compensating(
        &self,
        thread: &MongoThread,
        message: &MongoMessage,
    ) -> Result<()> {
        self.thread_repo.insert_thread(&pending_thread(thread), None).await?;

        if let Err(e) = self.message_repo.save_message(message, None).await {
            tracing::error!(thread_id = %thread.id, "Opening message failed, removing thread: {}", e);
            self.remove_thread(thread.id).await;
            return Err(e);
        }

        if let Err(e) = self.thread_repo.publish_thread(thread.id).await {
            tracing::error!(thread_id = %thread.id, "Publishing thread failed, removing it: {}", e);
            if let Err(delete_err) = self.message_repo.delete_message(message.id).await {
                tracing::error!(message_id = %message.id, "Failed to remove opening message: {}", delete_err);
            }
            self.remove_thread(thread.id).await;
            return Err(e);
        }
        Ok(())
    }

    async fn remove_thread(&self, thread_id: ObjectId) {
        if let Err(e) = self.thread_repo.delete_thread(thread_id).await {
            tracing::error!(thread_id = %thread_id, "Failed to remove orphaned thread: {}", e);
        }
    }
}

/// Hidden copy of `thread`, written before its opening message
fn pending_thread(thread: &MongoThread) -> MongoThread {
    MongoThread {
        visible: false,
        ..thread.clone()
    }
}

fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl ForumStore for MongoForumStore {
    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn ensure_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let names: Vec<String> = names
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let tags = self.tag_repo.upsert_names(&names).await?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = self.tag_repo.list_tags().await?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn get_tags(&self, ids: &[String]) -> Result<Vec<Tag>> {
        let object_ids: Vec<ObjectId> = ids.iter().filter_map(|id| parse_object_id(id)).collect();
        let tags = self.tag_repo.get_tags(&object_ids).await?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn count_visible_threads(&self, filter: &ThreadFilter) -> Result<u64> {
        self.thread_repo.count_visible_threads(filter).await
    }

    async fn list_visible_threads(
        &self,
        filter: &ThreadFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Thread>> {
        let threads = self.thread_repo.list_visible_threads(filter, offset, limit).await?;
        Ok(threads.into_iter().map(Thread::from).collect())
    }

    async fn get_visible_thread_with_messages(&self, thread_id: &str) -> Result<Option<ThreadDetail>> {
        // A malformed id cannot name a visible thread
        let Some(object_id) = parse_object_id(thread_id) else {
            return Ok(None);
        };
        let Some(thread) = self.thread_repo.get_visible_thread(object_id).await? else {
            return Ok(None);
        };

        let messages: Vec<Message> = self.message_repo
            .get_visible_messages(object_id)
            .await?
            .into_iter()
            .map(Message::from)
            .collect();

        Ok(Some(ThreadDetail {
            thread: thread.into(),
            message_count: messages.len(),
            messages,
        }))
    }

    async fn create_thread(&self, new_thread: NewThread) -> Result<(Thread, Message)> {
        let now = Utc::now();
        let thread = MongoThread {
            id: ObjectId::new(),
            owner_id: new_thread.owner_id.clone(),
            title: new_thread.title.clone(),
            tags: new_thread.tag_names(),
            visible: true,
            created_at: now,
        };
        let message = MongoMessage {
            id: ObjectId::new(),
            thread_id: thread.id,
            author_id: new_thread.owner_id,
            body: new_thread.first_message,
            visible: true,
            created_at: now,
        };

        if self.transactions {
            self.create_thread_in_transaction(&thread, &message).await?;
        } else {
            self.create_thread_compensating(&thread, &message).await?;
        }

        Ok((thread.into(), message.into()))
    }

    async fn create_message(&self, new_message: NewMessage) -> Result<Message> {
        let thread_id = parse_object_id(&new_message.thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(new_message.thread_id.clone()))?;
        if self.thread_repo.get_visible_thread(thread_id).await?.is_none() {
            return Err(PersistError::ThreadNotFound(new_message.thread_id));
        }

        let message = MongoMessage {
            id: ObjectId::new(),
            thread_id,
            author_id: new_message.author_id,
            body: new_message.body,
            visible: true,
            created_at: Utc::now(),
        };
        self.message_repo.save_message(&message, None).await?;
        Ok(message.into())
    }
}
