use async_trait::async_trait;

use crate::error::Result;
use crate::filter::ThreadFilter;
use crate::models::{Message, NewMessage, NewThread, Tag, Thread, ThreadDetail};

/// Data access for the forum.
///
/// Every read goes through the visibility predicate: hidden threads and
/// hidden messages never leave the store through this trait.
#[async_trait]
pub trait ForumStore: Send + Sync {
    /// Cheap round trip used by the health check
    async fn ping(&self) -> Result<()>;

    /// Make sure a tag exists for every name, returning all of them
    async fn ensure_tags(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// All tags, ordered by name
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Resolve tag ids. Unknown or malformed ids are left out of the result.
    async fn get_tags(&self, ids: &[String]) -> Result<Vec<Tag>>;

    /// Number of visible threads passing `filter`
    async fn count_visible_threads(&self, filter: &ThreadFilter) -> Result<u64>;

    /// One window of visible threads passing `filter`, most recent first
    async fn list_visible_threads(
        &self,
        filter: &ThreadFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Thread>>;

    /// A visible thread with its visible messages in creation order
    async fn get_visible_thread_with_messages(&self, thread_id: &str) -> Result<Option<ThreadDetail>>;

    /// Create a thread and its opening message as one unit
    async fn create_thread(&self, new_thread: NewThread) -> Result<(Thread, Message)>;

    /// Append a message to a visible thread
    async fn create_message(&self, new_message: NewMessage) -> Result<Message>;
}
