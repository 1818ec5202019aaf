pub mod dbs;
pub mod error;
pub mod filter;
pub mod models;
pub mod trait_client;

pub use models::{Message, NewMessage, NewThread, Tag, Thread, ThreadDetail};
pub use filter::ThreadFilter;
pub use trait_client::ForumStore;
pub use error::{PersistError, Result};
pub use dbs::memory::MemoryForumStore;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::{MongoForumStore, MongoStoreOptions};
