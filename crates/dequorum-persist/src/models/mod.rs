mod db_message;
mod db_tag;
mod db_thread;

// Export database-agnostic models
pub use db_message::{Message, NewMessage};
pub use db_tag::Tag;
pub use db_thread::{NewThread, Thread, ThreadDetail};
