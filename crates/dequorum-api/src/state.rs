use std::sync::Arc;
use dequorum_persist::ForumStore;
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Holds no per-request data; the requester travels through the extractors
/// in `auth` instead.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ForumStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ForumStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
