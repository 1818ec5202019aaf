pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod form_data;
pub mod forms;
pub mod middleware;
pub mod pagination;
pub mod router;
pub mod routes;
pub mod state;

pub use router::build_router;
pub use state::AppState;
