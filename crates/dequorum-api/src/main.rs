use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dequorum_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use dequorum_persist::{ForumStore, MemoryForumStore, MongoForumStore, MongoStoreOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Dequorum API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let store = connect_store(&config).await?;

    // Tags are never created by the handlers; make sure the configured ones exist
    if !config.forum.seed_tags.is_empty() {
        let tags = store.ensure_tags(&config.forum.seed_tags).await?;
        tracing::info!("Seeded {} tags", tags.len());
    }

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), store));

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn ForumStore>> {
    match config.storage.backend {
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let store = MongoForumStore::connect(
                &config.mongodb_uri,
                MongoStoreOptions {
                    database: config.mongodb.database.clone(),
                    pool_size: config.mongodb.pool_size,
                    timeout_ms: config.mongodb.timeout_ms,
                    transactions: config.mongodb.transactions,
                },
            )
            .await?;
            store.ping().await?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; nothing survives a restart");
            Ok(Arc::new(MemoryForumStore::new()))
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
