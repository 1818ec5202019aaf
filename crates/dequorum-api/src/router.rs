use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    docs::ApiDoc,
    middleware::logging,
    routes::{health, tags, threads},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Tags
        .route("/tags", get(tags::list_tags))
        // Threads
        .route("/threads", get(threads::list_threads))
        // A tag path with no segments left is the plain listing
        .route("/threads/tagged", get(threads::list_threads))
        .route("/threads/tagged/", get(threads::list_threads))
        .route("/threads/tagged/*path_tags", get(threads::list_tagged_threads))
        .route(
            "/threads/create",
            get(threads::create_thread_form).post(threads::create_thread),
        )
        .route(
            "/threads/:thread_id",
            get(threads::get_thread).post(threads::reply_to_thread),
        );

    // Build full router with middleware
    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(state.config.server.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            // Parse all origins and collect them
            let parsed_origins: Vec<axum::http::HeaderValue> = config.cors.origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        // No allowed origins: cross-origin requests get no CORS headers
        CorsLayer::new()
    }
}
