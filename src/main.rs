//! Storefront Categories Service
//!
//! Caches the storefront's per-language category listings in SQLite, keeps them fresh
//! against the upstream GraphQL API and serves ranked category search.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod remote;
mod search;
mod sync;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use config::Config;
use db::{CategoryStore, FallbackStore, MemoryCategoryStore, SqliteCategoryStore};
use remote::GraphQlClient;
use search::CategorySearch;
use sync::{BackgroundSyncManager, CategorySyncService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: CategorySyncService,
    pub search: Arc<CategorySearch>,
    pub background: Arc<BackgroundSyncManager>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services over a store and an upstream source.
    pub fn new(
        config: Config,
        store: Arc<dyn CategoryStore>,
        source: Arc<dyn remote::CategorySource>,
    ) -> Self {
        let sync = CategorySyncService::new(
            store.clone(),
            source,
            config.default_locale.clone(),
            config.max_pages,
        );
        let search = CategorySearch::new(store).with_min_length(config.search_min_length);
        let background = BackgroundSyncManager::new(sync.clone(), config.sync_interval);

        Self {
            sync,
            search: Arc::new(search),
            background: Arc::new(background),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Starting Storefront Categories Service");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Upstream endpoint: {}", config.graphql_url);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Default locale: {}-{}",
        config.default_locale.lang,
        config.default_locale.country
    );

    if config.graphql_api_key.is_none() {
        tracing::warn!("No upstream API key configured (STOREFRONT_GRAPHQL_API_KEY)");
    }

    let store = open_store(&config).await;
    let source = Arc::new(GraphQlClient::from_config(&config)?);
    let state = AppState::new(config.clone(), store, source);

    if config.background_sync {
        state.background.start();
    } else {
        tracing::info!("Background sync disabled at boot");
    }

    // Build router
    let app = create_router(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.background.stop().await;
    state.sync.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// SQLite behind a memory fallback, or memory alone when the database cannot be opened.
async fn open_store(config: &Config) -> Arc<dyn CategoryStore> {
    match db::init_database(&config.db_path).await {
        Ok(pool) => {
            let durable = Arc::new(SqliteCategoryStore::new(pool));
            Arc::new(FallbackStore::new(durable))
        }
        Err(e) => {
            tracing::warn!(
                "Could not open database at {:?}, caching in memory only: {}",
                config.db_path,
                e
            );
            Arc::new(MemoryCategoryStore::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Categories
        .route(
            "/categories",
            get(api::get_categories).delete(api::clear_categories),
        )
        .route("/categories/{lang}", get(api::get_language_categories))
        .route("/categories/{lang}/refresh", post(api::refresh_categories))
        .route("/categories/{lang}/{category}", get(api::get_category))
        .route("/languages", get(api::list_languages))
        // Search
        .route("/search", get(api::search_categories))
        // Background sync
        .route("/sync", get(api::get_sync_status))
        .route("/sync/start", post(api::start_sync))
        .route("/sync/stop", post(api::stop_sync))
        .route("/sync/sweep", post(api::run_sweep))
        .route("/sync/reset", post(api::reset_languages))
        .route("/sync/check/{lang}", get(api::check_language));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;
