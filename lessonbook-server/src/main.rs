use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use lessonbook::{
    backend::StoreBackendBuilder,
    memory::InMemoryStore,
    mongodb::MongoDbStore,
    store::DocumentStore,
};
use lessonbook_server::{
    app,
    config::{AppConfig, BackendKind},
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lessonbook_server=debug,lessonbook_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let registry = config.registry();
    registry.validate().context("invalid collection registration")?;

    let store = match config.store.backend() {
        BackendKind::Mongodb => {
            let dsn = config
                .store
                .connection_string
                .as_deref()
                .context("store.connection_string is required for the mongodb backend")?;

            let backend = MongoDbStore::builder(dsn, &config.store.database)
                .timeout(config.store.timeout())
                .build()
                .await
                .context("failed to connect to MongoDB")?;

            DocumentStore::new(backend, registry)
        }
        BackendKind::Memory => {
            tracing::warn!("no connection string configured, using the in-memory store");

            let store = DocumentStore::new(InMemoryStore::new(), registry);
            store.ensure_collections().await?;
            store
        }
    };

    let store = Arc::new(store);
    store.ping().await.context("store is unreachable")?;

    let app = app(AppState::new(Arc::clone(&store), config.store.timeout()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");

    if let Ok(store) = Arc::try_unwrap(store) {
        store.shutdown().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
