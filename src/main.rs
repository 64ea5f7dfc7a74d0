//! flag-quiz-back binary entrypoint wiring the HTTP surface, the storage
//! supervisor, and the country pool ingestion.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flag_quiz_back::{
    config::AppConfig,
    routes,
    services::pool_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let state = AppState::new(config);

    configure_storage(&state);
    tokio::spawn(pool_supervisor::run(state.clone()));

    let app = build_router(state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(5000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick a storage backend: MongoDB when `MONGO_URI` is set, the in-process
/// store otherwise.
fn configure_storage(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    {
        if let Ok(uri) = env::var("MONGO_URI") {
            spawn_mongo_supervisor(state.clone(), uri, env::var("MONGO_DB").ok());
            return;
        }
    }

    install_fallback_store(state);
}

/// Supervise a MongoDB-backed store, reconnecting in the background.
#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState, uri: String, db_name: Option<String>) {
    use std::sync::Arc;

    use flag_quiz_back::dao::score_store::{
        ScoreStore,
        mongodb::{MongoConfig, MongoScoreStore},
    };
    use flag_quiz_back::services::storage_supervisor;

    let connect = move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoScoreStore::connect(config).await?;
            Ok(Arc::new(store) as Arc<dyn ScoreStore>)
        }
    };

    tokio::spawn(storage_supervisor::run(state, connect));
}

/// Install the in-process store so the leaderboard works without a database.
#[cfg(feature = "mem-store")]
fn install_fallback_store(state: &SharedState) {
    use std::sync::Arc;

    use flag_quiz_back::dao::score_store::memory::MemoryScoreStore;

    info!("no MongoDB configured; using the in-process score store");
    let state = state.clone();
    tokio::spawn(async move {
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
    });
}

/// Without any storage backend compiled in, the leaderboard stays degraded.
#[cfg(not(feature = "mem-store"))]
fn install_fallback_store(_state: &SharedState) {
    tracing::warn!("no storage backend configured; leaderboard runs degraded");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
