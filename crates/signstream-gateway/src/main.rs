//! signstream gateway — WebSocket entry point for live sign recognition.
//!
//! One session per connection (`/ws/:client_id`, or `/ws` with a
//! server-assigned id), JSON messages in both directions, plus HTTP health
//! and info endpoints. A background sweep evicts idle sessions.

mod protocol;
mod ws;

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use signstream_core::{
    PipelineConfig, RefineConfig, RefinementOrchestrator, SessionConfig, SessionRegistry,
    SignClassifier,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub classifier: Arc<SignClassifier>,
    pub refiner: Arc<RefinementOrchestrator>,
    pub pipeline: PipelineConfig,
    pub sessions: SessionConfig,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pipeline = PipelineConfig::from_env();
    let sessions = SessionConfig::from_env();
    let refine = RefineConfig::from_env();

    let registry = Arc::new(SessionRegistry::new(pipeline.clone(), &sessions));
    let classifier = Arc::new(SignClassifier::new(pipeline.geometry.clone()));
    let refiner = Arc::new(RefinementOrchestrator::from_env(&refine));

    registry.clone().spawn_sweeper(sessions.sweep_interval());

    let state = AppState {
        registry,
        classifier,
        refiner,
        pipeline,
        sessions,
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/ws/:client_id", get(ws_handler_with_id))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let bind = std::env::var("SIGN_BIND").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = tokio::net::TcpListener::bind(&bind).await.unwrap();
    info!("Sign recognition gateway listening on {bind}");
    axum::serve(listener, app).await.unwrap();
}

/// Legacy endpoint without a client id; the registry assigns one and the
/// session dies with the connection.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws::handle_socket(socket, None, state))
}

async fn ws_handler_with_id(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws::handle_socket(socket, Some(client_id), state))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "lexicon_size": state.classifier.lexicon_size(),
        "active_sessions": state.registry.len(),
        "config": {
            "confidence_threshold": state.pipeline.confidence_threshold,
            "vote_window": state.pipeline.vote_window,
            "majority_ratio": state.pipeline.majority_ratio,
            "word_cooldown_secs": state.pipeline.word_cooldown_secs,
            "session_ttl_secs": state.sessions.ttl_secs,
        },
        "system_time": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "signstream",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Real-time WebSocket API for sign language recognition",
        "endpoints": {
            "health": "/health",
            "websocket": "/ws or /ws/{client_id}",
        },
        "features": {
            "real_time_recognition": true,
            "sentence_building": true,
            "llm_refinement": true,
            "temporal_smoothing": true,
        },
    }))
}
