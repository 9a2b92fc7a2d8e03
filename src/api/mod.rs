use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::Result;
use crate::scheduler::format_timestamp;
use crate::service::DisplayService;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<DisplayService>,
}

#[derive(Serialize)]
struct SwitchResponse {
    success: bool,
}

#[derive(Serialize)]
struct TimedOnResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn_off_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ScheduledResponse {
    scheduled_time: Option<String>,
    remaining_seconds: Option<u64>,
    on_duration_seconds: u64,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/displays/on", post(turn_on_handler))
        .route("/api/displays/off", post(turn_off_handler))
        .route("/api/displays/on-1h", post(turn_on_timed_handler))
        .route("/api/displays/scheduled", get(scheduled_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind control API");
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "Serving display control API");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Display control API stopped");
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn turn_on_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let success = state.service.turn_on().await;
    Json(SwitchResponse { success })
}

async fn turn_off_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let success = state.service.turn_off().await;
    Json(SwitchResponse { success })
}

async fn turn_on_timed_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match state.service.turn_on_timed().await {
        Ok(fire_at) => Json(TimedOnResponse {
            success: true,
            turn_off_time: Some(format_timestamp(&fire_at)),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Timed turn-on rejected");
            Json(TimedOnResponse {
                success: false,
                turn_off_time: None,
                error: Some(e.to_string()),
            })
        }
    }
}

async fn scheduled_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let pending = state.service.scheduler().pending().await;

    Json(ScheduledResponse {
        scheduled_time: pending.as_ref().map(|(fire_at, _)| format_timestamp(fire_at)),
        remaining_seconds: pending.map(|(_, remaining)| remaining.as_secs()),
        on_duration_seconds: state.service.on_duration().as_secs(),
    })
}
