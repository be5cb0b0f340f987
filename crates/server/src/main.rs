use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use inference::HttpPredictionClient;
use server_api::ApiContext;
use storage::Storage;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{error, info, warn};

mod app_state;
mod config;
mod extract;
mod routes;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let mut api = ApiContext::new(storage);
    match settings.inference_url.as_deref() {
        Some(endpoint) => {
            let timeout = Duration::from_secs(settings.inference_timeout_secs);
            let client = HttpPredictionClient::with_timeout(endpoint, timeout)?;
            info!(endpoint = %client.endpoint(), "outbreak predictions enabled");
            api = api.with_predictor(Arc::new(client));
        }
        None => warn!("no inference endpoint configured; /alerts/predict will answer 503"),
    }

    let app = build_router(Arc::new(AppState::new(api)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/departments",
            get(routes::list_departments).post(routes::create_department),
        )
        .route(
            "/departments/:id",
            get(routes::get_department)
                .put(routes::update_department)
                .delete(routes::delete_department),
        )
        .route("/staff", get(routes::list_staff).post(routes::create_staff))
        .route(
            "/staff/:id",
            get(routes::get_staff)
                .put(routes::update_staff)
                .delete(routes::delete_staff),
        )
        .route("/beds", get(routes::list_beds).post(routes::create_bed))
        .route(
            "/beds/:id",
            get(routes::get_bed)
                .put(routes::update_bed)
                .delete(routes::delete_bed),
        )
        .route("/beds/:id/status", patch(routes::update_bed_status))
        .route(
            "/medicines",
            get(routes::list_medicines).post(routes::create_medicine),
        )
        .route(
            "/medicines/:id",
            get(routes::get_medicine)
                .put(routes::update_medicine)
                .delete(routes::delete_medicine),
        )
        .route(
            "/inventory",
            get(routes::list_inventory).post(routes::create_inventory),
        )
        .route(
            "/inventory/:id",
            get(routes::get_inventory)
                .put(routes::update_inventory)
                .delete(routes::delete_inventory),
        )
        .route(
            "/diseases",
            get(routes::list_diseases).post(routes::create_disease),
        )
        .route(
            "/diseases/:id",
            get(routes::get_disease)
                .put(routes::update_disease)
                .delete(routes::delete_disease),
        )
        .route("/alerts", get(routes::list_alerts))
        .route("/alerts/predict", post(routes::predict_alert))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

/// Pushes every change event to one dashboard until it disconnects.
async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    use futures::{SinkExt, StreamExt};
    use tokio::sync::broadcast::error::RecvError;

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "dashboard fell behind; dropping events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
