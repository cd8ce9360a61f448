use crate::config::ServerConfig;
use crate::parser::FightParser;
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<FightParser>,
    pub metrics: Option<PrometheusHandle>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Fight results API is running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Scrapes the source page on every request
async fn get_fights(State(state): State<AppState>) -> Response {
    info!("Received request for fight data");

    match state.parser.parse_fights().await {
        Ok(fights) if fights.is_empty() => {
            info!("No fight data found, returning empty result");
            Json(json!({
                "message": "No fight data available",
                "data": [],
                "count": 0
            }))
            .into_response()
        }
        Ok(fights) => {
            info!("Successfully retrieved {} fights from parser", fights.len());
            Json(json!({
                "message": "Fight data retrieved successfully",
                "count": fights.len(),
                "data": fights,
                "source": state.parser.source_url()
            }))
            .into_response()
        }
        Err(e) => {
            error!("Error parsing fights: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to parse fight data",
                    "message": "Unable to retrieve fight information at this time",
                    "details": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

/// Create the HTTP router: JSON API under `/api`, static frontend files,
/// and permissive CORS.
pub fn create_server(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/fights", get(get_fights))
        .route("/metrics", get(render_metrics))
        .nest_service("/static", ServeDir::new(static_dir))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(cors))
}

/// Serve on an already bound listener until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    listener.set_nonblocking(true)?;
    Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Bind the configured address and serve until shutdown.
pub async fn start_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)?;
    let app = create_server(state, &config.static_dir);

    info!("HTTP server running on http://{}", addr);
    info!("API endpoints available at: http://{}/api/", addr);
    info!("Web interface available at: http://{}/", addr);

    serve(listener, app).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
