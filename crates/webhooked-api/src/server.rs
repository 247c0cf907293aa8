//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Security headers
//! 3. CORS handling
//! 4. Request/response logging
//! 5. Timeout enforcement (`REQUEST_TIMEOUT`)
//! 6. API key check (hook creation only)
//! 7. Handler execution
//!
//! Swagger UI is served at `/docs`, backed by `/api/openapi.json`.
//!
//! # Graceful Shutdown
//!
//! On SIGTERM or CTRL+C the server stops accepting connections and waits for
//! in-flight requests before returning.

use std::net::SocketAddr;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::{
    handlers,
    middleware::{auth::auth_middleware, security_headers::with_security_headers},
    openapi::{ApiDoc, DOCS_PATH, OPENAPI_JSON_PATH},
    AppState,
};

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use webhooked_api::{create_router, AppState, Config};
/// use webhooked_core::{RealClock, Storage};
///
/// let clock = Arc::new(RealClock::new());
/// let state = AppState::new(Storage::in_memory(clock.clone()), Config::default(), clock);
/// let app = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    let health_routes = Router::new()
        .route("/api/healthcheck/liveness", get(handlers::health::liveness))
        .route("/api/healthcheck/readiness", get(handlers::health::readiness));

    let hook_routes = Router::new()
        .route(
            "/api/hooks",
            post(handlers::hooks::create_hook)
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .get(handlers::hooks::list_hooks),
        )
        .route("/api/hooks/{id}", get(handlers::hooks::get_hook))
        .route("/api/hooks/{hook_id}/webhooks", get(handlers::webhooks::list_webhooks))
        .route(
            "/api/hooks/{hook_id}/webhooks/receive",
            get(handlers::receive::receive_webhook)
                .post(handlers::receive::receive_webhook)
                .put(handlers::receive::receive_webhook)
                .patch(handlers::receive::receive_webhook)
                .delete(handlers::receive::receive_webhook)
                .head(handlers::receive::receive_webhook),
        );

    let router = Router::new()
        .merge(health_routes)
        .merge(hook_routes)
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive());

    with_security_headers(router).layer(middleware::from_fn(inject_request_id)).with_state(state)
}

/// Middleware to inject request ID into all responses.
///
/// Adds X-Request-Id header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or serving fails.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
