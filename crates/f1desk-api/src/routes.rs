//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use f1desk_core::error::AppError;

use crate::auth::require_admin;
use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Localhost on the served port plus any configured extra origins.
fn cors_layer(state: &AppState) -> CorsLayer {
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .into_iter()
    .chain(state.config.api.allowed_origins.iter().cloned())
    .filter_map(|origin| match origin.parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
            None
        }
    })
    .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);
    let limiter = RateLimiter::new(state.config.api.rate_limit_per_sec);

    let public_routes = Router::new().route("/health", get(handlers::health));

    let open_api_routes = Router::new()
        .route("/api/qa", get(handlers::list_qa))
        .route("/api/qa/{category}", get(handlers::qa_by_category))
        .route("/api/qa/entry/{id}", get(handlers::get_qa))
        .route("/api/categories", get(handlers::categories))
        .route("/api/advisors", get(handlers::advisors))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/analytics", get(handlers::list_analytics))
        .route("/api/analytics/top", get(handlers::top_questions))
        .route("/api/analytics/categories", get(handlers::category_totals))
        .route("/api/analytics/track", post(handlers::track_question))
        .route("/api/chat", post(handlers::chat))
        .route(
            "/api/chat/{session_id}",
            get(handlers::chat_transcript).delete(handlers::end_chat),
        );

    let admin_routes = Router::new()
        .route("/api/qa", post(handlers::create_qa))
        .route("/api/notifications", post(handlers::create_notification))
        .route("/api/admin/sessions", get(handlers::list_sessions))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    let api_routes = open_api_routes
        .merge(admin_routes)
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(limiter));

    public_routes
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.general.host, state.config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Server(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}
