use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use http::{HeaderValue, Method, header};
use tower_cookies::CookieManagerLayer;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::{AppError, Result},
    handlers,
    middleware_layer::auth::route_guard,
    state::AppState,
};

/// Builds the complete router: routes, route guard, cookies, tracing, CORS.
///
/// The server must be run with `into_make_service_with_connect_info::<SocketAddr>()`
/// so that the credential endpoints can be rate limited per client IP.
pub fn build_app(state: AppState) -> Result<Router> {
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.auth_rate_limit_per_second)
            .burst_size(state.config.auth_rate_limit_burst)
            .use_headers()
            .finish()
            .ok_or_else(|| AppError::Config("Invalid auth rate limit configuration".to_string()))?,
    );

    let credential_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(GovernorLayer::new(auth_governor_conf))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session", get(handlers::auth::session))
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route(
            "/api/projects",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/api/projects/{project_id}",
            get(handlers::projects::get_project).delete(handlers::projects::delete_project),
        )
        .route(
            "/api/projects/{project_id}/board",
            get(handlers::projects::project_board),
        )
        .route(
            "/api/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/api/tasks/{task_id}",
            patch(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
        )
        .with_state(state.clone());

    let origins = state
        .config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| AppError::Config(format!("Invalid CORS origin {}: {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let app = Router::new()
        .merge(credential_routes)
        .merge(session_routes)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(from_fn_with_state(state.route_guard(), route_guard))
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors);

    Ok(app)
}

/// Turns a handler panic into the JSON `internal` error response.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = err.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}
