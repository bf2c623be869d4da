use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::Result,
    models::user::Principal,
    state::AppState,
    validation::forms::{JsonBody, validate},
};

/// Where clients go after a successful login or signup.
pub const AUTHENTICATED_HOME: &str = "/dashboard";

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[garde(length(min = 2, max = 255))]
    pub name: String,
    #[garde(email, length(max = 255))]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
    /// Issue a long-lived session instead of the default one.
    #[serde(default)]
    #[garde(skip)]
    pub remember_me: bool,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("remember_me", &self.remember_me)
            .finish_non_exhaustive()
    }
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

/// The response payload for session lookups.
#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user_id: Option<Uuid>,
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(mut payload): JsonBody<SignupRequest>,
) -> Result<Response> {
    payload.email = payload.email.trim().to_string();
    validate(&payload)?;

    let principal = state
        .sessions
        .signup(&cookies, &payload.name, &payload.email, &payload.password)
        .await?;

    let response = AuthResponse {
        success: true,
        message: "Registration successful. Welcome!".to_string(),
        redirect_to: Some(AUTHENTICATED_HOME.to_string()),
        user: Some(principal),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(mut payload): JsonBody<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt: {:?}", payload);
    payload.email = payload.email.trim().to_string();
    validate(&payload)?;

    let principal = state
        .sessions
        .login(&cookies, &payload.email, &payload.password, payload.remember_me)
        .await?;

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        redirect_to: Some(AUTHENTICATED_HOME.to_string()),
        user: Some(principal),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout. Succeeds whether or not a session existed.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Response {
    state.sessions.logout(&cookies);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
        redirect_to: Some(state.config.login_path.clone()),
        user: None,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Reports who the request's session belongs to, if anyone.
#[axum::debug_handler]
pub async fn session(State(state): State<AppState>, cookies: Cookies) -> Json<SessionResponse> {
    let user_id = state.sessions.current_principal_id(&cookies);

    Json(SessionResponse {
        authenticated: user_id.is_some(),
        user_id,
    })
}
