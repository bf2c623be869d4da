use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::percent_decode_str;
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    models::session::{SESSION_COOKIE, SessionClaims},
    services::session::SessionManager,
};

/// Route protection settings plus the session manager the guard consults.
#[derive(Clone)]
pub struct RouteGuard {
    sessions: Arc<SessionManager>,
    protected_prefixes: Arc<[String]>,
    login_path: Arc<str>,
}

impl RouteGuard {
    /// Creates a new `RouteGuard`.
    ///
    /// # Arguments
    ///
    /// * `sessions` - Verifies and renews sessions.
    /// * `protected_prefixes` - Paths under these prefixes need a session.
    /// * `login_path` - Redirect target for unauthenticated requests.
    pub fn new(
        sessions: Arc<SessionManager>,
        protected_prefixes: impl IntoIterator<Item = String>,
        login_path: impl Into<String>,
    ) -> Self {
        let protected_prefixes = protected_prefixes
            .into_iter()
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .collect::<Vec<_>>();

        Self {
            sessions,
            protected_prefixes: protected_prefixes.into(),
            login_path: login_path.into().into(),
        }
    }

    /// Whether `path` is one of the protected prefixes or below one.
    ///
    /// Both the raw path and its resolved form are checked, so encoded or
    /// doubled-slash spellings of a protected path stay protected.
    pub fn is_protected(&self, path: &str) -> bool {
        self.matches_prefix(path) || self.matches_prefix(&resolve_path(path))
    }

    fn matches_prefix(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| {
            if prefix.is_empty() {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }

    fn redirect_to_login(&self) -> Response {
        Redirect::temporary(&self.login_path).into_response()
    }
}

/// The path as the static file fallback resolves it: percent-decoded, with
/// empty and `.` segments dropped and `..` applied.
fn resolve_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// A middleware run before every handler.
///
/// Valid sessions are renewed and their claims attached to the request.
/// Invalid cookies are removed. Protected paths without a valid session
/// are redirected to the login page and never reach their handler.
///
/// # Arguments
///
/// * `guard` - The route guard settings.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let protected = guard.is_protected(&path);

    let Some(token) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        if protected {
            tracing::debug!("❌ No session cookie for protected path {}", path);
            return guard.redirect_to_login();
        }
        return next.run(request).await;
    };

    let verified = guard.sessions.verify(&token).map_err(|e| {
        tracing::warn!("❌ Session rejected on {}: {}", path, e);
        AppError::from(e)
    });

    let renewed = verified.and_then(|claims| {
        guard.sessions.renew(&cookies, &claims).inspect_err(|e| {
            tracing::error!("❌ Session renewal failed: {}", e);
        })
    });

    match renewed {
        Ok(claims) => {
            tracing::debug!("✅ Session valid for user: {}", claims.user_id);
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(_) => {
            guard.sessions.clear(&cookies);
            if protected {
                guard.redirect_to_login()
            } else {
                next.run(request).await
            }
        }
    }
}

/// The session attached by the route guard.
///
/// Rejects with `401 Unauthorized` when the request carried no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::SystemClock, crypto::password::PasswordHasher, crypto::token::TokenCodec,
        repositories::memory::MemoryUserStore, services::session::SessionPolicy,
    };

    fn guard(prefixes: &[&str]) -> RouteGuard {
        let sessions = SessionManager::new(
            TokenCodec::new(b"guard-test-secret").unwrap(),
            Arc::new(MemoryUserStore::new()),
            PasswordHasher::new(1024, 1, 1).unwrap(),
            Arc::new(SystemClock),
            SessionPolicy::default(),
        )
        .unwrap();
        RouteGuard::new(
            Arc::new(sessions),
            prefixes.iter().map(|p| p.to_string()),
            "/login",
        )
    }

    #[test]
    fn protected_prefixes_match_whole_segments() {
        let guard = guard(&["/dashboard"]);
        assert!(guard.is_protected("/dashboard"));
        assert!(guard.is_protected("/dashboard/"));
        assert!(guard.is_protected("/dashboard/projects/42"));
        assert!(!guard.is_protected("/dashboards"));
        assert!(!guard.is_protected("/login"));
        assert!(!guard.is_protected("/"));
        assert!(!guard.is_protected("/api/projects"));
    }

    #[test]
    fn alternate_spellings_of_protected_paths_are_protected() {
        let guard = guard(&["/dashboard"]);
        assert!(guard.is_protected("/%64ashboard/index.html"));
        assert!(guard.is_protected("//dashboard/index.html"));
        assert!(guard.is_protected("/./dashboard"));
        assert!(guard.is_protected("/public/../dashboard/index.html"));
        assert!(guard.is_protected("/dashboard%2Findex.html"));
        assert!(!guard.is_protected("/%2564ashboard"));
        assert!(!guard.is_protected("//dashboards"));
    }

    #[test]
    fn paths_resolve_like_the_static_fallback() {
        assert_eq!(resolve_path("//a/./b//c/"), "/a/b/c");
        assert_eq!(resolve_path("/a/../../b"), "/b");
        assert_eq!(resolve_path("/%61%2Fb"), "/a/b");
        assert_eq!(resolve_path(""), "/");
    }

    #[test]
    fn trailing_slash_in_configuration_is_ignored() {
        let guard = guard(&["/dashboard/", "/settings"]);
        assert!(guard.is_protected("/dashboard/tasks"));
        assert!(guard.is_protected("/settings"));
    }
}
