//! Login, signup, logout and rolling renewal of cookie sessions.
//!
//! The session manager is the only component that writes the `session`
//! cookie. Tokens are self-contained; no session table exists.

use std::sync::Arc;

use chrono::Duration;
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::OffsetDateTime},
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    crypto::{
        password::PasswordHasher,
        token::{TokenCodec, TokenError},
    },
    error::{AppError, Result},
    models::{
        session::{SESSION_COOKIE, SessionClaims},
        user::{NewUser, Principal},
    },
    repositories::user::UserStore,
};

/// How long sessions live and when they are re-minted.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Lifetime of a regular session.
    pub ttl: Duration,
    /// Lifetime of a "remember me" session.
    pub remember_me_ttl: Duration,
    /// Renew only once the remaining lifetime is below this. `None` renews
    /// on every request.
    pub renew_within: Option<Duration>,
    /// Set the `Secure` flag on the cookie.
    pub secure_cookies: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(30),
            remember_me_ttl: Duration::days(7),
            renew_within: None,
            secure_cookies: false,
        }
    }
}

/// Issues, verifies, renews and clears cookie sessions.
pub struct SessionManager {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
    /// Verified against when the email is unknown, so that both login
    /// failures take the same time.
    dummy_hash: String,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    ///
    /// * `codec` - Signs and verifies tokens.
    /// * `users` - The credential store.
    /// * `hasher` - Hashes and verifies passwords.
    /// * `clock` - Source of the current time.
    /// * `policy` - Session lifetimes and renewal.
    pub fn new(
        codec: TokenCodec,
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
        policy: SessionPolicy,
    ) -> Result<Self> {
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            codec,
            users,
            hasher,
            clock,
            policy,
            dummy_hash,
        })
    }

    /// Checks an email/password pair and starts a session.
    ///
    /// Unknown email and wrong password fail identically with
    /// `AppError::InvalidCredentials`.
    pub async fn login(
        &self,
        cookies: &Cookies,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Principal> {
        let email = normalize_email(email);
        tracing::debug!("🔐 Authenticating user: {}", email);

        let user = self.users.find_by_email(&email).await?;

        let (hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let matches = self.verify_password(password, hash).await?;

        let user = match user {
            Some(user) if matches => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        let ttl = if remember_me {
            self.policy.remember_me_ttl
        } else {
            self.policy.ttl
        };
        self.issue(cookies, user.id, ttl)?;

        tracing::info!("✅ User logged in: {}", user.id);
        Ok(user.principal())
    }

    /// Creates an account and starts a session for it.
    pub async fn signup(
        &self,
        cookies: &Cookies,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal> {
        let email = normalize_email(email);
        tracing::debug!("📝 Creating user: {}", email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let password_hash = self.hash_password(password).await?;

        let user = self
            .users
            .insert(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        self.issue(cookies, user.id, self.policy.ttl)?;

        tracing::info!("✅ User created with ID: {}", user.id);
        Ok(user.principal())
    }

    /// Removes the session cookie. Does nothing if there is none.
    pub fn logout(&self, cookies: &Cookies) {
        self.clear(cookies);
        tracing::info!("👋 Session cookie cleared");
    }

    /// The principal of the request's session, if it has a valid one.
    pub fn current_principal_id(&self, cookies: &Cookies) -> Option<Uuid> {
        let cookie = cookies.get(SESSION_COOKIE)?;
        match self.verify(cookie.value()) {
            Ok(claims) => Some(claims.user_id),
            Err(e) => {
                tracing::debug!("Session cookie rejected: {}", e);
                None
            }
        }
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> std::result::Result<SessionClaims, TokenError> {
        let now = self.clock.now();
        self.codec.verify(token, now)
    }

    /// Extends a verified session.
    ///
    /// The new token keeps the principal and gets a fresh issue time. Its
    /// lifetime is the longer of the policy TTL and the old token's
    /// lifetime, so remember-me sessions stay long. With a renewal window
    /// configured, sessions that still have more time left than the window
    /// are returned unchanged.
    pub fn renew(&self, cookies: &Cookies, claims: &SessionClaims) -> Result<SessionClaims> {
        let now = self.clock.now();

        if let Some(window) = self.policy.renew_within {
            if claims.remaining(now) > window {
                return Ok(claims.clone());
            }
        }

        let ttl = std::cmp::max(self.policy.ttl, claims.ttl());
        let renewed = SessionClaims::issue(claims.user_id, now, ttl);
        self.write_cookie(cookies, &renewed)?;

        tracing::debug!("🔄 Session renewed for user: {}", claims.user_id);
        Ok(renewed)
    }

    /// Removes the session cookie from the response.
    pub fn clear(&self, cookies: &Cookies) {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookies.remove(cookie);
    }

    fn issue(&self, cookies: &Cookies, user_id: Uuid, ttl: Duration) -> Result<SessionClaims> {
        let claims = SessionClaims::issue(user_id, self.clock.now(), ttl);
        self.write_cookie(cookies, &claims)?;
        Ok(claims)
    }

    fn write_cookie(&self, cookies: &Cookies, claims: &SessionClaims) -> Result<()> {
        let token = self.codec.sign(claims)?;
        let expires = OffsetDateTime::from_unix_timestamp(claims.expires_at)
            .map_err(|e| AppError::Internal(format!("Session expiry out of range: {}", e)))?;

        let mut cookie = Cookie::new(SESSION_COOKIE, token);
        cookie.set_http_only(true);
        cookie.set_secure(self.policy.secure_cookies);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie.set_expires(expires);

        cookies.add(cookie);
        Ok(())
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))
    }
}

/// Lower-cases and trims an email address for lookup and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn default_policy_is_thirty_minutes_with_seven_day_option() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.ttl, Duration::minutes(30));
        assert_eq!(policy.remember_me_ttl, Duration::days(7));
        assert!(policy.renew_within.is_none());
    }
}
