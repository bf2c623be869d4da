use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

use crate::crypto::password::{ARGON2_ITERATIONS, ARGON2_MEMORY_MB, ARGON2_PARALLELISM};

/// Longest accepted regular session, one day.
pub const MAX_SESSION_TTL_MINUTES: i64 = 24 * 60;
/// Longest accepted "remember me" session.
pub const MAX_REMEMBER_ME_DAYS: i64 = 365;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The secret used to sign session tokens.
    pub session_secret: Zeroizing<Vec<u8>>,
    /// Lifetime of a regular session in minutes.
    pub session_ttl_minutes: i64,
    /// Lifetime of a "remember me" session in days.
    pub remember_me_days: i64,
    /// Only re-mint a session once less than this many minutes remain.
    /// `None` renews on every request.
    pub session_renew_within_minutes: Option<i64>,
    /// Whether cookies carry the `Secure` flag.
    pub secure_cookies: bool,
    /// Path prefixes that require a session.
    pub protected_prefixes: Vec<String>,
    /// Where unauthenticated requests to protected paths are sent.
    pub login_path: String,
    /// The address the server binds to.
    pub bind_addr: SocketAddr,
    /// Directory served for every path without a route.
    pub static_dir: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Argon2 memory cost in KiB.
    pub password_hash_memory_kib: u32,
    /// Argon2 iterations.
    pub password_hash_iterations: u32,
    /// Argon2 parallelism.
    pub password_hash_parallelism: u32,
    /// Seconds between replenished login/signup attempts per client IP.
    pub auth_rate_limit_per_second: u64,
    /// Login/signup attempts a client IP may burst.
    pub auth_rate_limit_burst: u32,
}

impl Config {
    /// A configuration with every optional setting at its default.
    pub fn new(database_url: impl Into<String>, session_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            database_url: database_url.into(),
            session_secret: Zeroizing::new(session_secret.into()),
            session_ttl_minutes: 30,
            remember_me_days: 7,
            session_renew_within_minutes: None,
            secure_cookies: false,
            protected_prefixes: vec!["/dashboard".to_string()],
            login_path: "/login".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: "public".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://[::1]:3000".to_string(),
            ],
            password_hash_memory_kib: ARGON2_MEMORY_MB * 1024,
            password_hash_iterations: ARGON2_ITERATIONS,
            password_hash_parallelism: ARGON2_PARALLELISM,
            auth_rate_limit_per_second: 2,
            auth_rate_limit_burst: 10,
        }
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`. Fails when `DATABASE_URL` or
    /// `SESSION_SECRET` is missing, or when any value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let session_secret = Zeroizing::new(
            env::var("SESSION_SECRET")
                .context("SESSION_SECRET must be set (generate with: openssl rand -hex 32)")?,
        );

        if session_secret.is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }

        if session_secret.len() < 32 {
            tracing::warn!("⚠️ SESSION_SECRET is shorter than 32 bytes");
        }

        let mut config = Self::new(
            env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            session_secret.as_bytes().to_vec(),
        );

        config.session_ttl_minutes = parse_var("SESSION_TTL_MINUTES", config.session_ttl_minutes)?;
        config.remember_me_days = parse_var("SESSION_REMEMBER_ME_DAYS", config.remember_me_days)?;
        config.session_renew_within_minutes = match env::var("SESSION_RENEW_WITHIN_MINUTES") {
            Ok(value) => Some(value.parse().context("Invalid SESSION_RENEW_WITHIN_MINUTES")?),
            Err(_) => None,
        };

        config.check_session_lifetimes()?;

        config.secure_cookies = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            == "production";

        if let Ok(prefixes) = env::var("PROTECTED_PREFIXES") {
            config.protected_prefixes = split_list(&prefixes);
        }
        if let Ok(login_path) = env::var("LOGIN_PATH") {
            config.login_path = login_path;
        }
        if let Ok(bind_addr) = env::var("BIND_ADDR") {
            config.bind_addr = bind_addr.parse().context("Invalid BIND_ADDR")?;
        }
        if let Ok(static_dir) = env::var("STATIC_DIR") {
            config.static_dir = static_dir;
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }

        config.password_hash_memory_kib =
            parse_var("PASSWORD_HASH_MEMORY_KIB", config.password_hash_memory_kib)?;
        config.password_hash_iterations =
            parse_var("PASSWORD_HASH_ITERATIONS", config.password_hash_iterations)?;
        config.password_hash_parallelism =
            parse_var("PASSWORD_HASH_PARALLELISM", config.password_hash_parallelism)?;
        config.auth_rate_limit_per_second =
            parse_var("AUTH_RATE_LIMIT_PER_SECOND", config.auth_rate_limit_per_second)?;
        config.auth_rate_limit_burst = parse_var("AUTH_RATE_LIMIT_BURST", config.auth_rate_limit_burst)?;

        Ok(config)
    }
}

impl Config {
    /// Rejects session lifetimes outside their supported ranges.
    ///
    /// The renewal window must be positive and no longer than the session
    /// TTL; a longer window is the same as renewing on every request.
    pub fn check_session_lifetimes(&self) -> Result<()> {
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.session_ttl_minutes) {
            anyhow::bail!(
                "SESSION_TTL_MINUTES must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            );
        }
        if !(1..=MAX_REMEMBER_ME_DAYS).contains(&self.remember_me_days) {
            anyhow::bail!(
                "SESSION_REMEMBER_ME_DAYS must be between 1 and {}",
                MAX_REMEMBER_ME_DAYS
            );
        }
        if let Some(window) = self.session_renew_within_minutes {
            if !(1..=self.session_ttl_minutes).contains(&window) {
                anyhow::bail!(
                    "SESSION_RENEW_WITHIN_MINUTES must be between 1 and SESSION_TTL_MINUTES ({})",
                    self.session_ttl_minutes
                );
            }
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value.trim().parse().with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_session_policy() {
        let config = Config::new("postgres://localhost/taskboard", b"secret".to_vec());
        assert_eq!(config.session_ttl_minutes, 30);
        assert_eq!(config.remember_me_days, 7);
        assert_eq!(config.session_renew_within_minutes, None);
        assert_eq!(config.protected_prefixes, ["/dashboard"]);
        assert_eq!(config.login_path, "/login");
        assert!(!config.secure_cookies);
    }

    #[test]
    fn session_lifetimes_are_bounded() {
        let mut config = Config::new("postgres://localhost/taskboard", b"secret".to_vec());
        assert!(config.check_session_lifetimes().is_ok());

        config.session_renew_within_minutes = Some(-5);
        assert!(config.check_session_lifetimes().is_err());
        config.session_renew_within_minutes = Some(0);
        assert!(config.check_session_lifetimes().is_err());
        config.session_renew_within_minutes = Some(31);
        assert!(config.check_session_lifetimes().is_err());
        config.session_renew_within_minutes = Some(10);
        assert!(config.check_session_lifetimes().is_ok());

        config.session_ttl_minutes = i64::MAX;
        assert!(config.check_session_lifetimes().is_err());
        config.session_ttl_minutes = 0;
        assert!(config.check_session_lifetimes().is_err());

        config.session_ttl_minutes = 30;
        config.remember_me_days = i64::MAX / 2;
        assert!(config.check_session_lifetimes().is_err());
    }

    #[test]
    fn lists_are_trimmed() {
        assert_eq!(split_list(" /dashboard, /settings ,,"), ["/dashboard", "/settings"]);
    }
}
