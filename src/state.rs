use deadpool_postgres::Pool;
use chrono::Duration;
use std::sync::Arc;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crypto::{password::PasswordHasher, token::TokenCodec};
use crate::error::{AppError, Result};
use crate::middleware_layer::auth::RouteGuard;
use crate::repositories::user::{PgUserStore, UserStore};
use crate::services::session::{SessionManager, SessionPolicy};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The credential store.
    pub users: Arc<dyn UserStore>,
    /// Source of the current time.
    pub clock: Arc<dyn Clock>,
    /// Session issuance and verification.
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Creates a new `AppState` backed by PostgreSQL and the system clock.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db.clone()));

        Self::with_parts(config, db, users, Arc::new(SystemClock))
    }

    /// Assembles the state from explicit collaborators.
    ///
    /// Fails when the session secret is empty or the hashing parameters are
    /// invalid.
    pub fn with_parts(
        config: &Config,
        db: Pool,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let codec = TokenCodec::new(&config.session_secret)?;
        tracing::info!("✅ Session token codec initialized");

        let hasher = PasswordHasher::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            config.password_hash_parallelism,
        )?;

        let policy = SessionPolicy {
            ttl: lifetime(Duration::try_minutes(config.session_ttl_minutes))?,
            remember_me_ttl: lifetime(Duration::try_days(config.remember_me_days))?,
            renew_within: config
                .session_renew_within_minutes
                .map(|minutes| lifetime(Duration::try_minutes(minutes)))
                .transpose()?,
            secure_cookies: config.secure_cookies,
        };

        let sessions = Arc::new(SessionManager::new(
            codec,
            users.clone(),
            hasher,
            clock.clone(),
            policy,
        )?);
        tracing::info!("✅ Session manager initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            users,
            clock,
            sessions,
        })
    }

    /// The route guard configured for this state.
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(
            self.sessions.clone(),
            self.config.protected_prefixes.clone(),
            self.config.login_path.clone(),
        )
    }
}

fn lifetime(duration: Option<Duration>) -> Result<Duration> {
    duration
        .filter(|d| *d > Duration::zero())
        .ok_or_else(|| AppError::Config("Session lifetimes must be positive and in range".to_string()))
}
