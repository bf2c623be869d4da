use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// The signed payload of a session token.
///
/// Timestamps are unix seconds. Any field beyond these three makes the
/// payload invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    /// The principal this session belongs to.
    #[serde(rename = "sub")]
    pub user_id: Uuid,
    /// When the token was issued.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// When the token stops being accepted.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl SessionClaims {
    /// Claims for `user_id` issued at `now` and valid for `ttl`.
    pub fn issue(user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = now.timestamp();
        Self {
            user_id,
            issued_at,
            expires_at: issued_at + ttl.num_seconds(),
        }
    }

    /// The lifetime this token was issued with.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.expires_at - self.issued_at)
    }

    /// Time left before expiry, negative once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        Duration::seconds(self.expires_at - now.timestamp())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}
