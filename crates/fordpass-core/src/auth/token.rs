use chrono::{DateTime, Duration, Utc};

/// The access/refresh bearer token pair with independent expiry instants.
///
/// A token is valid only while `now < expires_at`; once expired it must be
/// replaced, never reused. Expiry instants are anchored at the time the
/// vendor's `expires_in` second counts were received.
#[derive(Debug, Clone)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Build token state from the vendor's `expires_in` / `refresh_expires_in`
    /// second counts, anchored at the current time.
    pub fn new(
        access_token: String,
        expires_in_secs: i64,
        refresh_token: String,
        refresh_expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token,
            refresh_token,
            access_expires_at: now + Duration::seconds(expires_in_secs),
            refresh_expires_at: now + Duration::seconds(refresh_expires_in_secs),
        }
    }

    pub fn is_access_expired(&self) -> bool {
        Utc::now() >= self.access_expires_at
    }

    pub fn is_refresh_expired(&self) -> bool {
        Utc::now() >= self.refresh_expires_at
    }

    /// Seconds until the access token expires (negative once expired).
    pub fn access_expires_in(&self) -> i64 {
        (self.access_expires_at - Utc::now()).num_seconds()
    }

    /// Seconds until the refresh token expires (negative once expired).
    pub fn refresh_expires_in(&self) -> i64 {
        (self.refresh_expires_at - Utc::now()).num_seconds()
    }

    /// Replace the access token after a successful refresh.
    pub fn rotate_access(&mut self, access_token: String, expires_in_secs: i64) {
        self.access_token = access_token;
        self.access_expires_at = Utc::now() + Duration::seconds(expires_in_secs);
    }

    /// Replace the refresh token when the vendor rotates it alongside a
    /// refresh response.
    pub fn rotate_refresh(&mut self, refresh_token: String, refresh_expires_in_secs: i64) {
        self.refresh_token = refresh_token;
        self.refresh_expires_at = Utc::now() + Duration::seconds(refresh_expires_in_secs);
    }
}
