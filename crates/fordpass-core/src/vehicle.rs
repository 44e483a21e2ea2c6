//! The `Vehicle` session object: token lifecycle, status queries, and remote
//! commands with their completion poll loop.

use std::time::Duration;

use anyhow::Result;
use reqwest::Method;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::TokenState;
use crate::models::{CommandStatus, VehicleStatus};

// ============================================================================
// Constants
// ============================================================================

/// Seconds between command status polls, matching the vendor app's cadence
const POLL_INTERVAL_SECS: u64 = 5;

/// Maximum number of status polls before a command is considered stuck.
/// 36 polls at 5 seconds bounds every command at three minutes.
const MAX_COMMAND_POLLS: u32 = 36;

/// What `ensure_valid_token` has to do for the current token state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenAction {
    /// No token, or the refresh token has expired: full re-authentication
    FullAuth,
    /// Only the access token has expired: lightweight refresh
    Refresh,
    /// Both tokens still valid
    None,
}

fn token_action(tokens: Option<&TokenState>) -> TokenAction {
    match tokens {
        None => TokenAction::FullAuth,
        Some(t) if t.is_refresh_expired() => TokenAction::FullAuth,
        Some(t) if t.is_access_expired() => TokenAction::Refresh,
        Some(_) => TokenAction::None,
    }
}

/// Whether another poll follows this attempt; the final pending poll must
/// give up without a trailing wait.
fn polls_remaining(attempt: u32) -> bool {
    attempt < MAX_COMMAND_POLLS
}

/// A Ford vehicle session: credentials, VIN, and cached token state.
///
/// Tokens live for the lifetime of the process and are replaced in place as
/// they expire. Methods take `&mut self`; the type is not designed for
/// concurrent callers.
pub struct Vehicle {
    client: ApiClient,
    username: String,
    password: String,
    vin: String,
    tokens: Option<TokenState>,
}

impl Vehicle {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        vin: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new()?,
            username: username.into(),
            password: password.into(),
            vin: vin.into(),
            tokens: None,
        })
    }

    /// Make sure the access token is usable: re-authenticate when there is
    /// no token or the refresh token has expired, refresh when only the
    /// access token has, otherwise do nothing.
    pub async fn ensure_valid_token(&mut self) -> Result<()> {
        match token_action(self.tokens.as_ref()) {
            TokenAction::FullAuth => {
                info!("no token, or refresh token has expired, requesting new token");
                let tokens = self.client.authenticate(&self.username, &self.password).await?;
                self.tokens = Some(tokens);
            }
            TokenAction::Refresh => {
                if let Some(tokens) = self.tokens.as_mut() {
                    let refreshed = self.client.refresh(&tokens.refresh_token).await?;
                    info!(
                        expires_in = refreshed.expires_in,
                        "successfully refreshed access token"
                    );
                    tokens.rotate_access(refreshed.access_token, refreshed.expires_in);
                    if let (Some(token), Some(expires_in)) =
                        (refreshed.refresh_token, refreshed.refresh_expires_in)
                    {
                        debug!("vendor rotated the refresh token");
                        tokens.rotate_refresh(token, expires_in);
                    }
                }
            }
            TokenAction::None => {
                if let Some(tokens) = self.tokens.as_ref() {
                    debug!(
                        access_expires_in = tokens.access_expires_in(),
                        refresh_expires_in = tokens.refresh_expires_in(),
                        "token is valid, continuing"
                    );
                }
            }
        }
        Ok(())
    }

    /// Get the status of the vehicle.
    pub async fn status(&mut self) -> Result<VehicleStatus> {
        self.ensure_valid_token().await?;
        let token = self.access_token()?;
        self.client.vehicle_status(&self.vin, &token).await
    }

    /// Issue a start command to the engine.
    pub async fn start(&mut self) -> Result<bool> {
        self.request_and_poll(Method::PUT, "engine/start").await
    }

    /// Issue a stop command to the engine.
    pub async fn stop(&mut self) -> Result<bool> {
        self.request_and_poll(Method::DELETE, "engine/start").await
    }

    /// Issue a lock command to the doors.
    pub async fn lock(&mut self) -> Result<bool> {
        self.request_and_poll(Method::PUT, "doors/lock").await
    }

    /// Issue an unlock command to the doors.
    pub async fn unlock(&mut self) -> Result<bool> {
        self.request_and_poll(Method::DELETE, "doors/lock").await
    }

    /// Issue a command and poll its status sub-endpoint until it reaches a
    /// terminal state. Returns whether the command completed successfully.
    async fn request_and_poll(&mut self, method: Method, endpoint: &str) -> Result<bool> {
        self.ensure_valid_token().await?;
        let token = self.access_token()?;

        let url = ApiClient::command_url(&self.vin, endpoint);
        let command = self.client.issue_command(method, &url, &token).await?;
        info!(
            command_id = %command.command_id,
            endpoint,
            "command accepted, polling for completion"
        );

        for attempt in 1..=MAX_COMMAND_POLLS {
            let status = self
                .client
                .poll_command(&url, &command.command_id, &token)
                .await?;

            if status.is_terminal() {
                if let CommandStatus::Failed(code) = status {
                    warn!(code, "command failed");
                } else {
                    info!("command completed successfully");
                }
                return Ok(status.succeeded());
            }

            debug!(attempt, "command is pending");
            if polls_remaining(attempt) {
                sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
            }
        }

        Err(ApiError::CommandTimedOut.into())
    }

    fn access_token(&self) -> Result<String> {
        self.tokens
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| anyhow::Error::new(ApiError::Unauthorized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn state(access_in_secs: i64, refresh_in_secs: i64) -> TokenState {
        let now = Utc::now();
        TokenState {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            access_expires_at: now + Duration::seconds(access_in_secs),
            refresh_expires_at: now + Duration::seconds(refresh_in_secs),
        }
    }

    #[test]
    fn test_missing_token_forces_full_auth() {
        assert_eq!(token_action(None), TokenAction::FullAuth);
    }

    #[test]
    fn test_expired_refresh_forces_full_auth() {
        // Even with a live access token, an expired refresh token means the
        // session cannot be extended and must be rebuilt
        assert_eq!(token_action(Some(&state(300, -1))), TokenAction::FullAuth);
        assert_eq!(token_action(Some(&state(-10, -1))), TokenAction::FullAuth);
    }

    #[test]
    fn test_expired_access_triggers_refresh() {
        assert_eq!(token_action(Some(&state(-1, 3600))), TokenAction::Refresh);
    }

    #[test]
    fn test_valid_tokens_are_left_alone() {
        assert_eq!(token_action(Some(&state(300, 3600))), TokenAction::None);
    }

    #[test]
    fn test_no_wait_after_final_poll() {
        assert!(polls_remaining(1));
        assert!(polls_remaining(MAX_COMMAND_POLLS - 1));
        assert!(!polls_remaining(MAX_COMMAND_POLLS));
    }

    #[test]
    fn test_vehicle_starts_without_tokens() {
        let vehicle = Vehicle::new("user@example.com", "pw", "WX231231232")
            .expect("Failed to build vehicle");
        assert!(vehicle.tokens.is_none());
        assert!(vehicle.access_token().is_err());
    }
}
