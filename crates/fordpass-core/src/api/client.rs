//! Low-level client for the FordPass HTTP API.
//!
//! This module owns the fixed vendor endpoints, headers and client ids, the
//! SSO web-login flow (PKCE authorize, credential form, redirect chase, code
//! exchange), token refresh, and the raw status/command requests. Token
//! lifecycle decisions and the command poll loop live in
//! [`crate::vehicle::Vehicle`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use reqwest::{header, redirect, Client, Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::pkce;
use crate::auth::TokenState;
use crate::models::{CommandResponse, CommandStatus, VehicleStatus};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the vehicle API (status and commands)
const API_BASE_URL: &str = "https://usapi.cv.ford.com";

/// Base URL for the SSO login pages
const SSO_BASE_URL: &str = "https://sso.ci.ford.com";

/// OIDC token endpoint for the authorization-code exchange
const SSO_TOKEN_URL: &str = "https://sso.ci.ford.com/oidc/endpoint/default/token";

/// Exchanges the CI token for the API access/refresh token pair
const ACCESS_TOKEN_URL: &str = "https://api.mps.ford.com/api/token/v2/cat-with-ci-access-token";

/// Refreshes the access token using the stored refresh token
const TOKEN_REFRESH_URL: &str = "https://api.mps.ford.com/api/token/v2/cat-with-refresh-token";

/// OAuth client id of the FordPass mobile app
const CLIENT_ID: &str = "9fb503e0-715b-47e8-adfd-ad4b7770f73b";

/// Application id the vehicle API expects on every call
const APPLICATION_ID: &str = "1E8C7794-FF5F-49BC-9596-A1E0C86C5B19";

/// Redirect URI registered for the mobile app; the final login redirect
/// lands on this scheme carrying the authorization code
const REDIRECT_URI: &str = "fordapp://userauthorized";

/// User agent of the FordPass iOS app; the SSO pages reject unknown agents
const USER_AGENT: &str = "FordPass/5 CFNetwork/1333.0.4 Darwin/21.5.0";

/// HTTP request timeout in seconds.
/// 30s allows for slow vendor responses while still failing fast.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Marker attribute carrying the login form action URL in the authorize page
const LOGIN_URL_MARKER: &str = "data-ibm-login-url=\"";

// ============================================================================
// Raw response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CiTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: String,
    refresh_expires_in: i64,
}

/// Refresh response. The vendor sometimes rotates the refresh token
/// alongside the new access token, so those fields are optional.
#[derive(Debug, Deserialize)]
pub struct TokenRefresh {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    #[serde(rename = "vehiclestatus")]
    vehicle_status: VehicleStatus,
}

#[derive(Debug, Deserialize)]
struct PollStatusResponse {
    status: i64,
}

/// API client for the FordPass endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self { client })
    }

    // ===== Authentication =====

    /// Run the full SSO login flow and return a fresh token pair.
    ///
    /// The flow mirrors what the FordPass app does in its embedded browser:
    /// load the authorize page (cookies matter), submit the credential form,
    /// chase two redirects to the `fordapp://` callback, exchange the
    /// authorization code for a CI token, then trade that for the API
    /// access/refresh pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenState> {
        // Fresh cookie jar per login attempt, shared between a
        // redirect-following client and one that lets us read Location
        // headers ourselves.
        let jar = Arc::new(Jar::default());
        let browser = sso_client(jar.clone(), true)?;
        let no_redirect = sso_client(jar, false)?;

        let (verifier, challenge) = pkce::generate_pair();
        let authorize_url = build_authorize_url(&challenge);

        debug!("loading authorize page");
        let response = browser
            .get(&authorize_url)
            .headers(default_headers())
            .send()
            .await
            .context("Failed to load the authorize page")?;
        let response = Self::check_response(response).await?;
        let html = response
            .text()
            .await
            .context("Failed to read the authorize page")?;

        let login_url = extract_login_url(&html).ok_or_else(|| {
            anyhow::Error::new(ApiError::AuthFlow(
                "login form URL not found in authorize page".into(),
            ))
        })?;

        debug!("submitting credentials");
        let form = [
            ("operation", "verify"),
            ("login-form-type", "pwd"),
            ("username", username),
            ("password", password),
        ];
        let response = no_redirect
            .post(&login_url)
            .headers(default_headers())
            .form(&form)
            .send()
            .await
            .context("Failed to submit the login form")?;
        let location = require_redirect(&response, "login form")?;

        let response = no_redirect
            .get(&location)
            .headers(default_headers())
            .send()
            .await
            .context("Failed to follow the login redirect")?;
        let callback = require_redirect(&response, "login redirect")?;
        let (code, grant_id) = extract_callback_params(&callback)?;

        debug!("exchanging authorization code");
        let form = [
            ("client_id", CLIENT_ID),
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_id", grant_id.as_str()),
            ("code_verifier", verifier.as_str()),
        ];
        let response = browser
            .post(SSO_TOKEN_URL)
            .headers(default_headers())
            .form(&form)
            .send()
            .await
            .context("Failed to exchange the authorization code")?;
        let response = Self::check_response(response).await?;
        let ci: CiTokenResponse = response
            .json()
            .await
            .context("Failed to parse the code exchange response")?;
        info!("successfully fetched CI token");

        debug!("requesting access token");
        let response = self
            .client
            .post(ACCESS_TOKEN_URL)
            .headers(api_headers(None)?)
            .json(&serde_json::json!({ "ciToken": ci.access_token }))
            .send()
            .await
            .context("Failed to request the access token")?;
        let response = Self::check_response(response).await?;
        let tokens: TokenExchangeResponse = response
            .json()
            .await
            .context("Failed to parse the token response")?;
        info!(
            expires_in = tokens.expires_in,
            refresh_expires_in = tokens.refresh_expires_in,
            "successfully fetched access and refresh tokens"
        );

        Ok(TokenState::new(
            tokens.access_token,
            tokens.expires_in,
            tokens.refresh_token,
            tokens.refresh_expires_in,
        ))
    }

    /// Fetch a new access token using the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRefresh> {
        info!("refreshing access token");
        let response = self
            .client
            .post(TOKEN_REFRESH_URL)
            .headers(api_headers(None)?)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("Failed to send the token refresh request")?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse the token refresh response")
    }

    // ===== Vehicle API =====

    /// Fetch the current status payload for a vehicle.
    pub async fn vehicle_status(&self, vin: &str, token: &str) -> Result<VehicleStatus> {
        let url = format!("{API_BASE_URL}/api/vehicles/v4/{vin}/status");
        let response = self
            .client
            .get(&url)
            .headers(api_headers(Some(token))?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {url}"))?;
        let response = Self::check_response(response).await?;
        let envelope: StatusEnvelope = response
            .json()
            .await
            .context("Failed to parse the vehicle status response")?;
        Ok(envelope.vehicle_status)
    }

    /// Build the command URL for a vehicle sub-endpoint (`doors/lock`,
    /// `engine/start`). The same URL is polled for completion.
    pub(crate) fn command_url(vin: &str, endpoint: &str) -> String {
        format!("{API_BASE_URL}/api/vehicles/v5/{vin}/{endpoint}")
    }

    /// Issue a remote command request and return its command id.
    pub async fn issue_command(
        &self,
        method: Method,
        url: &str,
        token: &str,
    ) -> Result<CommandResponse> {
        debug!(method = %method, url, "issuing command request");
        let response = self
            .client
            .request(method, url)
            .headers(api_headers(Some(token))?)
            .send()
            .await
            .with_context(|| format!("Failed to send command request to {url}"))?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse the command response")
    }

    /// Poll a command's status sub-endpoint once and classify the result.
    pub async fn poll_command(
        &self,
        url: &str,
        command_id: &str,
        token: &str,
    ) -> Result<CommandStatus> {
        let poll_url = format!("{url}/{command_id}");
        let response = self
            .client
            .get(&poll_url)
            .headers(api_headers(Some(token))?)
            .send()
            .await
            .with_context(|| format!("Failed to poll command status at {poll_url}"))?;
        let response = Self::check_response(response).await?;
        let poll: PollStatusResponse = response
            .json()
            .await
            .context("Failed to parse the command status response")?;
        Ok(CommandStatus::from_code(poll.status))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

// ============================================================================
// Flow helpers
// ============================================================================

/// Build an SSO client sharing the login cookie jar.
fn sso_client(jar: Arc<Jar>, follow_redirects: bool) -> Result<Client> {
    let mut builder = Client::builder()
        .cookie_provider(jar)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
    if !follow_redirects {
        builder = builder.redirect(redirect::Policy::none());
    }
    builder.build().context("Failed to build the SSO HTTP client")
}

/// The authorize URL with the fixed client id and PKCE challenge. The vendor
/// expects the challenge with an explicit percent-encoded `=` pad.
fn build_authorize_url(code_challenge: &str) -> String {
    format!(
        "{SSO_BASE_URL}/v1.0/endpoint/default/authorize\
         ?redirect_uri={REDIRECT_URI}\
         &response_type=code\
         &scope=openid\
         &max_age=3600\
         &client_id={CLIENT_ID}\
         &code_challenge={code_challenge}%3D\
         &code_challenge_method=S256"
    )
}

/// Scrape the login form action URL out of the authorize page HTML.
fn extract_login_url(html: &str) -> Option<String> {
    let start = html.find(LOGIN_URL_MARKER)? + LOGIN_URL_MARKER.len();
    let end = html[start..].find('"')? + start;
    Some(format!("{}{}", SSO_BASE_URL, &html[start..end]))
}

/// Require a 302 and return its Location header.
fn require_redirect(response: &reqwest::Response, step: &str) -> Result<String> {
    if response.status() != StatusCode::FOUND {
        return Err(ApiError::AuthFlow(format!(
            "expected a redirect from the {step}, got {}",
            response.status()
        ))
        .into());
    }
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::Error::new(ApiError::AuthFlow(format!(
                "missing Location header after the {step}"
            )))
        })
}

/// Pull `code` and `grant_id` out of the `fordapp://` callback URL.
fn extract_callback_params(callback_url: &str) -> Result<(String, String)> {
    let url = reqwest::Url::parse(callback_url).map_err(|e| {
        ApiError::AuthFlow(format!("unparseable callback URL: {e}"))
    })?;

    let mut code = None;
    let mut grant_id = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "grant_id" => grant_id = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, grant_id) {
        (Some(code), Some(grant_id)) => Ok((code, grant_id)),
        _ => Err(ApiError::AuthFlow("callback URL missing code or grant_id".into()).into()),
    }
}

/// Headers the SSO pages expect from the mobile app's embedded browser.
fn default_headers() -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("en-US"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        header::HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
    headers
}

/// API headers: JSON content type, the fixed application id, and the current
/// access token when one is attached.
fn api_headers(token: Option<&str>) -> Result<header::HeaderMap> {
    let mut headers = default_headers();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert("Application-Id", header::HeaderValue::from_static(APPLICATION_ID));
    if let Some(token) = token {
        headers.insert("auth-token", header::HeaderValue::from_str(token)?);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_authorize_url() {
        let url = build_authorize_url("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
        assert!(url.starts_with("https://sso.ci.ford.com/v1.0/endpoint/default/authorize?"));
        assert!(url.contains("client_id=9fb503e0-715b-47e8-adfd-ad4b7770f73b"));
        assert!(url.contains("redirect_uri=fordapp://userauthorized"));
        // Challenge carries the percent-encoded pad the vendor expects
        assert!(url.contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM%3D"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_extract_login_url() {
        let html = r#"<html><body>
            <div id="login" data-ibm-login-url="/authsvc/mtfim/sps/authsvc?PolicyId=urn:ibm:security:authentication:asf:basicldapuser&identity_source_id=abc123">
            </div></body></html>"#;
        let url = extract_login_url(html).expect("login URL not found");
        assert!(url.starts_with("https://sso.ci.ford.com/authsvc/mtfim/sps/authsvc?"));
        assert!(url.contains("identity_source_id=abc123"));

        assert!(extract_login_url("<html>no marker here</html>").is_none());
    }

    #[test]
    fn test_extract_callback_params() {
        let (code, grant_id) = extract_callback_params(
            "fordapp://userauthorized/?code=abc.def.ghi&grant_id=f9d00050-6b82-4a32",
        )
        .expect("Failed to extract callback params");
        assert_eq!(code, "abc.def.ghi");
        assert_eq!(grant_id, "f9d00050-6b82-4a32");

        assert!(extract_callback_params("fordapp://userauthorized/?code=only").is_err());
        assert!(extract_callback_params("not a url").is_err());
    }

    #[test]
    fn test_api_headers_attach_token() {
        let headers = api_headers(Some("my-access-token")).expect("Failed to build headers");
        assert_eq!(headers.get("auth-token").unwrap(), "my-access-token");
        assert_eq!(headers.get("Application-Id").unwrap(), APPLICATION_ID);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let headers = api_headers(None).expect("Failed to build headers");
        assert!(headers.get("auth-token").is_none());
    }

    #[test]
    fn test_parse_status_envelope() {
        let json = r#"{"vehiclestatus": {"vin": "WX231231232", "lockStatus": {"value": "UNLOCKED"}}, "version": "1.0.0", "status": 200}"#;
        let envelope: StatusEnvelope =
            serde_json::from_str(json).expect("Failed to parse status envelope");
        assert_eq!(envelope.vehicle_status.vin.as_deref(), Some("WX231231232"));
    }

    #[test]
    fn test_parse_token_responses() {
        let json = r#"{"access_token": "at", "refresh_token": "rt", "expires_in": 300, "refresh_expires_in": 7200, "token_type": "Bearer"}"#;
        let exchange: TokenExchangeResponse =
            serde_json::from_str(json).expect("Failed to parse token exchange response");
        assert_eq!(exchange.access_token, "at");
        assert_eq!(exchange.refresh_expires_in, 7200);

        // Refresh without rotation
        let json = r#"{"access_token": "at2", "expires_in": 300}"#;
        let refresh: TokenRefresh =
            serde_json::from_str(json).expect("Failed to parse token refresh response");
        assert_eq!(refresh.access_token, "at2");
        assert!(refresh.refresh_token.is_none());

        // Refresh with rotation
        let json = r#"{"access_token": "at3", "expires_in": 300, "refresh_token": "rt2", "refresh_expires_in": 7200}"#;
        let refresh: TokenRefresh =
            serde_json::from_str(json).expect("Failed to parse token refresh response");
        assert_eq!(refresh.refresh_token.as_deref(), Some("rt2"));
    }
}
