//! Token endpoint calls
//!
//! Two interactions, both a form-encoded POST authenticated with the client's
//! Basic header:
//! 1. Authorization code exchange (end of the login flow)
//! 2. Refresh token exchange (client asks for a new access token)
//!
//! Each call is attempted exactly once. A non-success status is reported
//! with the provider's status code so the caller can surface it unchanged.

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::ClientCredentials;
use crate::error::{Error, Result};

/// Token endpoint response to an `authorization_code` grant.
///
/// Only the two tokens are required; the rest is informational.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token endpoint response to a `refresh_token` grant.
///
/// The provider may rotate the refresh token; the relay ignores it.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchange an authorization code for an access/refresh token pair.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &ClientCredentials,
    code: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(token_url)
        .header(AUTHORIZATION, credentials.basic_auth_header())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("code exchange request failed: {e}")))?;

    read_token_body(response, "authorization_code").await
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &ClientCredentials,
    refresh_token: &str,
) -> Result<RefreshResponse> {
    let response = client
        .post(token_url)
        .header(AUTHORIZATION, credentials.basic_auth_header())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    read_token_body(response, "refresh_token").await
}

/// Check the status, then decode the JSON body into `T`.
///
/// A success status with a body missing required fields is an error, never a
/// partially filled response.
async fn read_token_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    grant_type: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        warn!(grant_type, status = status.as_u16(), body = %body, "token endpoint rejected request");
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    debug!(grant_type, status = status.as_u16(), "token endpoint accepted request");

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("failed to read token response: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::MalformedResponse(e.to_string()))
}
