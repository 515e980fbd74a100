//! Authorization Code relay
//!
//! The three operations behind `/api/login`, `/api/callback` and
//! `/api/refresh`. A login attempt lives only in the browser's state cookie:
//!
//! ```text
//! NO_ATTEMPT -> PENDING (cookie set) -> VALIDATED (state matched) -> TERMINAL (tokens in fragment)
//!                       PENDING -> REJECTED (403, no exchange)
//! ```
//!
//! Handlers share nothing mutable. Each makes at most one token endpoint
//! call, awaited on the request's own task, with no retry.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use spotify_auth::ClientCredentials;
use tracing::{info, instrument, warn};

use crate::config::{Config, CookieConfig, ProviderConfig};
use crate::cookie;
use crate::error::RelayError;
use crate::metrics;

/// Immutable settings the handlers need, shared behind an `Arc`.
#[derive(Debug)]
pub struct RelaySettings {
    pub credentials: ClientCredentials,
    pub provider: ProviderConfig,
    pub cookie: CookieConfig,
}

/// Handler state: the settings plus a pooled HTTP client for token calls.
#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub settings: Arc<RelaySettings>,
}

impl RelayState {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            settings: Arc::new(RelaySettings {
                credentials: config.credentials.clone(),
                provider: config.provider.clone(),
                cookie: config.cookie.clone(),
            }),
        }
    }
}

/// Query parameters the provider sends back to the callback.
#[derive(Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user declined consent
    pub error: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct RefreshParams {
    pub refresh_token: Option<String>,
}

/// Body of a successful refresh: the new access token and nothing else.
#[derive(Serialize)]
pub struct AccessTokenBody {
    pub access_token: String,
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

/// `302 Found` to `location`.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// Redirect target on the relay's own origin with `pairs` in the fragment.
///
/// Fragments are never sent back to any server, so tokens stay out of
/// request lines and access logs and only the SPA's script sees them.
fn fragment_location(pairs: &[(&str, &str)]) -> String {
    let fragment = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("/#{fragment}")
}

/// Start a login attempt: mint a state, store it in the cookie, and send the
/// browser to the provider's consent page.
#[instrument(skip_all, fields(request_id = %new_request_id()))]
pub fn begin_login(state: &RelayState) -> Result<Response, RelayError> {
    let settings = &state.settings;
    let anti_forgery = spotify_auth::generate_state();

    let url = spotify_auth::build_authorization_url(
        &settings.provider.authorize_url,
        &settings.credentials,
        &settings.provider.scopes,
        &anti_forgery,
    )?;

    metrics::record_login();
    info!("login started, redirecting to provider");

    Ok((
        StatusCode::FOUND,
        [
            (LOCATION, url.to_string()),
            (SET_COOKIE, cookie::state_cookie(&settings.cookie, &anti_forgery)),
        ],
    )
        .into_response())
}

/// Validate the provider's callback and trade the code for tokens.
///
/// The `state` check runs first and fails closed. Once it passes, the state
/// cookie is cleared on every response, since the attempt is spent whatever
/// happens next.
#[instrument(skip_all, fields(request_id = %new_request_id()))]
pub async fn handle_callback(
    state: &RelayState,
    params: CallbackParams,
    headers: &HeaderMap,
) -> Response {
    let cookie_config = &state.settings.cookie;
    let stored = cookie::read_cookie(headers, &cookie_config.name);

    if !spotify_auth::states_match(params.state.as_deref(), stored) {
        metrics::record_callback("invalid_state");
        warn!(
            state_present = params.state.is_some(),
            cookie_present = stored.is_some(),
            "callback rejected: state mismatch"
        );
        return RelayError::InvalidState.into_response();
    }

    let response = match complete_callback(state, params).await {
        Ok(location) => found(location),
        Err(err) => err.into_response(),
    };

    (
        AppendHeaders([(SET_COOKIE, cookie::clear_state_cookie(cookie_config))]),
        response,
    )
        .into_response()
}

/// Everything after state validation. Returns the redirect target.
async fn complete_callback(state: &RelayState, params: CallbackParams) -> Result<String, RelayError> {
    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        metrics::record_callback("denied");
        info!(error, "provider reported authorization error");
        return Ok(fragment_location(&[("error", error)]));
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        metrics::record_callback("bad_request");
        warn!("callback missing authorization code");
        return Err(RelayError::MissingParam("code"));
    };

    let settings = &state.settings;
    let started = Instant::now();
    let result = spotify_auth::exchange_code(
        &state.client,
        &settings.provider.token_url,
        &settings.credentials,
        code,
    )
    .await;
    metrics::record_token_request(
        "authorization_code",
        token_status(&result),
        started.elapsed().as_secs_f64(),
    );

    let tokens = result.map_err(|e| {
        metrics::record_callback("exchange_failed");
        warn!(error = %e, "authorization code exchange failed");
        RelayError::from(e)
    })?;

    metrics::record_callback("tokens");
    info!("authorization code exchanged, delivering tokens");

    Ok(fragment_location(&[
        ("access_token", tokens.access_token.as_str()),
        ("refresh_token", tokens.refresh_token.as_str()),
    ]))
}

/// Mint a new access token from a client-held refresh token.
///
/// No cookie check: possession of the refresh token is the credential.
#[instrument(skip_all, fields(request_id = %new_request_id()))]
pub async fn refresh_access_token(
    state: &RelayState,
    params: RefreshParams,
) -> Result<Json<AccessTokenBody>, RelayError> {
    let Some(refresh_token) = params.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
        warn!("refresh request missing refresh_token");
        return Err(RelayError::MissingParam("refresh_token"));
    };

    let settings = &state.settings;
    let started = Instant::now();
    let result = spotify_auth::refresh_access_token(
        &state.client,
        &settings.provider.token_url,
        &settings.credentials,
        refresh_token,
    )
    .await;
    metrics::record_token_request(
        "refresh_token",
        token_status(&result),
        started.elapsed().as_secs_f64(),
    );

    let refreshed = result.map_err(|e| {
        warn!(error = %e, "refresh token exchange failed");
        RelayError::from(e)
    })?;

    info!("access token refreshed");
    Ok(Json(AccessTokenBody {
        access_token: refreshed.access_token,
    }))
}

/// Provider status for metrics: 0 when no response arrived.
fn token_status<T>(result: &spotify_auth::Result<T>) -> u16 {
    match result {
        Ok(_) | Err(spotify_auth::Error::MalformedResponse(_)) => 200,
        Err(spotify_auth::Error::Rejected { status, .. }) => *status,
        Err(_) => 0,
    }
}
