//! Authorization URL construction
//!
//! The first leg of the Authorization Code grant: the browser is sent to the
//! provider's authorize endpoint with our client ID, requested scopes, the
//! registered redirect URI and the anti-forgery `state`.

use url::Url;

use crate::client::ClientCredentials;
use crate::error::Result;

/// Build the provider authorization URL.
///
/// `show_dialog=true` makes the provider always show its consent screen
/// instead of silently reusing an earlier grant. Parameters are appended to
/// any query already present on `endpoint`.
pub fn build_authorization_url(
    endpoint: &str,
    credentials: &ClientCredentials,
    scopes: &str,
    state: &str,
) -> Result<Url> {
    let url = Url::parse_with_params(
        endpoint,
        &[
            ("response_type", "code"),
            ("client_id", credentials.client_id.as_str()),
            ("scope", scopes),
            ("redirect_uri", credentials.redirect_uri.as_str()),
            ("state", state),
            ("show_dialog", "true"),
        ],
    )?;
    Ok(url)
}
