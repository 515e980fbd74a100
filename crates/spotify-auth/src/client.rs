//! Registered client credentials
//!
//! The client ID/secret pair and redirect URI issued when the app was
//! registered with the provider. Built once at startup and shared read-only.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;

/// Provider-issued client identity, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Must match the redirect URI registered with the provider exactly
    pub redirect_uri: String,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// `Authorization` header value for token endpoint calls:
    /// `Basic base64(client_id:client_secret)`.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret.expose());
        format!("Basic {}", STANDARD.encode(raw))
    }
}
