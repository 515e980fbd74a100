//! Per-request relay errors
//!
//! Every failure a relay handler can produce, and the HTTP response each one
//! maps to. Bodies are short fixed strings: provider error bodies are logged,
//! never echoed to the browser.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Callback `state` missing or not equal to the cookie.
    #[error("Invalid state")]
    InvalidState,

    #[error("Missing {0}")]
    MissingParam(&'static str),

    /// The provider answered the token request with a non-success status.
    #[error("Token exchange failed")]
    ProviderRejected { status: u16 },

    /// The token request never got an answer.
    #[error("Token endpoint unreachable")]
    ProviderUnreachable,

    /// Success status but the body lacked the expected tokens.
    #[error("Malformed token response")]
    MalformedResponse,

    #[error("Internal error")]
    Internal,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidState => StatusCode::FORBIDDEN,
            RelayError::MissingParam(_) => StatusCode::BAD_REQUEST,
            // Surface the provider's own status; anything that is not a valid
            // error status collapses to 502.
            RelayError::ProviderRejected { status } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            RelayError::ProviderUnreachable => StatusCode::BAD_GATEWAY,
            RelayError::MalformedResponse | RelayError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<spotify_auth::Error> for RelayError {
    fn from(err: spotify_auth::Error) -> Self {
        match err {
            spotify_auth::Error::Rejected { status, .. } => RelayError::ProviderRejected { status },
            spotify_auth::Error::Http(_) => RelayError::ProviderUnreachable,
            spotify_auth::Error::MalformedResponse(_) => RelayError::MalformedResponse,
            spotify_auth::Error::InvalidUrl(_) => RelayError::Internal,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; charset=utf-8",
            )],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_is_403_with_fixed_body() {
        let err = RelayError::InvalidState;
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Invalid state");
    }

    #[test]
    fn missing_param_names_the_param() {
        let err = RelayError::MissingParam("refresh_token");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing refresh_token");
    }

    #[test]
    fn provider_status_passes_through() {
        assert_eq!(
            RelayError::ProviderRejected { status: 400 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::ProviderRejected { status: 503 }.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn non_error_provider_status_becomes_bad_gateway() {
        assert_eq!(
            RelayError::ProviderRejected { status: 302 }.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RelayError::ProviderRejected { status: 42 }.status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn auth_errors_map_to_relay_errors() {
        let rejected: RelayError = spotify_auth::Error::Rejected {
            status: 401,
            body: "{\"error\":\"invalid_client\"}".into(),
        }
        .into();
        assert!(matches!(
            rejected,
            RelayError::ProviderRejected { status: 401 }
        ));

        let unreachable: RelayError = spotify_auth::Error::Http("connection refused".into()).into();
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);

        let malformed: RelayError =
            spotify_auth::Error::MalformedResponse("missing field".into()).into();
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
