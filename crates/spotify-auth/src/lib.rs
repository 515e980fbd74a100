//! Spotify Accounts OAuth client library
//!
//! Everything the relay needs to speak the Authorization Code grant to the
//! provider, with no knowledge of HTTP serving or cookies:
//!
//! 1. `state::generate_state()` mints the anti-forgery value for a login
//! 2. `authorize::build_authorization_url()` builds the provider redirect
//! 3. `state::states_match()` checks the echoed value on callback
//! 4. `token::exchange_code()` trades the authorization code for tokens
//! 5. `token::refresh_access_token()` mints a new access token later on

pub mod authorize;
pub mod client;
pub mod constants;
pub mod error;
pub mod state;
pub mod token;

pub use authorize::build_authorization_url;
pub use client::ClientCredentials;
pub use constants::*;
pub use error::{Error, Result};
pub use state::{generate_state, states_match};
pub use token::{RefreshResponse, TokenResponse, exchange_code, refresh_access_token};
