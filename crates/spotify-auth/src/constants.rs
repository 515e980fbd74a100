//! Spotify Accounts endpoints and flow constants
//!
//! These are defaults; the relay config can point the endpoints elsewhere
//! (a staging provider or a test stub).

/// Interactive authorization endpoint the browser is redirected to
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";

/// Scopes requested on login: private and collaborative playlist reads,
/// remote device control and playback streaming.
pub const SCOPES: &str =
    "playlist-read-private playlist-read-collaborative app-remote-control streaming";

/// Cookie carrying the anti-forgery state between login and callback
pub const STATE_COOKIE: &str = "spotify_auth_state";

/// Length of a generated anti-forgery state value
pub const STATE_LENGTH: usize = 16;
