//! Configuration types and loading
//!
//! Non-secret settings (listener, provider endpoints, cookie attributes) come
//! from an optional TOML file; every field has a default so the relay runs
//! with no file at all. Client credentials come only from the environment
//! (`CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`) and are never read from TOML.

use serde::Deserialize;
use spotify_auth::ClientCredentials;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CLIENT_ID_ENV: &str = "CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "CLIENT_SECRET";
pub const REDIRECT_URI_ENV: &str = "REDIRECT_URI";

/// Fully resolved configuration, built once in `main`.
#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub cookie: CookieConfig,
    pub credentials: ClientCredentials,
}

/// The TOML file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub cookie: CookieConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub max_connections: usize,
}

/// Identity provider endpoints and requested scopes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: String,
}

/// Attributes of the anti-forgery state cookie
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    /// Adds the `Secure` attribute. Turn off only for plain-http local dev.
    pub secure: bool,
    /// Lifetime of a pending login attempt
    pub max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_connections: 1000,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorize_url: spotify_auth::AUTHORIZE_ENDPOINT.to_string(),
            token_url: spotify_auth::TOKEN_ENDPOINT.to_string(),
            scopes: spotify_auth::SCOPES.to_string(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: spotify_auth::STATE_COOKIE.to_string(),
            secure: true,
            max_age_secs: 600,
        }
    }
}

impl FileConfig {
    /// Read the TOML file, or fall back to defaults when no path was given.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }
}

impl Config {
    /// Load the optional file, then read credentials from the environment.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let file = FileConfig::load(path)?;
        let credentials = credentials_from_env()?;
        Self::from_parts(file, credentials)
    }

    /// Assemble and validate a configuration.
    pub fn from_parts(file: FileConfig, credentials: ClientCredentials) -> common::Result<Self> {
        require_http_url("provider.authorize_url", &file.provider.authorize_url)?;
        require_http_url("provider.token_url", &file.provider.token_url)?;
        require_http_url(REDIRECT_URI_ENV, &credentials.redirect_uri)?;

        if file.provider.scopes.trim().is_empty() {
            return Err(common::Error::Config(
                "provider.scopes must not be empty".into(),
            ));
        }

        if file.server.max_connections == 0 {
            return Err(common::Error::Config(
                "server.max_connections must be greater than 0".into(),
            ));
        }

        if file.cookie.max_age_secs == 0 {
            return Err(common::Error::Config(
                "cookie.max_age_secs must be greater than 0".into(),
            ));
        }

        let name = &file.cookie.name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(common::Error::Config(format!(
                "cookie.name must be non-empty and use only [A-Za-z0-9_-], got: {name:?}"
            )));
        }

        Ok(Self {
            server: file.server,
            provider: file.provider,
            cookie: file.cookie,
            credentials,
        })
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    ///
    /// `None` means run on defaults.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        std::env::var("CONFIG_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// Read the client credentials. All three variables are required.
pub fn credentials_from_env() -> common::Result<ClientCredentials> {
    let client_id = required_env(CLIENT_ID_ENV)?;
    let client_secret = required_env(CLIENT_SECRET_ENV)?;
    let redirect_uri = required_env(REDIRECT_URI_ENV)?;
    Ok(ClientCredentials::new(client_id, client_secret, redirect_uri))
}

fn required_env(key: &'static str) -> common::Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(common::Error::MissingEnv(key)),
    }
}

fn require_http_url(field: &str, value: &str) -> common::Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| common::Error::Config(format!("{field} is not a valid URL ({e}): {value}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(common::Error::Config(format!(
            "{field} must use http:// or https://, got scheme {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn creds() -> ClientCredentials {
        ClientCredentials::new("id", "secret", "http://localhost:5000/api/callback")
    }

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_target_spotify() {
        let config = Config::from_parts(FileConfig::default(), creds()).unwrap();
        assert_eq!(config.server.listen_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(
            config.provider.authorize_url,
            "https://accounts.spotify.com/authorize"
        );
        assert_eq!(
            config.provider.token_url,
            "https://accounts.spotify.com/api/token"
        );
        assert_eq!(
            config.provider.scopes,
            "playlist-read-private playlist-read-collaborative app-remote-control streaming"
        );
        assert_eq!(config.cookie.name, "spotify_auth_state");
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.max_age_secs, 600);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_toml(
            r#"
[server]
listen_addr = "0.0.0.0:8080"

[cookie]
secure = false
"#,
        );
        let file_config = FileConfig::load(Some(file.path())).unwrap();
        let config = Config::from_parts(file_config, creds()).unwrap();

        assert_eq!(config.server.listen_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.server.max_connections, 1000);
        assert!(!config.cookie.secure);
        assert_eq!(config.cookie.name, "spotify_auth_state");
        assert_eq!(config.provider.token_url, spotify_auth::TOKEN_ENDPOINT);
    }

    #[test]
    fn provider_endpoints_can_be_overridden() {
        let file = write_toml(
            r#"
[provider]
authorize_url = "http://127.0.0.1:9000/authorize"
token_url = "http://127.0.0.1:9000/api/token"
scopes = "streaming"
"#,
        );
        let config =
            Config::from_parts(FileConfig::load(Some(file.path())).unwrap(), creds()).unwrap();
        assert_eq!(config.provider.token_url, "http://127.0.0.1:9000/api/token");
        assert_eq!(config.provider.scopes, "streaming");
    }

    #[test]
    fn load_missing_file_is_error() {
        let result = FileConfig::load(Some(Path::new("/nonexistent/relay.toml")));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn load_invalid_toml_is_error() {
        let file = write_toml("not valid {{{{ toml");
        let result = FileConfig::load(Some(file.path()));
        assert!(matches!(result, Err(common::Error::Toml(_))));
    }

    #[test]
    fn token_url_without_scheme_rejected() {
        let mut file = FileConfig::default();
        file.provider.token_url = "accounts.spotify.com/api/token".into();
        let err = Config::from_parts(file, creds()).unwrap_err();
        assert!(
            err.to_string().contains("provider.token_url"),
            "error should name the field, got: {err}"
        );
    }

    #[test]
    fn non_http_redirect_uri_rejected() {
        let credentials = ClientCredentials::new("id", "secret", "ftp://example.com/callback");
        let err = Config::from_parts(FileConfig::default(), credentials).unwrap_err();
        assert!(err.to_string().contains("REDIRECT_URI"), "got: {err}");
    }

    #[test]
    fn zero_limits_rejected() {
        let mut file = FileConfig::default();
        file.server.max_connections = 0;
        assert!(Config::from_parts(file, creds()).is_err());

        let mut file = FileConfig::default();
        file.cookie.max_age_secs = 0;
        assert!(Config::from_parts(file, creds()).is_err());
    }

    #[test]
    fn cookie_name_with_separators_rejected() {
        let mut file = FileConfig::default();
        file.cookie.name = "bad;name".into();
        assert!(Config::from_parts(file, creds()).is_err());

        let mut file = FileConfig::default();
        file.cookie.name = String::new();
        assert!(Config::from_parts(file, creds()).is_err());
    }

    #[test]
    fn credentials_read_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env(CLIENT_ID_ENV, "env-id");
            set_env(CLIENT_SECRET_ENV, "env-secret");
            set_env(REDIRECT_URI_ENV, "http://localhost:5000/api/callback");
        }

        let credentials = credentials_from_env().unwrap();
        assert_eq!(credentials.client_id, "env-id");
        assert_eq!(credentials.client_secret.expose(), "env-secret");
        assert_eq!(credentials.redirect_uri, "http://localhost:5000/api/callback");

        unsafe {
            remove_env(CLIENT_ID_ENV);
            remove_env(CLIENT_SECRET_ENV);
            remove_env(REDIRECT_URI_ENV);
        }
    }

    #[test]
    fn missing_secret_is_fatal() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env(CLIENT_ID_ENV, "env-id");
            remove_env(CLIENT_SECRET_ENV);
            set_env(REDIRECT_URI_ENV, "http://localhost:5000/api/callback");
        }

        let err = credentials_from_env().unwrap_err();
        assert!(
            matches!(err, common::Error::MissingEnv("CLIENT_SECRET")),
            "got: {err:?}"
        );

        unsafe {
            remove_env(CLIENT_ID_ENV);
            remove_env(REDIRECT_URI_ENV);
        }
    }

    #[test]
    fn blank_env_value_counts_as_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(CLIENT_ID_ENV, "   ") };
        let err = credentials_from_env().unwrap_err();
        assert!(matches!(err, common::Error::MissingEnv("CLIENT_ID")));
        unsafe { remove_env(CLIENT_ID_ENV) };
    }

    #[test]
    fn resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(path, Some(PathBuf::from("/cli/wins.toml")));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn resolve_path_env_then_none() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/relay.toml") };
        assert_eq!(
            Config::resolve_path(None),
            Some(PathBuf::from("/env/relay.toml"))
        );
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), None);
    }
}
