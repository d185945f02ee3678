//! Deployment settings, gathered in one place instead of scattered
//! constants. Every value has a default matching the production setup; a
//! caller (or test) can override any field before wiring the rest of the
//! stack together.

use std::path::PathBuf;
use std::time::Duration;

use slides_writer_login::ServerOptions;

/// Placeholder presentation id; deployments must set their own.
pub const DEFAULT_PRESENTATION_ID: &str = "your-presentation-id-here";

const DEFAULT_CREDENTIALS_PATH: &str = "gcp-oauth.keys.json";
const DEFAULT_TOKEN_PATH: &str = ".slides-server-credentials.json";
const DEFAULT_API_BASE_URL: &str = "https://slides.googleapis.com";

#[derive(Clone, Debug)]
pub struct Config {
    /// The Google Slides presentation every write targets.
    pub presentation_id: String,
    /// OAuth client credentials issued by the Google Cloud console.
    pub credentials_path: PathBuf,
    /// Offline token cache written after the first authorization.
    pub token_path: PathBuf,
    /// Local port the OAuth redirect lands on.
    pub callback_port: u16,
    pub oauth_scope: String,
    pub auth_base_url: String,
    pub token_url: String,
    pub api_base_url: String,
    /// 1-based slide holding the deck title (a single text box).
    pub title_slide: usize,
    /// 1-based slide whose second text box receives content updates.
    pub content_slide: usize,
    pub login_timeout: Duration,
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = ServerOptions::new(
            PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            PathBuf::from(DEFAULT_TOKEN_PATH),
        );
        Self {
            presentation_id: DEFAULT_PRESENTATION_ID.to_string(),
            credentials_path: defaults.credentials_path,
            token_path: defaults.token_path,
            callback_port: defaults.port,
            oauth_scope: defaults.scope,
            auth_base_url: defaults.auth_base_url,
            token_url: defaults.token_url,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            title_slide: 1,
            content_slide: 1,
            login_timeout: defaults.login_timeout,
            open_browser: defaults.open_browser,
        }
    }
}

impl Config {
    /// Login-flow options derived from this configuration.
    pub fn login_options(&self) -> ServerOptions {
        ServerOptions {
            credentials_path: self.credentials_path.clone(),
            token_path: self.token_path.clone(),
            port: self.callback_port,
            scope: self.oauth_scope.clone(),
            auth_base_url: self.auth_base_url.clone(),
            token_url: self.token_url.clone(),
            open_browser: self.open_browser,
            login_timeout: self.login_timeout,
        }
    }
}
