//! Credential manager for the Google Slides API: a file-backed offline
//! token cache, an interactive browser login flow served from a short-lived
//! local HTTP listener, and an [`Authenticator`] that refreshes the access
//! token when it goes stale.

use std::fs::OpenOptions;
use std::io::Read;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

mod error;
pub mod server;

pub use error::LoginError;
pub use server::LoginServer;
pub use server::ServerOptions;
pub use server::run_login_server;

/// Refresh this long before the recorded expiry rather than racing it.
const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Application credentials file layout (`gcp-oauth.keys.json`), as issued by
/// the Google Cloud console for an "installed app" OAuth client.
#[derive(Clone, Debug, Deserialize)]
pub struct AppCredentials {
    pub installed: InstalledApp,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
}

/// The persisted offline credential: one record, one file, overwritten on
/// every new authorization or refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

pub fn read_app_credentials(path: &Path) -> Result<AppCredentials, LoginError> {
    let mut contents = String::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|e| LoginError::ConfigMissing(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| LoginError::ConfigMissing(format!("{}: {e}", path.display())))
}

/// Read the cached token record. Any failure (missing file, bad JSON) is
/// returned to the caller, which treats it as "not logged in".
pub fn try_read_token_cache(path: &Path) -> std::io::Result<TokenData> {
    let mut contents = String::new();
    let mut file = std::fs::File::open(path)?;
    file.read_to_string(&mut contents)?;
    let tokens: TokenData = serde_json::from_str(&contents)?;
    Ok(tokens)
}

pub(crate) fn write_token_cache(path: &Path, tokens: &TokenData) -> std::io::Result<()> {
    let json_data = serde_json::to_string_pretty(tokens)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(json_data.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Bearer-token source handed to the API client. Refreshes through the
/// token endpoint once the cached expiry (minus a small buffer) has passed
/// and rewrites the cache file with the result.
#[derive(Clone, Debug)]
pub struct Authenticator {
    credentials: AppCredentials,
    token_url: String,
    token_path: PathBuf,
    tokens: Arc<Mutex<TokenData>>,
}

impl Authenticator {
    pub fn new(
        credentials: AppCredentials,
        token_url: String,
        token_path: PathBuf,
        tokens: TokenData,
    ) -> Self {
        Self {
            credentials,
            token_url,
            token_path,
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    pub async fn bearer_token(&self) -> Result<String, LoginError> {
        #[expect(clippy::unwrap_used)]
        let current = self.tokens.lock().unwrap().clone();
        if !needs_refresh(&current) {
            return Ok(current.access_token);
        }

        tracing::debug!("access token expired; refreshing");
        let response = refresh_access_token(
            &self.token_url,
            &self.credentials.installed,
            &current.refresh_token,
        )
        .await?;

        let expiry = response.expiry();
        let updated = TokenData {
            access_token: response.access_token,
            // Google omits the refresh token on refresh responses.
            refresh_token: response.refresh_token.unwrap_or(current.refresh_token),
            expiry,
        };
        write_token_cache(&self.token_path, &updated)?;

        #[expect(clippy::unwrap_used)]
        let mut tokens = self.tokens.lock().unwrap();
        *tokens = updated.clone();
        Ok(updated.access_token)
    }
}

fn needs_refresh(tokens: &TokenData) -> bool {
    match tokens.expiry {
        Some(expiry) => expiry <= Utc::now() + chrono::Duration::seconds(EXPIRY_BUFFER_SECONDS),
        // No recorded expiry: refresh rather than trust a token of unknown age.
        None => true,
    }
}

/// Obtain a ready-to-use [`Authenticator`], from the cache file when
/// possible, otherwise via the interactive browser flow. Fails only when
/// both paths fail.
pub async fn load_or_login(opts: ServerOptions) -> Result<Authenticator, LoginError> {
    let credentials = read_app_credentials(&opts.credentials_path)?;

    let tokens = match try_read_token_cache(&opts.token_path) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::info!("no usable token cache ({e}); starting interactive login");
            let server = run_login_server(opts.clone())?;
            tracing::info!("waiting for OAuth callback; auth URL: {}", server.auth_url);
            server.block_until_done().await?
        }
    };

    Ok(Authenticator::new(
        credentials,
        opts.token_url,
        opts.token_path,
        tokens,
    ))
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
    }
}

pub(crate) async fn post_token_request(
    token_url: &str,
    body: String,
) -> Result<TokenResponse, LoginError> {
    let client = reqwest::Client::new();
    let response = client
        .post(token_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(LoginError::TokenExchangeFailed(
            response.status().to_string(),
        ));
    }
    response
        .json::<TokenResponse>()
        .await
        .map_err(LoginError::Network)
}

async fn refresh_access_token(
    token_url: &str,
    app: &InstalledApp,
    refresh_token: &str,
) -> Result<TokenResponse, LoginError> {
    let body = format!(
        "grant_type=refresh_token&client_id={}&client_secret={}&refresh_token={}",
        urlencoding::encode(&app.client_id),
        urlencoding::encode(&app.client_secret),
        urlencoding::encode(refresh_token),
    );
    post_token_request(token_url, body).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn token_cache_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".slides-server-credentials.json");
        let tokens = TokenData {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expiry: None,
        };
        write_token_cache(&path, &tokens).unwrap();
        assert_eq!(try_read_token_cache(&path).unwrap(), tokens);
    }

    #[cfg(unix)]
    #[test]
    fn token_cache_is_private_to_the_user() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let tokens = TokenData {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expiry: None,
        };
        write_token_cache(&path, &tokens).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_cache_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(try_read_token_cache(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn app_credentials_parse_installed_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gcp-oauth.keys.json");
        std::fs::write(
            &path,
            r#"{ "installed": { "client_id": "cid-123", "client_secret": "shh" } }"#,
        )
        .unwrap();
        let creds = read_app_credentials(&path).unwrap();
        assert_eq!(creds.installed.client_id, "cid-123");
        assert_eq!(creds.installed.client_secret, "shh");
    }

    #[test]
    fn unreadable_credentials_map_to_config_missing() {
        let dir = tempdir().unwrap();
        let err = read_app_credentials(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoginError::ConfigMissing(_)));
    }

    #[test]
    fn tokens_without_expiry_need_refresh() {
        let tokens = TokenData {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expiry: None,
        };
        assert!(needs_refresh(&tokens));

        let fresh = TokenData {
            expiry: Some(Utc::now() + chrono::Duration::hours(1)),
            ..tokens.clone()
        };
        assert!(!needs_refresh(&fresh));

        let stale = TokenData {
            expiry: Some(Utc::now() - chrono::Duration::minutes(5)),
            ..tokens
        };
        assert!(needs_refresh(&stale));
    }
}
