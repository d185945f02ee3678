//! Interactive authorization flow: a one-shot HTTP listener on localhost
//! that waits for the OAuth redirect, exchanges the authorization code for
//! an offline token pair, and persists it to the cache file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::LoginError;
use crate::TokenData;
use crate::post_token_request;
use crate::read_app_credentials;
use crate::write_token_cache;

pub const DEFAULT_CALLBACK_PORT: u16 = 4892;
pub const DEFAULT_OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/presentations";
const DEFAULT_AUTH_BASE_URL: &str = "https://accounts.google.com";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Bounded wait for the browser redirect before the flow fails.
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How often the blocking accept loop wakes up. Keeps the listener thread
/// from outliving a cancelled login future by more than one tick.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

const LOGIN_SUCCESS_HTML: &str =
    "<h1>Authentication successful! You can close this window.</h1>";
const LOGIN_DENIED_HTML: &str = "<h1>Authentication failed. You can close this window.</h1>";

#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub port: u16,
    pub scope: String,
    pub auth_base_url: String,
    pub token_url: String,
    pub open_browser: bool,
    pub login_timeout: Duration,
}

impl ServerOptions {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf) -> Self {
        Self {
            credentials_path,
            token_path,
            port: DEFAULT_CALLBACK_PORT,
            scope: DEFAULT_OAUTH_SCOPE.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            open_browser: true,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

pub struct LoginServer {
    pub auth_url: String,
    pub actual_port: u16,
    opts: ServerOptions,
    client_id: String,
    client_secret: String,
    server: Arc<tiny_http::Server>,
}

/// Bind the callback listener, compute the authorization URL and open it in
/// the user's browser. The returned handle reports the bound port (useful
/// when `opts.port` is 0) and drives the rest of the flow in
/// [`LoginServer::block_until_done`].
pub fn run_login_server(opts: ServerOptions) -> Result<LoginServer, LoginError> {
    let credentials = read_app_credentials(&opts.credentials_path)?;

    let server = tiny_http::Server::http(("127.0.0.1", opts.port))
        .map_err(|e| LoginError::AuthFailed(format!("failed to bind callback listener: {e}")))?;
    let actual_port = server
        .server_addr()
        .to_ip()
        .map(|addr| addr.port())
        .ok_or_else(|| LoginError::AuthFailed("callback listener has no IP address".to_string()))?;

    let redirect_uri = format!("http://localhost:{actual_port}");
    let auth_url = build_authorize_url(
        &opts.auth_base_url,
        &credentials.installed.client_id,
        &redirect_uri,
        &opts.scope,
    );

    tracing::info!("listening for OAuth callback on port {actual_port}");
    if opts.open_browser
        && let Err(e) = webbrowser::open(&auth_url)
    {
        tracing::warn!("failed to open browser: {e}");
    }

    Ok(LoginServer {
        auth_url,
        actual_port,
        opts,
        client_id: credentials.installed.client_id,
        client_secret: credentials.installed.client_secret,
        server: Arc::new(server),
    })
}

impl LoginServer {
    /// Wait for the redirect, exchange the code, persist the tokens and
    /// answer the browser. The listener is dropped (closing the socket and
    /// any lingering connections) on every exit path, including timeout.
    pub async fn block_until_done(self) -> Result<TokenData, LoginError> {
        let timeout = self.opts.login_timeout;
        tokio::time::timeout(timeout, self.serve_one_callback())
            .await
            .map_err(|_| LoginError::Timeout)?
    }

    async fn serve_one_callback(self) -> Result<TokenData, LoginError> {
        let redirect_uri = format!("http://localhost:{}", self.actual_port);
        loop {
            let server = self.server.clone();
            let request = tokio::task::spawn_blocking(move || {
                server.recv_timeout(ACCEPT_POLL_INTERVAL)
            })
            .await
            .map_err(|e| LoginError::Io(std::io::Error::other(e)))??;
            let Some(request) = request else {
                continue;
            };

            tracing::debug!("received callback request: {}", request.url());
            let query = parse_callback_query(self.actual_port, request.url());

            if let Some(message) = query.error {
                respond_html(request, 200, LOGIN_DENIED_HTML);
                return Err(LoginError::AuthFailed(message));
            }
            let Some(code) = query.code else {
                // Browsers probe for favicons and the like; keep waiting.
                respond_html(request, 404, "");
                continue;
            };

            tracing::info!("got auth code, exchanging for tokens");
            let tokens = exchange_code_for_tokens(
                &self.opts.token_url,
                &self.client_id,
                &self.client_secret,
                &redirect_uri,
                &code,
            )
            .await?;
            write_token_cache(&self.opts.token_path, &tokens)?;

            respond_html(request, 200, LOGIN_SUCCESS_HTML);
            return Ok(tokens);
        }
    }
}

struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

fn parse_callback_query(port: u16, request_url: &str) -> CallbackQuery {
    let full = format!("http://localhost:{port}{request_url}");
    let Ok(url) = Url::parse(&full) else {
        return CallbackQuery {
            code: None,
            error: None,
        };
    };
    let lookup = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };
    CallbackQuery {
        code: lookup("code"),
        error: lookup("error"),
    }
}

fn respond_html(request: tiny_http::Request, status: u16, body: &str) {
    let mut response = tiny_http::Response::from_string(body).with_status_code(status);
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]) {
        response.add_header(header);
    }
    if let Err(e) = request.respond(response) {
        tracing::warn!("failed to answer callback request: {e}");
    }
}

fn build_authorize_url(
    auth_base_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
) -> String {
    let query = vec![
        ("response_type", "code"),
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("scope", scope),
        ("access_type", "offline"),
        ("prompt", "consent"),
    ];
    let qs = query
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{auth_base_url}/o/oauth2/v2/auth?{qs}")
}

async fn exchange_code_for_tokens(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenData, LoginError> {
    let body = format!(
        "grant_type=authorization_code&code={}&redirect_uri={}&client_id={}&client_secret={}",
        urlencoding::encode(code),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret),
    );
    let response = post_token_request(token_url, body).await?;
    let expiry = response.expiry();
    let refresh_token = response.refresh_token.ok_or_else(|| {
        LoginError::TokenExchangeFailed("token response missing refresh_token".to_string())
    })?;
    Ok(TokenData {
        access_token: response.access_token,
        refresh_token,
        expiry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_contains_required_params() {
        let url = build_authorize_url(
            "https://accounts.google.com",
            "client123",
            "http://localhost:4892",
            "https://www.googleapis.com/auth/presentations",
        );
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        for needle in [
            "response_type=code",
            "client_id=client123",
            "redirect_uri=http%3A%2F%2Flocalhost%3A4892",
            "scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fpresentations",
            "access_type=offline",
            "prompt=consent",
        ] {
            assert!(url.contains(needle), "missing query param: {needle}");
        }
    }

    #[test]
    fn callback_query_extracts_code() {
        let query = parse_callback_query(4892, "/?code=abc123&scope=presentations");
        assert_eq!(query.code.as_deref(), Some("abc123"));
        assert!(query.error.is_none());
    }

    #[test]
    fn callback_query_surfaces_denial() {
        let query = parse_callback_query(4892, "/?error=access_denied");
        assert!(query.code.is_none());
        assert_eq!(query.error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn favicon_requests_carry_neither() {
        let query = parse_callback_query(4892, "/favicon.ico");
        assert!(query.code.is_none());
        assert!(query.error.is_none());
    }
}
