use serde::Deserialize;
use serde::de::DeserializeOwned;

use slides_writer_login::Authenticator;

use crate::Result;
use crate::SlidesError;
use crate::models::BatchUpdateBody;
use crate::models::BatchUpdateResponse;
use crate::models::Presentation;
use crate::models::Request;

/// Thin HTTP client over the two Slides endpoints the writer uses. Each
/// call fetches a bearer token from the [`Authenticator`], which refreshes
/// it behind the scenes when stale.
pub struct SlidesClient {
    http: reqwest::Client,
    base_url: String,
    auth: Authenticator,
}

impl SlidesClient {
    pub fn new(auth: Authenticator, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }

    /// `GET /v1/presentations/{id}`, optionally restricted via a `fields`
    /// mask to keep the payload small.
    pub async fn get_presentation(
        &self,
        presentation_id: &str,
        fields: Option<&str>,
    ) -> Result<Presentation> {
        let mut url = format!("{}/v1/presentations/{presentation_id}", self.base_url);
        if let Some(fields) = fields {
            url.push_str(&format!("?fields={}", urlencoding::encode(fields)));
        }
        let token = self.auth.bearer_token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        read_response(response).await
    }

    /// `POST /v1/presentations/{id}:batchUpdate` with the given requests.
    pub async fn batch_update(
        &self,
        presentation_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let url = format!(
            "{}/v1/presentations/{presentation_id}:batchUpdate",
            self.base_url
        );
        tracing::debug!("batchUpdate with {} request(s)", requests.len());
        let token = self.auth.bearer_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&BatchUpdateBody { requests })
            .send()
            .await?;
        read_response(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| SlidesError::Parse(e.to_string()))
}

/// Google's standard error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn api_error(status: reqwest::StatusCode, body: &str) -> SlidesError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => SlidesError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
            status: envelope.error.status,
        },
        Err(_) => SlidesError::Api {
            code: status.as_u16(),
            message: body.chars().take(200).collect(),
            status: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn api_error_decodes_google_envelope() {
        let err = api_error(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#,
        );
        match err {
            SlidesError::Api {
                code,
                message,
                status,
            } => {
                assert_eq!(code, 403);
                assert_eq!(message, "The caller does not have permission");
                assert_eq!(status, "PERMISSION_DENIED");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_http_status() {
        let err = api_error(reqwest::StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        match err {
            SlidesError::Api { code, status, .. } => {
                assert_eq!(code, 502);
                assert_eq!(status, "Bad Gateway");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
