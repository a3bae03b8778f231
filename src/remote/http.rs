//! HTTP submission service implementation

use crate::error::{Error, Result};
use crate::remote::SubmissionService;
use crate::types::{ConfirmationId, Location, QualityAssessment, Submission};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Submission service using reqwest
pub struct HttpSubmissionService {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

#[derive(Serialize)]
struct SubmitPayload<'a> {
    submission_id: Uuid,
    engineer_id: &'a str,
    captured_at: DateTime<Utc>,
    location: Option<Location>,
    quality: Option<&'a QualityAssessment>,
    content_type: &'static str,
    image: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    confirmation_id: Option<String>,
    transaction_hash: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpSubmissionService {
    /// Create a new service posting to `{endpoint}/submissions`
    ///
    /// `timeout` bounds each HTTP request at the transport layer.
    pub fn new(endpoint: Url, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    fn submissions_url(&self) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/submissions"))
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {e}", self.endpoint)))
    }
}

#[async_trait]
impl SubmissionService for HttpSubmissionService {
    async fn submit(&self, submission: &Submission) -> Result<ConfirmationId> {
        let payload = SubmitPayload {
            submission_id: submission.id(),
            engineer_id: submission.engineer_id(),
            captured_at: submission.captured_at(),
            location: submission.location(),
            quality: submission.quality(),
            content_type: submission.image().format().content_type(),
            image: BASE64.encode(submission.image().bytes()),
        };

        let mut request = self.client.post(self.submissions_url()?).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(id = %submission.id(), "posting submission");
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteService(parse_api_error(status, &body)));
        }

        let body: SubmitResponse = response.json().await?;
        let id = body
            .confirmation_id
            .or(body.transaction_hash)
            .unwrap_or_default();
        ConfirmationId::new(id)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Draft, ImagePayload};
    use mockito::Matcher;

    fn submission() -> Submission {
        let image = ImagePayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xDB]).unwrap();
        Draft::new("ENG-1234", Some(image)).into_submission().unwrap()
    }

    fn service(server: &mockito::Server, token: Option<&str>) -> HttpSubmissionService {
        HttpSubmissionService::new(
            Url::parse(&server.url()).unwrap(),
            token.map(ToString::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_confirmation_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/submissions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "engineer_id": "ENG-1234",
                "content_type": "image/jpeg",
                "image": "/9j/2w==",
            })))
            .with_status(201)
            .with_body(r#"{"confirmation_id":"0x7fc5"}"#)
            .create_async()
            .await;

        let id = service(&server, Some("secret"))
            .submit(&submission())
            .await
            .unwrap();

        assert_eq!(id.as_str(), "0x7fc5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_accepts_transaction_hash() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/submissions")
            .with_status(200)
            .with_body(r#"{"transaction_hash":"0x5ba9"}"#)
            .create_async()
            .await;

        let id = service(&server, None).submit(&submission()).await.unwrap();
        assert_eq!(id.as_str(), "0x5ba9");
    }

    #[tokio::test]
    async fn test_rejection_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/submissions")
            .with_status(422)
            .with_body(r#"{"message":"duplicate report"}"#)
            .create_async()
            .await;

        let err = service(&server, None).submit(&submission()).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(
            err.to_string(),
            "submission service error: duplicate report (422)"
        );
    }

    #[tokio::test]
    async fn test_missing_confirmation_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/submissions")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = service(&server, None).submit(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::RemoteService(_)));
    }

    #[test]
    fn test_parse_api_error_falls_back_to_body() {
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom\n"),
            "boom (500)"
        );
    }
}
