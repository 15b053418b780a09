use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::BlobSettings;
use crate::error::{MeritError, Result};
use crate::models::LeaderboardResult;

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
}

/// Uploads the leaderboard JSON to the blob store, overwriting the previous one.
pub struct BlobPublisher {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    token: String,
}

impl BlobPublisher {
    pub fn new(blob: &BlobSettings) -> Result<Self> {
        let token = blob.require_token()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(blob.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", blob.api_url.trim_end_matches('/'), blob.pathname),
            api_version: blob.api_version.clone(),
            token,
        })
    }

    /// Returns the public URL of the stored blob.
    pub async fn publish(&self, result: &LeaderboardResult) -> Result<String> {
        let body = serde_json::to_vec(result)?;
        debug!(endpoint = %self.endpoint, bytes = body.len(), "uploading leaderboard");

        let response = self
            .client
            .put(&self.endpoint)
            .bearer_auth(&self.token)
            .header("x-api-version", &self.api_version)
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .header("x-content-type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MeritError::BlobRejected {
                status: status.as_u16(),
                body,
            });
        }

        let blob: PutBlobResponse = response.json().await?;
        info!(url = %blob.url, "leaderboard uploaded");
        Ok(blob.url)
    }
}

pub fn write_local(path: &Path, result: &LeaderboardResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read_local(path: &Path) -> Result<LeaderboardResult> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::LeaderboardEntry;

    fn settings(server: &MockServer, token: Option<&str>) -> BlobSettings {
        BlobSettings {
            api_url: server.uri(),
            pathname: "leaderboard_latest.json".to_string(),
            api_version: "7".to_string(),
            timeout_secs: 5,
            token: token.map(str::to_string),
        }
    }

    fn result() -> LeaderboardResult {
        let entry = LeaderboardEntry {
            username: "alice".to_string(),
            user_id: 1,
            current_merit: 140,
            merit_7d: 40,
            merit_30d: 40,
            merit_90d: 140,
            merit_120d: 140,
        };
        LeaderboardResult {
            last_updated: Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap(),
            leaderboard_7d: vec![entry.clone()],
            leaderboard_30d: vec![entry.clone()],
            leaderboard_90d: vec![entry.clone()],
            leaderboard_120d: vec![entry],
        }
    }

    #[tokio::test]
    async fn uploads_with_bearer_token_and_overwrite() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/leaderboard_latest.json"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-allow-overwrite", "1"))
            .and(header("x-add-random-suffix", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://blob.example/leaderboard_latest.json"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = BlobPublisher::new(&settings(&server, Some("secret"))).unwrap();
        let url = publisher.publish(&result()).await.unwrap();
        assert_eq!(url, "https://blob.example/leaderboard_latest.json");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["leaderboard7d"][0]["merit7d"], 40);
        assert!(body["lastUpdated"].as_str().unwrap().starts_with("2024-01-08T12:00:00"));
    }

    #[tokio::test]
    async fn rejected_upload_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let publisher = BlobPublisher::new(&settings(&server, Some("bad"))).unwrap();
        let err = publisher.publish(&result()).await.unwrap_err();
        assert!(matches!(err, MeritError::BlobRejected { status: 403, .. }));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let server = MockServer::start().await;
        assert!(matches!(
            BlobPublisher::new(&settings(&server, None)),
            Err(MeritError::MissingToken)
        ));
    }

    #[test]
    fn local_copy_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        write_local(&path, &result()).unwrap();
        let loaded = read_local(&path).unwrap();
        assert_eq!(loaded, result());
    }
}
