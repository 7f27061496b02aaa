use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ChannelError, FileChannel};

/// Slack Web API client authenticated with a bot token.
pub struct SlackClient {
    api_base_url: String,
    client: Client,
    token: String,
}

/// Common envelope of every Slack Web API response.
#[derive(Deserialize)]
struct SlackResponse<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

#[derive(Deserialize)]
struct UploadUrl {
    upload_url: String,
    file_id: String,
}

#[derive(Deserialize)]
struct Empty {}

impl SlackClient {
    pub fn new(token: &str, api_base_url: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            client,
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base_url, method)
    }

    async fn read_response<T: DeserializeOwned>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T, ChannelError> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Transport(format!(
                "{method} failed ({status}): {body}"
            )));
        }

        let parsed: SlackResponse<T> = resp
            .json()
            .await
            .map_err(|e| ChannelError::Transport(format!("{method} returned invalid JSON: {e}")))?;

        if !parsed.ok {
            return Err(ChannelError::Api(
                parsed.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        parsed
            .body
            .ok_or_else(|| ChannelError::Transport(format!("{method} returned no payload")))
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, ChannelError> {
        let resp = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        Self::read_response(method, resp).await
    }
}

#[async_trait]
impl FileChannel for SlackClient {
    async fn upload_file(
        &self,
        path: &Path,
        title: &str,
        filename: &str,
        initial_comment: &str,
    ) -> Result<(), ChannelError> {
        let data = tokio::fs::read(path).await?;
        let length = data.len().to_string();

        // Step 1: reserve an upload URL
        let resp = self
            .client
            .post(self.method_url("files.getUploadURLExternal"))
            .bearer_auth(&self.token)
            .form(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        let target: UploadUrl = Self::read_response("files.getUploadURLExternal", resp).await?;

        // Step 2: send the bytes
        let resp = self
            .client
            .post(&target.upload_url)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ChannelError::Transport(format!(
                "file upload failed ({status})"
            )));
        }

        // Step 3: finalize and attach the title/comment
        let _: Empty = self
            .call_json(
                "files.completeUploadExternal",
                &serde_json::json!({
                    "files": [{ "id": target.file_id, "title": title }],
                    "initial_comment": initial_comment,
                }),
            )
            .await?;

        tracing::debug!(file_id = %target.file_id, "Slack upload completed");
        Ok(())
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChannelError> {
        let _: Empty = self
            .call_json(
                "chat.postMessage",
                &serde_json::json!({ "channel": channel, "text": text }),
            )
            .await?;
        Ok(())
    }
}
