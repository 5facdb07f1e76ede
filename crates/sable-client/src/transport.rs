use reqwest::{Client, Url};
use tracing::{debug, warn};

use sable_types::api::StreamChatRequest;

use crate::accumulator::{TextStream, accumulate};
use crate::error::ClientError;

/// Adapter for the backend's custom `/stream-chat` HTTP endpoint.
///
/// No timeout and no retry: a dropped connection simply ends the stream.
#[derive(Clone)]
pub struct ChatTransport {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl ChatTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let endpoint = join_url(base_url, "stream-chat")?;
        Ok(Self {
            client,
            endpoint,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POSTs the request and returns the reply as a growing string.
    ///
    /// A non-OK status is turned into `ClientError::Http` with the message
    /// pulled from the body.
    pub async fn stream_chat(&self, req: &StreamChatRequest) -> Result<TextStream, ClientError> {
        debug!(
            "stream-chat: chat={} model={:?} reasoning={:?} len={}",
            req.chat_id,
            req.model,
            req.use_reasoning,
            req.content.len()
        );

        let mut builder = self.client.post(self.endpoint.clone()).json(req);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = ClientError::from_response_body(status, &body);
            warn!("stream-chat failed ({}): {}", status, err);
            return Err(err);
        }

        Ok(accumulate(resp.bytes_stream()))
    }
}

/// Joins `path` onto `base`, keeping any path prefix `base` already has.
pub(crate) fn join_url(base: &str, path: &str) -> Result<Url, ClientError> {
    let normalized = format!("{}/", base.trim_end_matches('/'));
    let base = Url::parse(&normalized).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
    base.join(path)
        .map_err(|e| ClientError::InvalidUrl(format!("{base}{path}: {e}")))
}
