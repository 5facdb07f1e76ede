use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use sable_types::backend::{FunctionKind, FunctionRequest, FunctionResponse};

use crate::error::ClientError;
use crate::transport::join_url;

/// HTTP client for the managed backend's generated function endpoints.
///
/// Bearer tokens are forwarded verbatim; the backend does all validation.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let base = join_url(base_url, "")?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        args: Value,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.call(FunctionKind::Query, path, args, token).await
    }

    pub async fn mutation<T: DeserializeOwned>(
        &self,
        path: &str,
        args: Value,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.call(FunctionKind::Mutation, path, args, token).await
    }

    pub async fn action<T: DeserializeOwned>(
        &self,
        path: &str,
        args: Value,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.call(FunctionKind::Action, path, args, token).await
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        kind: FunctionKind,
        path: &str,
        args: Value,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        let url = self
            .base
            .join(kind.endpoint())
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let mut builder = self.client.post(url).json(&FunctionRequest::new(path, args));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            debug!("{:?} {} -> {}", kind, path, status);
            return Err(ClientError::from_response_body(status, &body));
        }

        match serde_json::from_str::<FunctionResponse>(&body)? {
            FunctionResponse::Success { value } => Ok(serde_json::from_value(value)?),
            FunctionResponse::Error { error_message, .. } => {
                debug!("{:?} {} -> backend error: {}", kind, path, error_message);
                Err(ClientError::Backend {
                    message: error_message,
                })
            }
        }
    }

    /// Polls a query and publishes every changed result.
    ///
    /// Stands in for the backend's push subscription when only its HTTP
    /// surface is reachable. The first value is `None` until the first
    /// successful fetch. Failed polls are logged and skipped. The task exits
    /// once every receiver is dropped.
    pub fn watch_query<T>(
        &self,
        path: impl Into<String>,
        args: Value,
        token: Option<String>,
        period: Duration,
    ) -> watch::Receiver<Option<T>>
    where
        T: DeserializeOwned + PartialEq + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let backend = self.clone();
        let path = path.into();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!("watching query {} every {:?}", path, period);

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {}
                }

                match backend.query::<T>(&path, args.clone(), token.as_deref()).await {
                    Ok(value) => {
                        tx.send_if_modified(|current| {
                            if current.as_ref() == Some(&value) {
                                false
                            } else {
                                *current = Some(value);
                                true
                            }
                        });
                    }
                    Err(e) => warn!("watch {} poll failed: {}", path, e),
                }
            }

            debug!("watch {} stopped: no receivers", path);
        });

        rx
    }
}
