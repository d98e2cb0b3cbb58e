use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::future::ready;
use futures::{StreamExt, TryStreamExt};
use keyring::Entry;
use reqwest::{Proxy, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const KEYRING_SERVICE: &str = "flowwrite";

/// JSON-over-HTTP client shared by the provider adapters.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    provider_id: String,
    api_key: Option<String>,
    /// Whole-request limit for JSON calls; idle limit between stream chunks.
    timeout: Duration,
}

impl HttpTransport {
    /// `timeout` overrides `FLOWWRITE_HTTP_TIMEOUT_SECS`. It bounds connecting,
    /// a whole JSON call, and each gap between chunks of a stream. Without an
    /// explicit key the keyring and then `<PROVIDER>_API_KEY` are consulted.
    pub fn new(provider_id: &str, api_key: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let api_key = api_key.or_else(|| Self::get_api_key(provider_id));

        let timeout = timeout.unwrap_or_else(|| {
            Duration::from_secs(
                env::var("FLOWWRITE_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            )
        });

        let mut builder = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(
                env::var("FLOWWRITE_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("FLOWWRITE_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            provider_id: provider_id.to_string(),
            api_key,
            timeout,
        })
    }

    fn get_api_key(provider_id: &str) -> Option<String> {
        // 1. Try Keyring
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, provider_id) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }

        // 2. Try Environment Variable (PROVIDER_API_KEY)
        let env_var = format!("{}_API_KEY", provider_id.to_uppercase());
        env::var(env_var).ok()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        streaming: bool,
    ) -> Result<reqwest::Response> {
        let mut req = self.client.post(url).json(body);
        if !streaming {
            req = req.timeout(self.timeout);
        }
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if streaming {
            req = req.header("accept", "text/event-stream");
        }

        let started = Instant::now();
        let resp = req.send().await.map_err(|e| {
            info!(
                provider = %self.provider_id,
                endpoint = %url,
                duration_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "provider request failed"
            );
            Error::Transport(TransportError::Http(e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let err = provider_error(status, resp).await;
            info!(
                provider = %self.provider_id,
                endpoint = %url,
                status = status.as_u16(),
                duration_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "provider rejected request"
            );
            return Err(err);
        }
        Ok(resp)
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(url, body, false).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<BoxStream<'static, Bytes>> {
        let resp = self.send(url, body, true).await?;
        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));

        // An idle gap past the timeout closes the stream like a cancel would.
        let provider = self.provider_id.clone();
        let idle = self.timeout;
        let guarded = tokio_stream::StreamExt::timeout(byte_stream, idle)
            .take_while(move |item| {
                if item.is_err() {
                    warn!(
                        provider = %provider,
                        idle_ms = idle.as_millis() as u64,
                        "stream idle past timeout, closing"
                    );
                }
                ready(item.is_ok())
            })
            .filter_map(|item| ready(item.ok()));
        Ok(Box::pin(guarded))
    }
}

/// `error.message` from the body when present, else the status line.
async fn provider_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let message = resp
        .bytes()
        .await
        .ok()
        .and_then(|b| serde_json::from_slice::<serde_json::Value>(&b).ok())
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.to_string());
    Error::Provider {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
