//! Shared transport: base URL, JSON encoding and the cache discipline
//! every operation goes through

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Url,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    cache::{CacheKey, TagCache},
    config::ApiConfig,
    error::{AppError, AppResult},
    models::ApiResponse,
};

use super::endpoints::Endpoint;

/// Whether a read may be answered from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    #[default]
    Cached,
    Fresh,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    cache: TagCache,
}

impl ApiClient {
    /// Build the client from the API settings; all requests share its headers
    pub fn new(config: &ApiConfig, cache: TagCache) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            AppError::Config(::config::ConfigError::Message(format!(
                "invalid api.base_url {:?}: {}",
                config.base_url, e
            )))
        })?;

        Ok(Self {
            http: builder.build()?,
            base_url,
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    /// Run a read endpoint, answering from the cache when allowed
    pub async fn query<T>(
        &self,
        endpoint: &Endpoint,
        id: Option<&str>,
        fetch: Fetch,
    ) -> AppResult<ApiResponse<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let key = CacheKey::new(endpoint.name, id);
        if fetch == Fetch::Cached {
            if let Some(cached) = self.cache.get::<ApiResponse<T>>(&key) {
                return Ok(cached);
            }
        }

        let ticket = self.cache.begin_fetch();
        let response: ApiResponse<T> = self.send::<(), T>(endpoint, id, None).await?;
        self.cache
            .insert(key, endpoint.provided_tags(id), response.clone(), ticket);
        Ok(response)
    }

    /// Run a mutating endpoint and invalidate its tags once the server answered
    pub async fn mutate<B, T>(
        &self,
        endpoint: &Endpoint,
        id: Option<&str>,
        body: Option<&B>,
    ) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let result = self.send(endpoint, id, body).await;
        // A rejected mutation may still have touched server state
        let answered = matches!(
            result,
            Ok(_) | Err(AppError::Server { .. } | AppError::Unsuccessful(_) | AppError::Decode(_))
        );
        if answered {
            self.cache.invalidate(&endpoint.invalidated_tags(id));
        }
        result
    }

    async fn send<B, T>(
        &self,
        endpoint: &Endpoint,
        id: Option<&str>,
        body: Option<&B>,
    ) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint.url(&self.base_url, id)?;
        tracing::debug!(endpoint = endpoint.name, method = ?endpoint.method, url = %url, "sending request");

        let mut request = self.http.request(endpoint.method.into(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(endpoint = endpoint.name, "request failed: {}", e);
            AppError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let raw = String::from_utf8_lossy(&bytes);
            tracing::warn!(endpoint = endpoint.name, status = status.as_u16(), "server rejected request");
            return Err(AppError::from_status(status.as_u16(), &raw));
        }

        decode_envelope(&bytes)
    }
}

/// Decode a 2xx body into the envelope. An empty body counts as success without data.
pub(crate) fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> AppResult<ApiResponse<T>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApiResponse {
            success: true,
            data: None,
            message: None,
            error: None,
        });
    }

    let envelope: ApiResponse<T> =
        serde_json::from_slice(bytes).map_err(|e| AppError::Decode(e.to_string()))?;

    if !envelope.success {
        let reason = envelope
            .message
            .clone()
            .or_else(|| envelope.error.clone())
            .unwrap_or_default();
        return Err(AppError::Unsuccessful(reason));
    }

    Ok(envelope)
}
