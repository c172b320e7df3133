use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    loading::{LoadingGuard, LoadingTracker, GLOBAL_KEY},
};

/// Per-request loading-indicator options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Loading key; `global` when unset
    pub loading_key: Option<String>,
    /// Skip the loading indicator entirely (telemetry, background calls)
    pub silent: bool,
    /// Override of the configured minimum visible duration
    pub min_duration: Option<Duration>,
}

impl RequestOptions {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            loading_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Default::default()
        }
    }
}

/// Thin wrapper over `reqwest::Client` that resolves paths against the
/// backend base URL, applies the blanket timeout, and wraps every call in a
/// loading-counter guard.
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    loading: LoadingTracker,
    min_duration: Duration,
}

impl HttpClient {
    pub fn new(config: &AppConfig, loading: LoadingTracker) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            loading,
            min_duration: config.loading_min_duration,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    /// Absolute URL for a backend path such as "/ads".
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a prepared request, mapping non-success statuses to
    /// `ApiError::Status`.
    pub async fn send(&self, builder: RequestBuilder, opts: &RequestOptions) -> ApiResult<Response> {
        let _guard = self.guard(opts);
        self.dispatch(builder).await
    }

    /// Send and decode a JSON body. The loading guard covers the body read.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        opts: &RequestOptions,
    ) -> ApiResult<T> {
        let _guard = self.guard(opts);
        let bytes = self.dispatch(builder).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q, opts: &RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::GET, path).query(query), opts)
            .await
    }

    /// Send `body` as JSON with `method`, discarding the response body.
    pub async fn call_json<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        opts: &RequestOptions,
    ) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(method, path).json(body), opts)
            .await
            .map(drop)
    }

    fn guard(&self, opts: &RequestOptions) -> Option<LoadingGuard> {
        (!opts.silent).then(|| {
            self.loading.hold(
                opts.loading_key.as_deref().unwrap_or(GLOBAL_KEY),
                opts.min_duration.unwrap_or(self.min_duration),
            )
        })
    }

    async fn dispatch(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::debug!("backend error {}: {}", status, body);
        Err(ApiError::from_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = HttpClient::new(
            &AppConfig::with_base_url("https://ads.example.com/"),
            LoadingTracker::new(),
        )
        .unwrap();
        assert_eq!(client.url("/ads"), "https://ads.example.com/ads");
        assert_eq!(client.url("stats/daily"), "https://ads.example.com/stats/daily");
    }
}
