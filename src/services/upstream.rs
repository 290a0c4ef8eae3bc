//! Shared HTTP client for the *arr / Seerr REST APIs
//!
//! Every request carries the static `X-Api-Key` header. Non-2xx responses and
//! transport faults are reported uniformly as [UpstreamError]; this layer does
//! not retry. Callers decide whether a failure becomes a safe default or a
//! reported error.

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::UpstreamConfig;

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Failure talking to an upstream system
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },

    #[error("failed to decode response of {method} {path}: {source}")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// HTTP status if the upstream answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authenticated JSON client bound to one upstream API root
#[derive(Clone)]
pub struct UpstreamClient {
    name: &'static str,
    api_root: String,
    api_key: String,
    client: Client,
}

impl UpstreamClient {
    /// `api_prefix` is the versioned path segment, e.g. `/api/v3`
    pub fn new(name: &'static str, config: &UpstreamConfig, api_prefix: &str) -> Self {
        Self {
            name,
            api_root: format!("{}{}", config.base_url, api_prefix),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }

    /// Display name of the upstream system ("Radarr", "Sonarr", ...)
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        self.get_with_query(path, &[] as &[(&str, &str)]).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.send(Method::GET, path, |req| req.query(query)).await?;
        Self::decode(Method::GET, path, response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, path, |req| req.json(body)).await?;
        Self::decode(Method::POST, path, response).await
    }

    /// POST without a request body, ignoring whatever the upstream answers with
    pub async fn post_empty(&self, path: &str) -> Result<(), UpstreamError> {
        self.send(Method::POST, path, |req| req).await?;
        Ok(())
    }

    pub async fn delete<Q>(&self, path: &str, query: &Q) -> Result<(), UpstreamError>
    where
        Q: Serialize + ?Sized,
    {
        self.send(Method::DELETE, path, |req| req.query(query)).await?;
        Ok(())
    }

    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<Response, UpstreamError>
    where
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        debug!(upstream = %self.name, method = %method, path = %path, "Upstream request");

        let request = self
            .client
            .request(method.clone(), self.url(path))
            .header(API_KEY_HEADER, &self.api_key);

        let response = build(request)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                method: method.clone(),
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                method,
                path: path.to_string(),
                status,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        method: Method,
        path: &str,
        response: Response,
    ) -> Result<T, UpstreamError> {
        response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode {
                method,
                path: path.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("name", &self.name)
            .field("api_root", &self.api_root)
            .finish()
    }
}
