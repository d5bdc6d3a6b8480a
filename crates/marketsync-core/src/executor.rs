//! Authenticated request execution and response classification.
//!
//! [`classify_response`] is the only place where HTTP status codes turn into
//! [`MarketplaceError`] kinds; adapters work with typed payloads and never
//! inspect raw statuses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::http_client::{HttpAuth, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::throttling::RequestPacer;
use crate::{MarketplaceError, DEFAULT_TIMEOUT_MS};

/// Credentials attached to every outgoing call.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    access_token: String,
    api_key: String,
}

impl ApiCredentials {
    pub fn new(access_token: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_key: api_key.into(),
        }
    }

    fn auth_headers(&self) -> [HttpAuth; 2] {
        [
            HttpAuth::BearerToken(self.access_token.clone()),
            HttpAuth::Header {
                name: String::from("x-api-key"),
                value: self.api_key.clone(),
            },
        ]
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredentials(<redacted>)")
    }
}

/// Issues calls to one marketplace over an injected transport.
#[derive(Clone)]
pub struct RequestExecutor {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
    pacer: Option<Arc<RequestPacer>>,
}

impl RequestExecutor {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            pacer: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_pacer(mut self, pacer: Option<Arc<RequestPacer>>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// `GET` and decode the payload; an empty 204 is a transport error here.
    pub async fn get<T>(&self, url: &str, credentials: &ApiCredentials) -> Result<T, MarketplaceError>
    where
        T: DeserializeOwned,
    {
        let body = self
            .execute(HttpMethod::Get, url, credentials, None)
            .await?
            .ok_or_else(|| MarketplaceError::transport(format!("empty response from GET {url}")))?;
        decode(&body)
    }

    /// Sends a JSON body and decodes the payload, if any.
    pub async fn send<T, B>(
        &self,
        method: HttpMethod,
        url: &str,
        credentials: &ApiCredentials,
        body: &B,
    ) -> Result<Option<T>, MarketplaceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(body).map_err(|error| {
            MarketplaceError::invalid_request(format!("failed to encode request body: {error}"))
        })?;

        match self.execute(method, url, credentials, Some(payload)).await? {
            Some(body) => decode(&body).map(Some),
            None => Ok(None),
        }
    }

    /// `DELETE`; any success status counts, the payload is ignored.
    pub async fn delete(&self, url: &str, credentials: &ApiCredentials) -> Result<(), MarketplaceError> {
        self.execute(HttpMethod::Delete, url, credentials, None)
            .await
            .map(|_| ())
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        credentials: &ApiCredentials,
        body: Option<String>,
    ) -> Result<Option<String>, MarketplaceError> {
        if let Some(pacer) = &self.pacer {
            pacer.acquire().await;
        }

        let mut request = HttpRequest::new(method, url).with_timeout_ms(self.timeout_ms);
        for auth in credentials.auth_headers() {
            request = request.with_auth(&auth);
        }
        if let Some(body) = body {
            request = request
                .with_header("content-type", "application/json")
                .with_body(body);
        }

        let response = self.http_client.execute(request).await.map_err(|error| {
            debug!(%method, url, error = error.message(), "transport failure");
            MarketplaceError::transport(format!("{method} {url} failed: {}", error.message()))
        })?;

        debug!(%method, url, status = response.status, "response received");
        classify_response(response)
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout_ms", &self.timeout_ms)
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

/// Maps a raw response onto success (optional body) or a classified error.
pub fn classify_response(response: HttpResponse) -> Result<Option<String>, MarketplaceError> {
    match response.status {
        429 => Err(MarketplaceError::rate_limited(format!(
            "rate limited by marketplace: {}",
            response.body
        ))),
        401 => Err(MarketplaceError::authentication(format!(
            "credentials rejected: {}",
            response.body
        ))),
        204 => Ok(None),
        status if response.is_error() => Err(MarketplaceError::remote(status, response.body)),
        status => {
            if response.body.trim().is_empty() {
                debug!(status, "success without payload");
                Ok(None)
            } else {
                Ok(Some(response.body))
            }
        }
    }
}

fn decode<T>(body: &str) -> Result<T, MarketplaceError>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|error| {
        MarketplaceError::transport(format!("failed to decode response payload: {error}"))
    })
}
