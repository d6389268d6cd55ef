//! The one place outgoing calls go through.
//!
//! Every request gets the current bearer token (if any) and a request id.
//! A 401 from any endpoint ends the session and redirects to login once per
//! response; all other failures reach the caller untouched. No retries, no
//! caching, no de-duplication.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ConsoleConfig;
use crate::error::{ApiError, ErrorDetail};
use crate::guard::{Navigator, Route};
use crate::session::SessionContext;

pub const API_PREFIX: &str = "/api/v1";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: &ConsoleConfig,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = self.send(request).await?;
        decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        let response = self.send(request).await?;
        decode(response).await
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path).form(form);
        let response = self.send(request).await?;
        decode(response).await
    }

    /// POST without a body, decoding the response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::POST, path)).await?;
        decode(response).await
    }

    /// POST without a body, ignoring whatever comes back.
    pub async fn post_discard(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, path)).await?;
        Ok(())
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path).json(body);
        let response = self.send(request).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4();
        let mut request = request.header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        debug!(%request_id, %method, %path, "sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(%request_id, %method, %path, "request failed: {}", e);
            ApiError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // local state is dropped before anything else is awaited
        if status == StatusCode::UNAUTHORIZED {
            warn!(%request_id, %method, %path, "authentication rejected, forcing logout");
            if let Err(e) = self.session.end().await {
                warn!(%request_id, "failed to clear persisted session: {}", e);
            }
            self.navigator.redirect(Route::Login);
        } else {
            debug!(%request_id, %method, %path, status = status.as_u16(), "request returned an error");
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, ErrorDetail::parse(&body)))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("failed to parse response body: {}", e);
        ApiError::Decode(e.to_string())
    })
}
