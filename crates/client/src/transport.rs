//! Shared request plumbing for the three backend service clients.
//!
//! Every authenticated request in the engine goes through [`Transport`].
//! That makes it the single place where the two session policies live:
//!
//! - **No token, no request.** If the session holds no credential, the call
//!   fails with [`ApiError::Unauthenticated`] before a request is even
//!   built, so unauthenticated operations are guaranteed to issue zero
//!   network calls.
//! - **401 invalidates the session.** Any unauthorized response invalidates
//!   the session exactly once (see [`Session::on_unauthorized`]) and aborts
//!   the calling operation with [`ApiError::Unauthorized`]. Call sites never
//!   reimplement this.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;
use crate::session::Session;

/// How much of an unexpected response body ends up in logs and errors.
const BODY_SNIPPET_LEN: usize = 200;

/// Authenticated JSON transport shared by the service clients.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    http: reqwest::Client,
    session: Session,
}

impl Transport {
    /// Create a transport bound to a session.
    ///
    /// Timeouts are whatever reqwest defaults to unless `timeout` overrides
    /// them; there are no per-operation deadlines anywhere in the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(session: Session, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(TransportInner {
                http: builder.build()?,
                session,
            }),
        })
    }

    /// The session this transport authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(self.inner.http.get(url)).await?;
        read_json(response).await
    }

    /// POST a JSON body and parse a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.inner.http.post(url).json(body)).await?;
        read_json(response).await
    }

    /// POST a JSON body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post_unit<B>(&self, url: Url, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.inner.http.post(url).json(body)).await?;
        Ok(())
    }

    /// PUT without a body (parameters ride in the URL) and parse a JSON
    /// response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(self.inner.http.put(url)).await?;
        read_json(response).await
    }

    /// DELETE a resource, ignoring the response body.
    ///
    /// 200 and 204 both count as success - reqwest treats any 2xx as
    /// success, which is exactly the tolerance the cart-clear endpoint
    /// needs.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete(&self, url: Url) -> Result<(), ApiError> {
        self.send(self.inner.http.delete(url)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let Some(token) = self.inner.session.token() else {
            return Err(ApiError::Unauthenticated);
        };

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.inner.session.on_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = extract_message(response).await;
            tracing::error!(
                status = status.as_u16(),
                message = %message,
                "service returned non-success status"
            );
            return Err(ApiError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Pull the service's own error message out of a failure response.
///
/// The backends answer either `{"message": "..."}` or a bare text body;
/// both are surfaced verbatim so the UI can show the server's wording.
pub(crate) async fn extract_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        return parsed.message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.chars().take(BODY_SNIPPET_LEN).collect()
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    // Read as text first for better diagnostics on malformed bodies.
    let text = response.text().await?;
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::error!(
                error = %e,
                body = %text.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
                "failed to parse service response"
            );
            Err(ApiError::Parse(e))
        }
    }
}
