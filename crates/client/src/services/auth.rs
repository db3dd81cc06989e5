//! Auth service client.
//!
//! Sign-in is the one unauthenticated call in the engine, so this client
//! deliberately bypasses [`crate::transport::Transport`] (which would refuse
//! to send without a token) and owns a bare HTTP client instead.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::ApiError;
use crate::session::UserProfile;
use crate::transport::extract_message;

const SIGNIN_PATH: &str = "/api/auth/signin";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    username_or_email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
    #[serde(default)]
    username: Option<String>,
}

/// A successful sign-in: the bearer token plus whatever identity the auth
/// service attached to it.
pub struct SignIn {
    pub token: SecretString,
    pub user: Option<UserProfile>,
}

/// Thin client for the auth service's sign-in endpoint.
#[derive(Clone)]
pub struct AuthServiceClient {
    http: reqwest::Client,
    base: Url,
}

impl AuthServiceClient {
    /// Create a client for the auth service at `base`.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// `ApiError::Service` with the auth service's message on bad
    /// credentials (it answers 401 here, which is a sign-in failure, not a
    /// dead session - there is no session yet to invalidate).
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<SignIn, ApiError> {
        let mut url = self.base.clone();
        url.set_path(SIGNIN_PATH);

        let response = self
            .http
            .post(url)
            .json(&SignInRequest {
                username_or_email,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = extract_message(response).await;
            tracing::warn!(status = status.as_u16(), message = %message, "sign-in rejected");
            return Err(ApiError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: SignInResponse = response.json().await?;
        Ok(SignIn {
            token: SecretString::from(body.access_token),
            user: body.username.map(|username| UserProfile { username }),
        })
    }
}
