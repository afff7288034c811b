//! Google OAuth2 client: consent redirect, code exchange, userinfo fetch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::GoogleError;
use super::types::{OAuthState, TokenErrorResponse, TokenResponse};
use crate::config::GoogleConfig;

/// The only scope requested: the user's email address (plus their stable id).
pub const USERINFO_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

/// Google OAuth2 client.
///
/// Cheap to clone. Built once at startup with the request timeout applied to
/// every call. Failed calls are not retried.
#[derive(Clone)]
pub struct GoogleClient {
    inner: Arc<GoogleClientInner>,
}

struct GoogleClientInner {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: Url,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient")
            .field("client_id", &self.inner.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.inner.redirect_uri.as_str())
            .finish_non_exhaustive()
    }
}

impl GoogleClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GoogleError::Client` if the HTTP client fails to build.
    pub fn new(config: &GoogleConfig, timeout: Duration) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GoogleError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(GoogleClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                auth_url: config.auth_url.clone(),
                token_url: config.token_url.clone(),
                userinfo_url: config.userinfo_url.clone(),
            }),
        })
    }

    /// URL of Google's consent screen for this sign-in attempt.
    #[must_use]
    pub fn authorization_url(&self, state: &OAuthState) -> String {
        let mut url = self.inner.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("redirect_uri", self.inner.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", USERINFO_EMAIL_SCOPE)
            .append_pair("state", state.as_str());
        url.into()
    }

    /// Exchange an authorization code for the signed-in user's profile.
    ///
    /// Returns the userinfo response body undecoded.
    ///
    /// # Errors
    ///
    /// * `InvalidState` if `state` does not belong to `expected`; nothing is sent.
    /// * `TokenExchange` if the token endpoint fails or rejects the code.
    /// * `ProfileFetch` if the userinfo request fails or returns an error status.
    /// * `ProfileRead` if the userinfo body cannot be read.
    /// * `Timeout` if either call exceeds the request timeout.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        expected: &OAuthState,
        state: &str,
        code: &str,
    ) -> Result<Vec<u8>, GoogleError> {
        if !expected.matches(state) {
            warn!("OAuth callback state does not match this flow");
            return Err(GoogleError::InvalidState);
        }

        let access_token = self.request_token(code).await?;
        self.fetch_profile(&access_token).await
    }

    async fn request_token(&self, code: &str) -> Result<SecretString, GoogleError> {
        let inner = &self.inner;
        let response = inner
            .client
            .post(inner.token_url.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", inner.client_id.as_str()),
                ("client_secret", inner.client_secret.expose_secret()),
                ("redirect_uri", inner.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GoogleError::from_transport(e, GoogleError::TokenExchange))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<TokenErrorResponse>()
                .await
                .map_or_else(|_| status.to_string(), |body| body.error);
            warn!(%status, %reason, "Token endpoint rejected authorization code");
            return Err(GoogleError::TokenExchange(format!(
                "token endpoint returned {status}: {reason}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            GoogleError::from_transport(e, |msg| {
                GoogleError::TokenExchange(format!("invalid token response: {msg}"))
            })
        })?;

        debug!("Exchanged authorization code for access token");
        Ok(SecretString::from(token.access_token))
    }

    async fn fetch_profile(&self, access_token: &SecretString) -> Result<Vec<u8>, GoogleError> {
        let inner = &self.inner;
        let response = inner
            .client
            .get(inner.userinfo_url.clone())
            .query(&[("access_token", access_token.expose_secret())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GoogleError::from_transport(e, GoogleError::ProfileFetch))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| GoogleError::from_transport(e, GoogleError::ProfileRead))?;

        debug!(bytes = body.len(), "Fetched userinfo");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn config(server_url: &str) -> GoogleConfig {
        GoogleConfig {
            client_id: "client-1".to_string(),
            client_secret: SecretString::from("shh"),
            redirect_uri: Url::parse("https://admin.x.com/auth/callback").unwrap(),
            auth_url: Url::parse(&format!("{server_url}/auth")).unwrap(),
            token_url: Url::parse(&format!("{server_url}/token")).unwrap(),
            userinfo_url: Url::parse(&format!("{server_url}/userinfo")).unwrap(),
        }
    }

    fn client(server: &Server) -> GoogleClient {
        GoogleClient::new(&config(&server.url()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_authorization_url() {
        let server = Server::new_async().await;
        let state = OAuthState::generate();

        let url = Url::parse(&client(&server).authorization_url(&state)).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/auth");
        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["redirect_uri"], "https://admin.x.com/auth/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], USERINFO_EMAIL_SCOPE);
        assert_eq!(pairs["state"], state.as_str());
    }

    #[tokio::test]
    async fn test_exchange_code_returns_raw_profile() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "code-1".into()),
                Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                Matcher::UrlEncoded("client_secret".into(), "shh".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "https://admin.x.com/auth/callback".into(),
                ),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        let userinfo = server
            .mock("GET", "/userinfo")
            .match_query(Matcher::UrlEncoded("access_token".into(), "tok-1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"pid1","email":"a@x.com"}"#)
            .create_async()
            .await;

        let state = OAuthState::generate();
        let body = client(&server)
            .exchange_code(&state, state.as_str(), "code-1")
            .await
            .unwrap();

        assert_eq!(body, br#"{"id":"pid1","email":"a@x.com"}"#);
        token.assert_async().await;
        userinfo.assert_async().await;
    }

    #[tokio::test]
    async fn test_state_mismatch_sends_nothing() {
        let mut server = Server::new_async().await;
        let token = server.mock("POST", "/token").expect(0).create_async().await;

        let state = OAuthState::generate();
        let err = client(&server)
            .exchange_code(&state, "forged", "code-1")
            .await
            .unwrap_err();

        assert!(matches!(err, GoogleError::InvalidState));
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_code_is_token_exchange_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"Bad Request"}"#)
            .create_async()
            .await;
        let userinfo = server.mock("GET", "/userinfo").expect(0).create_async().await;

        let state = OAuthState::generate();
        let err = client(&server)
            .exchange_code(&state, state.as_str(), "stale")
            .await
            .unwrap_err();

        assert!(matches!(err, GoogleError::TokenExchange(ref m) if m.contains("invalid_grant")));
        userinfo.assert_async().await;
    }

    #[tokio::test]
    async fn test_userinfo_error_status_is_profile_fetch_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_body(r#"{"access_token":"tok-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let state = OAuthState::generate();
        let err = client(&server)
            .exchange_code(&state, state.as_str(), "code-1")
            .await
            .unwrap_err();

        match err {
            GoogleError::ProfileFetch(msg) => assert!(!msg.contains("tok-1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_token_exchange_error() {
        let mut config = config("http://127.0.0.1:9");
        config.token_url = Url::parse("http://127.0.0.1:9/token").unwrap();
        let client = GoogleClient::new(&config, Duration::from_secs(5)).unwrap();

        let state = OAuthState::generate();
        let err = client
            .exchange_code(&state, state.as_str(), "code-1")
            .await
            .unwrap_err();

        assert!(matches!(err, GoogleError::TokenExchange(_) | GoogleError::Timeout));
    }
}
