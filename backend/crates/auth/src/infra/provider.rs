//! External Authorization Provider Client
//!
//! The session/token issuer delegates to an OAuth-style provider. Token
//! issuance is a three-hop sequential chain (client credentials, then an
//! authorization code, then the access token) with no retry; inbound
//! bearer tokens are validated against the introspection endpoint.

use serde::{Deserialize, Serialize};

use crate::application::config::ProviderConfig;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Provider client credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Issued access token with its expiry (epoch milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub expires: i64,
}

/// Result of bearer-token introspection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Introspection {
    pub active: bool,
    /// Subject username the token was issued to
    #[serde(default)]
    pub username: String,
    /// Token expiry (epoch milliseconds)
    #[serde(default)]
    pub expires: i64,
}

/// Token provider trait
#[trait_variant::make(TokenProvider: Send)]
pub trait LocalTokenProvider {
    /// Fetch client credentials
    async fn fetch_client(&self) -> AuthResult<ClientCredentials>;

    /// Obtain an authorization code for a user
    async fn authorize(&self, client_id: &str, user_id: &UserId) -> AuthResult<String>;

    /// Exchange an authorization code for an access token
    async fn exchange(&self, code: &str, client: &ClientCredentials) -> AuthResult<TokenGrant>;

    /// Introspect a bearer token
    async fn introspect(&self, bearer: &str) -> AuthResult<Introspection>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeRequest<'a> {
    client_id: &'a str,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeResponse {
    code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// HTTP-backed provider client.
///
/// Timeouts and cancellation follow the reqwest client defaults; the
/// orchestrator imposes no deadlines of its own.
#[derive(Debug, Clone)]
pub struct HttpTokenProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpTokenProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

impl TokenProvider for HttpTokenProvider {
    async fn fetch_client(&self) -> AuthResult<ClientCredentials> {
        let response = self
            .client
            .get(&self.config.client_url)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "client endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<ClientCredentials>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn authorize(&self, client_id: &str, user_id: &UserId) -> AuthResult<String> {
        let response = self
            .client
            .post(&self.config.authorize_url)
            .json(&AuthorizeRequest {
                client_id,
                user_id: user_id.to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "authorize endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .json::<AuthorizeResponse>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        Ok(body.code)
    }

    async fn exchange(&self, code: &str, client: &ClientCredentials) -> AuthResult<TokenGrant> {
        let response = self
            .client
            .post(&self.config.token_url)
            .json(&ExchangeRequest {
                code,
                client_id: &client.client_id,
                client_secret: &client.client_secret,
            })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn introspect(&self, bearer: &str) -> AuthResult<Introspection> {
        let response = self
            .client
            .post(&self.config.introspect_url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "introspect endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<Introspection>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }
}
