//! # Credential Resolution
//!
//! Produces the single [`Credential`] an invocation authenticates with.
//!
//! * [`AuthMode::ClientCredentials`] performs the OAuth2 client-credentials grant against
//!   the account's token endpoint and yields a bearer token.
//! * [`AuthMode::ApiKey`] is used as-is; no network call is made.
//!
//! There is no caching and no refresh: callers resolve once per invocation and reuse the
//! result for every operation of that invocation.
//!
//! Two encodings of the client secret exist in the wild and both are supported, selected by
//! [`SecretEncoding`] rather than guessed: HTTP Basic auth (`client_id:client_secret`,
//! base64, in the `Authorization` header) or a `client_secret` form field.
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Path of the token endpoint under the account's auth domain.
pub const TOKEN_PATH: &str = "/oauth2/token";

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const API_KEY_HEADER: &str = "x-api-key";

const TOKEN_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid auth url '{url}': '{reason}'")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to reach the token endpoint: '{0}'")]
    Request(#[source] reqwest::Error),
    #[error("Token endpoint answered with HTTP {status}: '{body}'")]
    Rejected { status: u16, body: String },
    #[error("Token endpoint returned error '{error}'")]
    Grant { error: String },
    #[error("Token endpoint response has no 'access_token'")]
    MissingAccessToken,
    #[error("Token endpoint response is not valid JSON: '{0}'")]
    InvalidResponse(#[source] serde_json::Error),
}

/// How the client secret travels to the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretEncoding {
    /// `Authorization: Basic base64(client_id:client_secret)`.
    #[default]
    BasicAuth,
    /// `client_secret` as a form field next to `client_id`.
    RequestBody,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub encoding: SecretEncoding,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// The two mutually exclusive ways of authenticating.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    ClientCredentials(ClientCredentials),
    ApiKey(String),
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::ClientCredentials(c) => f.debug_tuple("ClientCredentials").field(c).finish(),
            AuthMode::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

/// A resolved credential, attached to every functional call of an invocation.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer {
        token: String,
        obtained_at: SystemTime,
    },
    ApiKey(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Bearer { obtained_at, .. } => f
                .debug_struct("Bearer")
                .field("token", &"***")
                .field("obtained_at", obtained_at)
                .finish(),
            Credential::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential::Bearer {
            token: token.into(),
            obtained_at: SystemTime::now(),
        }
    }

    /// The one auth header (or metadata entry) this credential puts on a call.
    ///
    /// Names are lowercase so the same pair is valid as an HTTP header and as gRPC
    /// ASCII metadata.
    pub fn auth_header(&self) -> (&'static str, String) {
        match self {
            Credential::Bearer { token, .. } => (AUTHORIZATION_HEADER, format!("Bearer {token}")),
            Credential::ApiKey(key) => (API_KEY_HEADER, key.clone()),
        }
    }
}

/// Appends [`TOKEN_PATH`] to `auth_url` unless it is already there.
///
/// Applying it twice yields the same url.
pub fn token_endpoint(auth_url: &str) -> String {
    let trimmed = auth_url.trim().trim_end_matches('/');
    if trimmed.ends_with(TOKEN_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{TOKEN_PATH}")
    }
}

/// The production auth domain of a customer account, used when none is configured.
pub fn default_auth_url(customer_id: i64) -> String {
    format!("https://vectara-prod-{customer_id}.auth.us-west-2.amazoncognito.com")
}

/// A `reqwest` client suitable for the token endpoint.
///
/// It refuses plain-`http` urls, so the client secret never leaves in cleartext.
/// [`resolve`] accepts any client for local token servers.
pub fn token_http_client() -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .https_only(true)
        .connect_timeout(TOKEN_CONNECT_TIMEOUT)
        .build()
        .map_err(AuthError::Request)
}

/// Resolves `mode` into a [`Credential`].
///
/// API keys resolve without I/O. Client credentials hit the token endpoint exactly once.
pub async fn resolve(http: &reqwest::Client, mode: &AuthMode) -> Result<Credential, AuthError> {
    match mode {
        AuthMode::ApiKey(key) => Ok(Credential::ApiKey(key.clone())),
        AuthMode::ClientCredentials(credentials) => {
            let token = fetch_token(http, credentials).await?;
            Ok(Credential::bearer(token))
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

async fn fetch_token(
    http: &reqwest::Client,
    credentials: &ClientCredentials,
) -> Result<String, AuthError> {
    let url = token_endpoint(&credentials.auth_url);
    reqwest::Url::parse(&url).map_err(|e| AuthError::InvalidUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    let mut form = vec![
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
    ];

    let mut request = http.post(&url);
    match credentials.encoding {
        SecretEncoding::BasicAuth => {
            request = request.basic_auth(&credentials.client_id, Some(&credentials.client_secret));
        }
        SecretEncoding::RequestBody => {
            form.push(("client_secret", credentials.client_secret.as_str()));
        }
    }

    tracing::debug!(%url, encoding = ?credentials.encoding, "requesting client-credentials token");

    let response = request.form(&form).send().await.map_err(AuthError::Request)?;
    let status = response.status();
    let body = response.text().await.map_err(AuthError::Request)?;

    if !status.is_success() {
        tracing::error!(status = status.as_u16(), "token request rejected");
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(AuthError::InvalidResponse)?;

    if let Some(error) = parsed.error {
        tracing::error!(%error, "token endpoint returned an error");
        return Err(AuthError::Grant { error });
    }

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingAccessToken),
    }
}
