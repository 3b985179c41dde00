//! # Configuration
//!
//! Process configuration is loaded once at startup (by the CLI, from flags and
//! environment) and validated here before anything touches the network. The main rule
//! enforced is that exactly one kind of credential is configured.
use crate::auth::{self, AuthMode, ClientCredentials, SecretEncoding};
use crate::endpoint::{Endpoint, Endpoints};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Both an API key and OAuth2 client credentials are configured, use exactly one")]
    ConflictingCredentials,
    #[error("No credentials configured, provide an API key or a client id and secret")]
    MissingCredentials,
    #[error("Incomplete OAuth2 client credentials: '{0}' is missing")]
    IncompleteClientCredentials(&'static str),
    #[error("No host configured for the {0} endpoint")]
    MissingEndpoint(Endpoint),
    #[error("Unknown transport '{0}', expected 'rest' or 'grpc'")]
    UnknownTransport(String),
}

/// Which wire protocol operations travel over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    #[default]
    Rest,
    Grpc,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" | "http" => Ok(TransportKind::Rest),
            "grpc" => Ok(TransportKind::Grpc),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Rest => f.write_str("rest"),
            TransportKind::Grpc => f.write_str("grpc"),
        }
    }
}

/// Raw, possibly conflicting, credential inputs.
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub api_key: Option<String>,
    pub auth_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub secret_encoding: SecretEncoding,
}

impl AuthSettings {
    /// Picks the single [`AuthMode`] these inputs describe.
    ///
    /// Blank strings count as absent. Without an explicit auth url the customer's
    /// production auth domain is used.
    pub fn into_mode(self, customer_id: i64) -> Result<AuthMode, ConfigError> {
        let api_key = non_blank(self.api_key);
        let client_id = non_blank(self.client_id);
        let client_secret = non_blank(self.client_secret);

        match (api_key, client_id, client_secret) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err(ConfigError::ConflictingCredentials)
            }
            (Some(key), None, None) => Ok(AuthMode::ApiKey(key)),
            (None, Some(client_id), Some(client_secret)) => {
                let auth_url = non_blank(self.auth_url).unwrap_or_else(|| {
                    let url = auth::default_auth_url(customer_id);
                    tracing::info!(%url, "no auth url configured, using the account default");
                    url
                });
                Ok(AuthMode::ClientCredentials(ClientCredentials {
                    auth_url,
                    client_id,
                    client_secret,
                    encoding: self.secret_encoding,
                }))
            }
            (None, Some(_), None) => Err(ConfigError::IncompleteClientCredentials("client_secret")),
            (None, None, Some(_)) => Err(ConfigError::IncompleteClientCredentials("client_id")),
            (None, None, None) => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub customer_id: i64,
    pub endpoints: Endpoints,
    pub auth: AuthMode,
    pub transport: TransportKind,
}

impl Settings {
    pub fn new(
        customer_id: i64,
        endpoints: Endpoints,
        auth: AuthSettings,
        transport: TransportKind,
    ) -> Result<Self, ConfigError> {
        if let Some(endpoint) = endpoints.missing().into_iter().next() {
            return Err(ConfigError::MissingEndpoint(endpoint));
        }

        Ok(Self {
            customer_id,
            auth: auth.into_mode(customer_id)?,
            endpoints,
            transport,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_settings() -> AuthSettings {
        AuthSettings {
            auth_url: Some("https://auth.example.com".into()),
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn both_credentials_is_a_config_error() {
        let settings = AuthSettings {
            api_key: Some("zqt_key".into()),
            ..client_settings()
        };

        assert!(matches!(
            settings.into_mode(1),
            Err(ConfigError::ConflictingCredentials)
        ));
    }

    #[test]
    fn api_key_alone_is_accepted() {
        let settings = AuthSettings {
            api_key: Some("zqt_key".into()),
            client_id: Some("  ".into()),
            ..Default::default()
        };

        assert_eq!(settings.into_mode(1).unwrap(), AuthMode::ApiKey("zqt_key".into()));
    }

    #[test]
    fn client_credentials_fall_back_to_default_auth_url() {
        let settings = AuthSettings {
            auth_url: None,
            ..client_settings()
        };

        let AuthMode::ClientCredentials(credentials) = settings.into_mode(77).unwrap() else {
            panic!("Expected client credentials");
        };
        assert_eq!(credentials.auth_url, auth::default_auth_url(77));
        assert_eq!(credentials.encoding, SecretEncoding::BasicAuth);
    }

    #[test]
    fn partial_or_missing_credentials_are_rejected() {
        let only_id = AuthSettings {
            client_secret: None,
            ..client_settings()
        };
        assert!(matches!(
            only_id.into_mode(1),
            Err(ConfigError::IncompleteClientCredentials("client_secret"))
        ));
        assert!(matches!(
            AuthSettings::default().into_mode(1),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn settings_require_every_endpoint() {
        let endpoints = Endpoints::per_function("admin.example.com", "", "serving.example.com");
        let result = Settings::new(1, endpoints, client_settings(), TransportKind::Rest);

        assert!(matches!(
            result,
            Err(ConfigError::MissingEndpoint(Endpoint::Indexing))
        ));
    }

    #[test]
    fn parses_transport_kind() {
        assert_eq!("gRPC".parse::<TransportKind>().unwrap(), TransportKind::Grpc);
        assert_eq!("rest".parse::<TransportKind>().unwrap(), TransportKind::Rest);
        assert!("soap".parse::<TransportKind>().is_err());
    }
}
