use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vectara_core::auth::AuthError;
use vectara_core::client::{ClientError, TransportError};
use vectara_core::config::ConfigError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Token(#[from] AuthError),
    #[error("{0}")]
    Platform(ClientError),
    #[error("Failed to read '{path}': {source}")]
    UploadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ClientError> for ServerError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth(err) => ServerError::Token(err),
            err => ServerError::Platform(err),
        }
    }
}

impl From<TransportError> for ServerError {
    fn from(err: TransportError) -> Self {
        ServerError::Platform(ClientError::Transport(err))
    }
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Config(_) | ServerError::Platform(ClientError::MissingCorpus(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Token(_) | ServerError::Platform(ClientError::Auth(_)) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::Platform(ClientError::Transport(_)) => StatusCode::BAD_GATEWAY,
            ServerError::UploadFile { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            ServerError::Config(_) => "Invalid request.",
            ServerError::Token(_) | ServerError::Platform(ClientError::Auth(_)) => {
                "Could not obtain OAuth token."
            }
            ServerError::Platform(_) => "Platform call failed.",
            ServerError::UploadFile { .. } => "Could not read the upload file.",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(status = %status, error = %self, "request failed");

        let body = Json(json!({
            "detail": self.detail(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_failures_keep_the_oauth_detail() {
        let response = ServerError::Token(AuthError::MissingAccessToken).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Could not obtain OAuth token.");
        assert_eq!(body["message"], "Token endpoint response has no 'access_token'");
    }

    #[test]
    fn client_auth_errors_become_token_errors() {
        let err = ServerError::from(ClientError::Auth(AuthError::MissingAccessToken));

        assert!(matches!(err, ServerError::Token(AuthError::MissingAccessToken)));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_credentials_are_bad_requests() {
        let err = ServerError::Config(ConfigError::MissingCredentials);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Invalid request.");
    }
}
