use mockito::Matcher;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vectara_core::auth::{self, AuthError, AuthMode, ClientCredentials, Credential, SecretEncoding};
use vectara_core::client::{Call, ClientError, Transport, TransportError, authenticate};
use vectara_core::config::{AuthSettings, ConfigError, Settings, TransportKind};
use vectara_core::endpoint::Endpoints;
use vectara_core::operation::Response;
use vectara_core::status::StatusResult;

/// Counts dispatches without sending anything.
#[derive(Clone, Default)]
struct SpyTransport {
    dispatched: Arc<AtomicUsize>,
}

impl Transport for SpyTransport {
    fn name(&self) -> &'static str {
        "spy"
    }

    async fn dispatch(&mut self, _call: Call<'_>) -> Result<Response, TransportError> {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        Ok(Response::Status(StatusResult::ok()))
    }
}

fn client_credentials(auth_url: String, encoding: SecretEncoding) -> AuthMode {
    AuthMode::ClientCredentials(ClientCredentials {
        auth_url,
        client_id: "id".into(),
        client_secret: "secret".into(),
        encoding,
    })
}

#[tokio::test]
async fn test_basic_auth_grant_yields_bearer() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth2/token")
        // base64("id:secret")
        .match_header("authorization", "Basic aWQ6c2VjcmV0")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "id".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"tkn-1","token_type":"Bearer","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    let mode = client_credentials(server.url(), SecretEncoding::BasicAuth);
    let credential = auth::resolve(&reqwest::Client::new(), &mode).await.unwrap();

    mock.assert_async().await;
    let (name, value) = credential.auth_header();
    assert_eq!(name, "authorization");
    assert_eq!(value, "Bearer tkn-1");
}

#[tokio::test]
async fn test_request_body_grant_sends_secret_as_form_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth2/token")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "id".into()),
            Matcher::UrlEncoded("client_secret".into(), "secret".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"tkn-2"}"#)
        .create_async()
        .await;

    // An auth url that already names the token endpoint is not extended twice.
    let mode = client_credentials(
        format!("{}/oauth2/token/", server.url()),
        SecretEncoding::RequestBody,
    );
    let credential = auth::resolve(&reqwest::Client::new(), &mode).await.unwrap();

    mock.assert_async().await;
    assert!(matches!(credential, Credential::Bearer { ref token, .. } if token == "tkn-2"));
}

#[tokio::test]
async fn test_api_key_resolves_without_network() {
    let credential = auth::resolve(&reqwest::Client::new(), &AuthMode::ApiKey("zqt_key".into()))
        .await
        .unwrap();

    assert_eq!(credential, Credential::ApiKey("zqt_key".into()));
}

#[tokio::test]
async fn test_malformed_token_responses_are_auth_errors() {
    let mut server = mockito::Server::new_async().await;
    let mode = client_credentials(server.url(), SecretEncoding::BasicAuth);
    let http = reqwest::Client::new();

    let cases: [(usize, &str); 4] = [
        (200, r#"{"token_type":"Bearer"}"#),
        (200, r#"{"error":"invalid_client"}"#),
        (200, "not json"),
        (401, r#"{"error":"unauthorized"}"#),
    ];

    let mut errors = Vec::new();
    for (status, body) in cases {
        let mock = server
            .mock("POST", "/oauth2/token")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;
        errors.push(auth::resolve(&http, &mode).await.unwrap_err());
        mock.remove_async().await;
    }

    assert!(matches!(errors[0], AuthError::MissingAccessToken));
    assert!(matches!(errors[1], AuthError::Grant { ref error } if error == "invalid_client"));
    assert!(matches!(errors[2], AuthError::InvalidResponse(_)));
    assert!(matches!(errors[3], AuthError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_failed_authentication_never_dispatches() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let spy = SpyTransport::default();
    let dispatched = spy.dispatched.clone();
    let opened = Arc::new(AtomicUsize::new(0));
    let mode = client_credentials(server.url(), SecretEncoding::BasicAuth);

    let connect = {
        let opened = opened.clone();
        async move {
            opened.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TransportError>(spy)
        }
    };
    let result = authenticate(&reqwest::Client::new(), &mode, connect).await;

    assert!(matches!(
        result,
        Err(ClientError::Auth(AuthError::MissingAccessToken))
    ));
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    assert_eq!(dispatched.load(Ordering::SeqCst), 0);
}

#[test]
fn test_both_credentials_is_a_config_error() {
    let auth = AuthSettings {
        api_key: Some("zqt_key".into()),
        client_id: Some("id".into()),
        client_secret: Some("secret".into()),
        ..Default::default()
    };

    let result = Settings::new(1, Endpoints::default(), auth, TransportKind::Rest);

    assert!(matches!(result, Err(ConfigError::ConflictingCredentials)));
}
