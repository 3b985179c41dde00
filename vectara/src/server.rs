//! # Example Server
//!
//! A small HTTP front for the platform. Each endpoint takes the target host, the ids and
//! the credentials in its JSON body, resolves its own credential, performs one operation
//! over REST and answers with the interpreted outcome.
//!
//! | Route                   | Operation                       | Credential          |
//! |-------------------------|---------------------------------|---------------------|
//! | `/queryData`            | query                           | client credentials  |
//! | `/queryDataWithApiKey`  | query                           | API key             |
//! | `/createCorpus`         | create corpus                   | client credentials  |
//! | `/indexData`            | upload of the configured file   | client credentials  |
mod error;

pub use error::{ServerError, ServerResult};

use crate::session::{PlatformTransport, Session};
use crate::upload;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use vectara_core::auth;
use vectara_core::client::{self, TransportError};
use vectara_core::config::{AuthSettings, Settings, TransportKind};
use vectara_core::endpoint::Endpoints;
use vectara_core::interpret::Outcome;
use vectara_core::operation::{NewCorpus, Operation, QueryBatch};
use vectara_core::rest::RestTransport;

const DEFAULT_QUERY: &str = "test";
const DEFAULT_NUM_RESULTS: u32 = 10;

pub struct ServerState {
    http: reqwest::Client,
    upload_file: PathBuf,
    http_prefix: bool,
    /// Sends every REST call here instead of the hosts named in the request.
    platform_url: Option<String>,
}

impl ServerState {
    pub fn new(upload_file: PathBuf, http_prefix: bool) -> Result<Self, auth::AuthError> {
        Ok(Self::with_http_client(
            auth::token_http_client()?,
            upload_file,
            http_prefix,
        ))
    }

    /// Uses `http` for token requests and platform calls sent to the platform url.
    pub fn with_http_client(http: reqwest::Client, upload_file: PathBuf, http_prefix: bool) -> Self {
        Self {
            http,
            upload_file,
            http_prefix,
            platform_url: None,
        }
    }

    pub fn with_platform_url(mut self, url: impl Into<String>) -> Self {
        self.platform_url = Some(url.into());
        self
    }

    async fn session(
        &self,
        customer_id: i64,
        host: &str,
        credentials: AuthSettings,
    ) -> ServerResult<Session> {
        let endpoints = Endpoints::unified(host).with_http_prefix(self.http_prefix);
        let settings = Settings::new(customer_id, endpoints, credentials, TransportKind::Rest)?;

        let connect = async {
            let transport = match &self.platform_url {
                Some(url) => RestTransport::with_base_url(self.http.clone(), url.clone()),
                None => RestTransport::new(&settings.endpoints)?,
            };
            Ok::<_, TransportError>(PlatformTransport::Rest(transport))
        };
        let client = client::authenticate(&self.http, &settings.auth, connect).await?;

        Ok(Session::new(client, customer_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientCredentialsBody {
    #[serde(default)]
    pub auth_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
}

impl From<ClientCredentialsBody> for AuthSettings {
    fn from(body: ClientCredentialsBody) -> Self {
        AuthSettings {
            auth_url: body.auth_url,
            client_id: Some(body.client_id),
            client_secret: Some(body.client_secret),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryDataRequest {
    pub serving_endpoint: String,
    pub customer_id: i64,
    pub corpus_id: i64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(flatten)]
    pub credentials: ClientCredentialsBody,
}

#[derive(Debug, Deserialize)]
pub struct QueryWithApiKeyRequest {
    pub serving_endpoint: String,
    pub customer_id: i64,
    pub corpus_id: i64,
    #[serde(default)]
    pub query: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCorpusRequest {
    pub admin_endpoint: String,
    pub customer_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub credentials: ClientCredentialsBody,
}

#[derive(Debug, Deserialize)]
pub struct IndexDataRequest {
    pub indexing_endpoint: String,
    pub customer_id: i64,
    pub corpus_id: i64,
    #[serde(flatten)]
    pub credentials: ClientCredentialsBody,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/queryData", post(query_data))
        .route("/queryDataWithApiKey", post(query_data_with_api_key))
        .route("/createCorpus", post(create_corpus))
        .route("/indexData", post(index_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: ServerState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "example server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

pub async fn query_data(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<QueryDataRequest>,
) -> ServerResult<Json<Outcome>> {
    let mut session = state
        .session(req.customer_id, &req.serving_endpoint, req.credentials.into())
        .await?;

    let batch = query_batch(req.query, req.customer_id, req.corpus_id);
    Ok(Json(session.query(batch).await?))
}

pub async fn query_data_with_api_key(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<QueryWithApiKeyRequest>,
) -> ServerResult<Json<Outcome>> {
    let credentials = AuthSettings {
        api_key: Some(req.api_key),
        ..Default::default()
    };
    let mut session = state
        .session(req.customer_id, &req.serving_endpoint, credentials)
        .await?;

    let batch = query_batch(req.query, req.customer_id, req.corpus_id);
    Ok(Json(session.query(batch).await?))
}

pub async fn create_corpus(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CreateCorpusRequest>,
) -> ServerResult<Json<Outcome>> {
    let mut session = state
        .session(req.customer_id, &req.admin_endpoint, req.credentials.into())
        .await?;

    let operation = Operation::CreateCorpus(NewCorpus {
        name: req.name.unwrap_or_else(|| "Test Corpus from Rust".to_string()),
        description: req
            .description
            .unwrap_or_else(|| "Dummy description".to_string()),
    });
    Ok(Json(session.account(&operation).await?))
}

pub async fn index_data(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<IndexDataRequest>,
) -> ServerResult<Json<Outcome>> {
    let mut session = state
        .session(req.customer_id, &req.indexing_endpoint, req.credentials.into())
        .await?;

    let upload = upload::read_file(&state.upload_file)
        .await
        .map_err(|source| ServerError::UploadFile {
            path: state.upload_file.display().to_string(),
            source,
        })?;
    let operation = Operation::UploadFile(upload);
    Ok(Json(session.corpus(req.corpus_id, &operation).await?))
}

fn query_batch(query: Option<String>, customer_id: i64, corpus_id: i64) -> QueryBatch {
    let query = query
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());
    QueryBatch::single(query, DEFAULT_NUM_RESULTS, customer_id, corpus_id)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install the Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install the SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use vectara_core::interpret::Extracted;

    fn state(platform: &mockito::ServerGuard) -> Arc<ServerState> {
        Arc::new(
            ServerState::with_http_client(
                reqwest::Client::new(),
                PathBuf::from("does-not-exist.pdf"),
                true,
            )
            .with_platform_url(platform.url()),
        )
    }

    #[tokio::test]
    async fn query_with_api_key_relays_hits() {
        let mut platform = mockito::Server::new_async().await;
        let mock = platform
            .mock("POST", "/v1/query")
            .match_header("x-api-key", "zqt_key")
            .match_header("customer-id", "1234")
            .match_header("corpus-id", "5")
            .match_body(Matcher::PartialJson(json!({
                "query": [{"query": "test", "numResults": 10}]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "responseSet": [{
                        "response": [{"text": "hit", "score": 0.7, "documentIndex": 0}],
                        "status": [],
                        "document": [{"id": "doc-1"}]
                    }],
                    "status": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = serde_json::from_value::<QueryWithApiKeyRequest>(json!({
            "serving_endpoint": "serving.example.com",
            "customer_id": 1234,
            "corpus_id": 5,
            "api_key": "zqt_key"
        }))
        .unwrap();

        let Json(outcome) = query_data_with_api_key(State(state(&platform)), Json(request))
            .await
            .unwrap();

        mock.assert_async().await;
        let Some(Extracted::Hits(hits)) = outcome.extracted() else {
            panic!("Expected hits, got {outcome:?}");
        };
        assert_eq!(hits[0].document_id, "doc-1");
    }

    #[tokio::test]
    async fn token_failure_stops_before_the_platform() {
        let mut auth = mockito::Server::new_async().await;
        let token = auth
            .mock("POST", "/oauth2/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;
        let mut platform = mockito::Server::new_async().await;
        let create = platform
            .mock("POST", "/v1/create-corpus")
            .expect(0)
            .create_async()
            .await;

        let request = serde_json::from_value::<CreateCorpusRequest>(json!({
            "admin_endpoint": "admin.example.com",
            "customer_id": 1234,
            "auth_url": auth.url(),
            "client_id": "id",
            "client_secret": "secret"
        }))
        .unwrap();

        let result = create_corpus(State(state(&platform)), Json(request)).await;

        token.assert_async().await;
        create.assert_async().await;
        assert!(matches!(
            result,
            Err(ServerError::Token(auth::AuthError::Rejected { status: 401, .. }))
        ));
    }

    #[tokio::test]
    async fn query_with_client_credentials_sends_the_bearer_token() {
        let mut auth = mockito::Server::new_async().await;
        let token = auth
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tkn"}"#)
            .create_async()
            .await;
        let mut platform = mockito::Server::new_async().await;
        let query = platform
            .mock("POST", "/v1/query")
            .match_header("authorization", "Bearer tkn")
            .match_header("corpus-id", "9")
            .match_body(Matcher::PartialJson(json!({
                "query": [{"query": "rust", "corpusKey": [{"customerId": 1234, "corpusId": 9}]}]
            })))
            .with_status(200)
            .with_body(r#"{"responseSet":[],"status":[]}"#)
            .create_async()
            .await;

        let request = serde_json::from_value::<QueryDataRequest>(json!({
            "serving_endpoint": "serving.example.com",
            "customer_id": 1234,
            "corpus_id": 9,
            "query": "rust",
            "auth_url": auth.url(),
            "client_id": "id",
            "client_secret": "secret"
        }))
        .unwrap();

        let result = query_data(State(state(&platform)), Json(request)).await;

        token.assert_async().await;
        query.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn index_data_reports_a_missing_upload_file() {
        let mut auth = mockito::Server::new_async().await;
        let _token = auth
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tkn"}"#)
            .create_async()
            .await;
        let mut platform = mockito::Server::new_async().await;
        let upload = platform
            .mock("POST", "/upload")
            .expect(0)
            .create_async()
            .await;

        let request = serde_json::from_value::<IndexDataRequest>(json!({
            "indexing_endpoint": "indexing.example.com",
            "customer_id": 1234,
            "corpus_id": 5,
            "auth_url": auth.url(),
            "client_id": "id",
            "client_secret": "secret"
        }))
        .unwrap();

        let result = index_data(State(state(&platform)), Json(request)).await;

        upload.assert_async().await;
        assert!(matches!(result, Err(ServerError::UploadFile { .. })));
    }
}
