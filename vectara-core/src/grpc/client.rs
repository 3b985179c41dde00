//! # gRPC Transport
//!
//! One unary RPC per operation over `tonic::client::Grpc`, with the path built at dispatch
//! time and messages encoded by [`tonic_prost::ProstCodec`].
//!
//! Identity and credential travel as metadata attached by an [`AuthInterceptor`] that is
//! created for each call, so a single set of channels can serve calls for any corpus.
//!
//! Upload and the account administration calls have no gRPC rendition here and are
//! rejected with [`TransportError::Unsupported`] before anything is sent.
use super::interceptor::AuthInterceptor;
use super::pb;
use crate::BoxError;
use crate::client::{Call, Transport, TransportError};
use crate::endpoint::{Endpoint, Endpoints};
use crate::operation::{
    BatchQueryResponse, CorpusKey, Document, Operation, Passage, QueryBatch, Response,
    ResponseDocument, ResponseSet,
};
use crate::status::{StatusCode, StatusResult};
use http::uri::PathAndQuery;
use tonic::codegen::Service;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, ClientTlsConfig};

pub const CREATE_CORPUS_PATH: &str = "/com.vectara.AdminService/CreateCorpus";
pub const DELETE_CORPUS_PATH: &str = "/com.vectara.AdminService/DeleteCorpus";
pub const RESET_CORPUS_PATH: &str = "/com.vectara.AdminService/ResetCorpus";
pub const INDEX_PATH: &str = "/com.vectara.IndexService/Index";
pub const DELETE_PATH: &str = "/com.vectara.IndexService/Delete";
pub const QUERY_PATH: &str = "/com.vectara.QueryService/Query";

/// The gRPC binding of the platform API.
///
/// Generic over the underlying service so tests can plug an in-process server in place
/// of a [`Channel`].
#[derive(Debug, Clone)]
pub struct GrpcTransport<S = Channel> {
    admin: S,
    indexing: S,
    serving: S,
    /// Where the channels point, when they were opened from endpoints.
    endpoints: Option<Endpoints>,
}

impl GrpcTransport<Channel> {
    /// Opens TLS channels to the admin, indexing and serving hosts.
    ///
    /// Hosts shared by several endpoints share one channel.
    pub async fn connect(endpoints: &Endpoints) -> Result<Self, TransportError> {
        let admin_uri = endpoints.grpc_uri(Endpoint::Admin);
        let indexing_uri = endpoints.grpc_uri(Endpoint::Indexing);
        let serving_uri = endpoints.grpc_uri(Endpoint::Serving);

        let admin = open_channel(&admin_uri).await?;
        let indexing = if indexing_uri == admin_uri {
            admin.clone()
        } else {
            open_channel(&indexing_uri).await?
        };
        let serving = if serving_uri == admin_uri {
            admin.clone()
        } else if serving_uri == indexing_uri {
            indexing.clone()
        } else {
            open_channel(&serving_uri).await?
        };

        Ok(Self {
            admin,
            indexing,
            serving,
            endpoints: Some(endpoints.clone()),
        })
    }
}

async fn open_channel(uri: &str) -> Result<Channel, TransportError> {
    let connect_error = |source: tonic::transport::Error| TransportError::Connect {
        uri: uri.to_string(),
        source: source.into(),
    };

    tracing::debug!(%uri, "opening gRPC channel");

    tonic::transport::Endpoint::from_shared(uri.to_string())
        .map_err(connect_error)?
        .tls_config(ClientTlsConfig::new().with_native_roots())
        .map_err(connect_error)?
        .connect()
        .await
        .map_err(connect_error)
}

impl<S> GrpcTransport<S>
where
    S: Clone,
{
    /// Routes every endpoint to the same service.
    pub fn from_service(service: S) -> Self {
        Self {
            admin: service.clone(),
            indexing: service.clone(),
            serving: service,
            endpoints: None,
        }
    }

    fn service(&self, endpoint: Endpoint) -> S {
        match endpoint {
            Endpoint::Admin => self.admin.clone(),
            Endpoint::Indexing => self.indexing.clone(),
            Endpoint::Serving => self.serving.clone(),
        }
    }

    fn address(&self, endpoint: Endpoint) -> String {
        match &self.endpoints {
            Some(endpoints) => endpoints.grpc_uri(endpoint),
            None => format!("in-process {endpoint} service"),
        }
    }
}

async fn unary<S, Req, Resp>(
    service: S,
    address: &str,
    interceptor: AuthInterceptor,
    path: &'static str,
    message: Req,
) -> Result<Resp, TransportError>
where
    S: Service<http::Request<tonic::body::Body>, Response = http::Response<tonic::body::Body>>
        + Send
        + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
    Req: prost::Message + Send + 'static,
    Resp: prost::Message + Default + Send + 'static,
{
    let mut client = tonic::client::Grpc::new(InterceptedService::new(service, interceptor));
    client
        .ready()
        .await
        .map_err(|e| TransportError::Connect {
            uri: address.to_string(),
            source: e.into(),
        })?;

    tracing::debug!(address, path, "sending gRPC request");

    let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
    let response = client
        .unary(
            tonic::Request::new(message),
            PathAndQuery::from_static(path),
            codec,
        )
        .await?;

    Ok(response.into_inner())
}

impl<S> Transport for GrpcTransport<S>
where
    S: Service<http::Request<tonic::body::Body>, Response = http::Response<tonic::body::Body>>
        + Clone
        + Send
        + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    fn name(&self) -> &'static str {
        "grpc"
    }

    async fn dispatch(&mut self, call: Call<'_>) -> Result<Response, TransportError> {
        let kind = call.operation.kind();
        let customer_id = call.identity.customer_id;
        let corpus_id = call.identity.corpus_id.unwrap_or_default();

        // Fail unsupported calls before touching credentials or the network.
        let request = match call.operation {
            Operation::CreateCorpus(corpus) => GrpcRequest::CreateCorpus(pb::CreateCorpusRequest {
                corpus: Some(pb::Corpus {
                    id: 0,
                    name: corpus.name.clone(),
                    description: corpus.description.clone(),
                }),
            }),
            Operation::ResetCorpus => GrpcRequest::ResetCorpus(pb::ResetCorpusRequest {
                customer_id,
                corpus_id,
            }),
            Operation::DeleteCorpus => GrpcRequest::DeleteCorpus(pb::DeleteCorpusRequest {
                customer_id,
                corpus_id,
            }),
            Operation::IndexDocument(document) => {
                GrpcRequest::Index(pb::IndexDocumentRequest {
                    customer_id,
                    corpus_id,
                    document: Some(document_to_pb(document)),
                })
            }
            Operation::DeleteDocument { document_id } => {
                GrpcRequest::Delete(pb::DeleteDocumentRequest {
                    customer_id,
                    corpus_id,
                    document_id: document_id.clone(),
                })
            }
            Operation::Query(batch) => GrpcRequest::Query(batch_to_pb(batch)?),
            Operation::UploadFile(_)
            | Operation::ComputeCorpusSize
            | Operation::SetCorpusEnabled { .. }
            | Operation::CreateApiKey(_)
            | Operation::SetApiKeyEnabled { .. }
            | Operation::DeleteApiKey { .. }
            | Operation::ListApiKeys { .. }
            | Operation::ReadCorpus
            | Operation::GetUsageMetrics(_)
            | Operation::CreateUser(_)
            | Operation::DeleteUser { .. }
            | Operation::SetUserEnabled { .. }
            | Operation::ListUsers { .. } => {
                return Err(TransportError::Unsupported {
                    operation: kind,
                    transport: "gRPC",
                });
            }
        };

        let interceptor = AuthInterceptor::new(call.credential, call.identity)?;
        let service = self.service(call.endpoint);
        let address = self.address(call.endpoint);
        let address = address.as_str();

        match request {
            GrpcRequest::CreateCorpus(message) => {
                let reply: pb::CreateCorpusResponse =
                    unary(service, address, interceptor, CREATE_CORPUS_PATH, message).await?;
                Ok(Response::CreateCorpus {
                    status: status_from_pb(reply.status),
                    corpus_id: i64::from(reply.corpus_id),
                })
            }
            GrpcRequest::ResetCorpus(message) => {
                let reply: pb::ResetCorpusResponse =
                    unary(service, address, interceptor, RESET_CORPUS_PATH, message).await?;
                Ok(Response::Status(status_from_pb(reply.status)))
            }
            GrpcRequest::DeleteCorpus(message) => {
                let reply: pb::DeleteCorpusResponse =
                    unary(service, address, interceptor, DELETE_CORPUS_PATH, message).await?;
                Ok(Response::Status(status_from_pb(reply.status)))
            }
            GrpcRequest::Index(message) => {
                let reply: pb::IndexDocumentResponse =
                    unary(service, address, interceptor, INDEX_PATH, message).await?;
                Ok(Response::Status(status_from_pb(reply.status)))
            }
            GrpcRequest::Delete(message) => {
                let _: pb::DeleteDocumentResponse =
                    unary(service, address, interceptor, DELETE_PATH, message).await?;
                Ok(Response::Status(StatusResult::ok()))
            }
            GrpcRequest::Query(message) => {
                let reply: pb::BatchQueryResponse =
                    unary(service, address, interceptor, QUERY_PATH, message).await?;
                Ok(Response::Query(batch_response_from_pb(reply)))
            }
        }
    }
}

enum GrpcRequest {
    CreateCorpus(pb::CreateCorpusRequest),
    ResetCorpus(pb::ResetCorpusRequest),
    DeleteCorpus(pb::DeleteCorpusRequest),
    Index(pb::IndexDocumentRequest),
    Delete(pb::DeleteDocumentRequest),
    Query(pb::BatchQueryRequest),
}

fn document_to_pb(document: &Document) -> pb::Document {
    pb::Document {
        document_id: document.document_id.clone(),
        title: document.title.clone(),
        description: document.description.clone(),
        metadata_json: document.metadata_json.clone(),
        section: document
            .sections
            .iter()
            .map(|s| pb::Section {
                id: s.id.unwrap_or_default(),
                title: s.title.clone(),
                text: s.text.clone(),
                metadata_json: s.metadata_json.clone(),
            })
            .collect(),
    }
}

fn batch_to_pb(batch: &QueryBatch) -> Result<pb::BatchQueryRequest, TransportError> {
    let query = batch
        .queries
        .iter()
        .map(|item| -> Result<pb::QueryRequest, TransportError> {
            let corpus_key = item
                .corpus_keys
                .iter()
                .map(corpus_key_to_pb)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(pb::QueryRequest {
                query: item.query.clone(),
                start: item.start,
                num_results: item.num_results,
                corpus_key,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(pb::BatchQueryRequest { query })
}

fn corpus_key_to_pb(key: &CorpusKey) -> Result<pb::CorpusKey, TransportError> {
    let narrow = |field: &'static str, value: i64| {
        u32::try_from(value).map_err(|_| TransportError::OutOfRange { field, value })
    };

    Ok(pb::CorpusKey {
        customer_id: narrow("customer_id", key.customer_id)?,
        corpus_id: narrow("corpus_id", key.corpus_id)?,
    })
}

fn status_from_pb(status: Option<pb::Status>) -> StatusResult {
    status
        .map(|s| StatusResult::new(StatusCode::from_i32(s.code), s.status_detail))
        .unwrap_or_default()
}

fn batch_response_from_pb(reply: pb::BatchQueryResponse) -> BatchQueryResponse {
    let response_sets = reply
        .response_set
        .into_iter()
        .map(|set| ResponseSet {
            status: set.status.into_iter().map(|s| status_from_pb(Some(s))).collect(),
            passages: set
                .response
                .into_iter()
                .map(|r| Passage {
                    text: r.text,
                    score: r.score,
                    document_index: r.document_index,
                    corpus_key: r.corpus_key.map(|k| CorpusKey {
                        customer_id: i64::from(k.customer_id),
                        corpus_id: i64::from(k.corpus_id),
                    }),
                })
                .collect(),
            documents: set
                .document
                .into_iter()
                .map(|d| ResponseDocument { id: d.id })
                .collect(),
        })
        .collect();

    BatchQueryResponse {
        status: reply
            .status
            .into_iter()
            .map(|s| status_from_pb(Some(s)))
            .collect(),
        response_sets,
    }
}
