//! # Dispatch
//!
//! A [`Transport`] moves one [`Call`] over the wire and decodes the answer into a
//! [`Response`]; it never interprets statuses. [`VectaraClient`] ties a transport to the
//! credential of the current invocation and runs every answer through
//! [`crate::interpret::interpret`].
use crate::BoxError;
use crate::auth::{self, AuthError, AuthMode, Credential};
use crate::endpoint::Endpoint;
use crate::identity::IdentityContext;
use crate::interpret::{self, Outcome, StatusPolicy};
use crate::operation::{Operation, OperationKind, Response};
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to '{uri}': '{source}'")]
    Connect {
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("Request failed: '{0}'")]
    Http(#[source] reqwest::Error),
    #[error("HTTP {status} from '{url}': '{body}'")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Failed to decode the response body: '{0}'")]
    Decode(#[source] serde_json::Error),
    #[error("gRPC call failed: '{0}'")]
    Rpc(#[from] tonic::Status),
    #[error("'{field}' value {value} does not fit the gRPC message")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("Invalid header or metadata value for '{0}'")]
    InvalidMetadata(&'static str),
    #[error("Invalid '{field}': '{reason}'")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("{operation} is not available over {transport}")]
    Unsupported {
        operation: OperationKind,
        transport: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0} needs a corpus id")]
    MissingCorpus(OperationKind),
}

/// Everything a transport needs to perform one operation.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub endpoint: Endpoint,
    pub operation: &'a Operation,
    pub credential: &'a Credential,
    pub identity: IdentityContext,
}

impl<'a> Call<'a> {
    pub fn new(
        operation: &'a Operation,
        credential: &'a Credential,
        identity: IdentityContext,
    ) -> Self {
        Self {
            endpoint: operation.kind().endpoint(),
            operation,
            credential,
            identity,
        }
    }
}

/// A wire binding of the platform API.
pub trait Transport {
    /// Name used in logs and errors (`"rest"`, `"grpc"`).
    fn name(&self) -> &'static str;

    fn dispatch(
        &mut self,
        call: Call<'_>,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// Resolves the credential of an invocation, then opens the transport with `connect`.
///
/// `connect` is only awaited once a credential exists, so a failed resolution neither
/// opens a connection nor dispatches anything.
pub async fn authenticate<T, F>(
    http: &reqwest::Client,
    mode: &AuthMode,
    connect: F,
) -> Result<VectaraClient<T>, ClientError>
where
    T: Transport,
    F: Future<Output = Result<T, TransportError>>,
{
    let credential = auth::resolve(http, mode).await?;
    let transport = connect.await?;
    Ok(VectaraClient::new(transport, credential))
}

/// A transport bound to one resolved credential.
pub struct VectaraClient<T> {
    transport: T,
    credential: Credential,
    policy: StatusPolicy,
}

impl<T: Transport> VectaraClient<T> {
    pub fn new(transport: T, credential: Credential) -> Self {
        Self {
            transport,
            credential,
            policy: StatusPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Dispatches `operation` and interprets the answer.
    ///
    /// Platform statuses, including failures, come back inside the [`Outcome`]. Only
    /// errors that prevented a decodable answer are returned as `Err`.
    pub async fn execute(
        &mut self,
        identity: IdentityContext,
        operation: &Operation,
    ) -> Result<Outcome, ClientError> {
        let kind = operation.kind();
        if kind.requires_corpus() && identity.corpus_id.is_none() {
            return Err(ClientError::MissingCorpus(kind));
        }

        let call = Call::new(operation, &self.credential, identity);
        let transport = self.transport.name();

        let response = self.transport.dispatch(call).await.inspect_err(|e| {
            tracing::error!(operation = %kind, transport, error = %e, "dispatch failed");
        })?;

        let outcome = interpret::interpret(operation, response, &self.policy);
        match &outcome {
            Outcome::Success { .. } => {
                tracing::info!(operation = %kind, transport, "operation succeeded");
            }
            Outcome::Informational { statuses, .. } => {
                for status in statuses {
                    tracing::warn!(operation = %kind, %status, "operation succeeded with a notice");
                }
            }
            Outcome::PartialFailure { failures, .. } => {
                for failure in failures {
                    tracing::warn!(operation = %kind, %failure, "operation partially failed");
                }
            }
            Outcome::Failure { failures } => {
                for failure in failures {
                    tracing::error!(operation = %kind, %failure, "operation failed");
                }
            }
        }

        Ok(outcome)
    }
}
