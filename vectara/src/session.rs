use vectara_core::auth;
use vectara_core::client::{self, Call, ClientError, Transport, TransportError, VectaraClient};
use vectara_core::config::{Settings, TransportKind};
use vectara_core::grpc::GrpcTransport;
use vectara_core::identity::IdentityContext;
use vectara_core::interpret::{Outcome, StatusPolicy};
use vectara_core::operation::{Operation, QueryBatch, Response};
use vectara_core::rest::RestTransport;

/// The transport picked at startup.
pub enum PlatformTransport {
    Rest(RestTransport),
    Grpc(GrpcTransport),
}

impl PlatformTransport {
    pub async fn connect(settings: &Settings) -> Result<Self, TransportError> {
        match settings.transport {
            TransportKind::Rest => Ok(Self::Rest(RestTransport::new(&settings.endpoints)?)),
            TransportKind::Grpc => Ok(Self::Grpc(
                GrpcTransport::connect(&settings.endpoints).await?,
            )),
        }
    }
}

impl Transport for PlatformTransport {
    fn name(&self) -> &'static str {
        match self {
            Self::Rest(t) => t.name(),
            Self::Grpc(t) => t.name(),
        }
    }

    async fn dispatch(&mut self, call: Call<'_>) -> Result<Response, TransportError> {
        match self {
            Self::Rest(t) => t.dispatch(call).await,
            Self::Grpc(t) => t.dispatch(call).await,
        }
    }
}

/// An authenticated client plus the account it acts for.
pub struct Session {
    client: VectaraClient<PlatformTransport>,
    customer_id: i64,
}

impl Session {
    pub async fn open(settings: &Settings, policy: StatusPolicy) -> Result<Self, ClientError> {
        let http = auth::token_http_client()?;
        Self::open_with(&http, settings, policy).await
    }

    /// Resolves the credential with `http`, then opens the transport.
    pub async fn open_with(
        http: &reqwest::Client,
        settings: &Settings,
        policy: StatusPolicy,
    ) -> Result<Self, ClientError> {
        let client =
            client::authenticate(http, &settings.auth, PlatformTransport::connect(settings))
                .await?
                .with_policy(policy);

        tracing::debug!(customer_id = settings.customer_id, transport = %settings.transport, "session opened");

        Ok(Self::new(client, settings.customer_id))
    }

    pub fn new(client: VectaraClient<PlatformTransport>, customer_id: i64) -> Self {
        Self {
            client,
            customer_id,
        }
    }

    pub async fn account(&mut self, operation: &Operation) -> Result<Outcome, ClientError> {
        self.client
            .execute(IdentityContext::for_account(self.customer_id), operation)
            .await
    }

    pub async fn corpus(
        &mut self,
        corpus_id: i64,
        operation: &Operation,
    ) -> Result<Outcome, ClientError> {
        self.client
            .execute(
                IdentityContext::for_corpus(self.customer_id, corpus_id),
                operation,
            )
            .await
    }

    /// Runs `batch` on behalf of its first corpus.
    pub async fn query(&mut self, batch: QueryBatch) -> Result<Outcome, ClientError> {
        let identity = IdentityContext::for_query(self.customer_id, &batch);
        self.client.execute(identity, &Operation::Query(batch)).await
    }

    pub fn customer_id(&self) -> i64 {
        self.customer_id
    }
}
