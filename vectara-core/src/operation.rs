//! # Operations
//!
//! The transport-agnostic definition of every platform call. An [`Operation`] names the
//! call and carries its typed payload; the ids a call acts on come from the
//! [`crate::identity::IdentityContext`] it is dispatched with. A transport answers with the
//! matching [`Response`] variant, which [`crate::interpret`] then classifies.
//!
//! Keeping a single definition set means the REST and gRPC adapters only translate shapes;
//! neither of them decides what a call means.
use crate::endpoint::Endpoint;
use crate::status::StatusResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Operation`], used for routing and status policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateCorpus,
    ResetCorpus,
    DeleteCorpus,
    IndexDocument,
    UploadFile,
    DeleteDocument,
    Query,
    ComputeCorpusSize,
    SetCorpusEnabled,
    CreateApiKey,
    SetApiKeyEnabled,
    DeleteApiKey,
    ListApiKeys,
    ReadCorpus,
    GetUsageMetrics,
    CreateUser,
    DeleteUser,
    SetUserEnabled,
    ListUsers,
}

impl OperationKind {
    /// The logical endpoint serving this call.
    pub fn endpoint(self) -> Endpoint {
        match self {
            OperationKind::IndexDocument
            | OperationKind::UploadFile
            | OperationKind::DeleteDocument => Endpoint::Indexing,
            OperationKind::Query => Endpoint::Serving,
            OperationKind::CreateCorpus
            | OperationKind::ResetCorpus
            | OperationKind::DeleteCorpus
            | OperationKind::ComputeCorpusSize
            | OperationKind::SetCorpusEnabled
            | OperationKind::CreateApiKey
            | OperationKind::SetApiKeyEnabled
            | OperationKind::DeleteApiKey
            | OperationKind::ListApiKeys
            | OperationKind::ReadCorpus
            | OperationKind::GetUsageMetrics
            | OperationKind::CreateUser
            | OperationKind::DeleteUser
            | OperationKind::SetUserEnabled
            | OperationKind::ListUsers => Endpoint::Admin,
        }
    }

    /// Whether the identity must name a corpus.
    pub fn requires_corpus(self) -> bool {
        matches!(
            self,
            OperationKind::ResetCorpus
                | OperationKind::DeleteCorpus
                | OperationKind::IndexDocument
                | OperationKind::UploadFile
                | OperationKind::DeleteDocument
                | OperationKind::Query
                | OperationKind::ComputeCorpusSize
                | OperationKind::SetCorpusEnabled
                | OperationKind::ReadCorpus
                | OperationKind::GetUsageMetrics
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::CreateCorpus => "CreateCorpus",
            OperationKind::ResetCorpus => "ResetCorpus",
            OperationKind::DeleteCorpus => "DeleteCorpus",
            OperationKind::IndexDocument => "IndexDocument",
            OperationKind::UploadFile => "UploadFile",
            OperationKind::DeleteDocument => "DeleteDocument",
            OperationKind::Query => "Query",
            OperationKind::ComputeCorpusSize => "ComputeCorpusSize",
            OperationKind::SetCorpusEnabled => "SetCorpusEnabled",
            OperationKind::CreateApiKey => "CreateApiKey",
            OperationKind::SetApiKeyEnabled => "SetApiKeyEnabled",
            OperationKind::DeleteApiKey => "DeleteApiKey",
            OperationKind::ListApiKeys => "ListApiKeys",
            OperationKind::ReadCorpus => "ReadCorpus",
            OperationKind::GetUsageMetrics => "GetUsageMetrics",
            OperationKind::CreateUser => "CreateUser",
            OperationKind::DeleteUser => "DeleteUser",
            OperationKind::SetUserEnabled => "SetUserEnabled",
            OperationKind::ListUsers => "ListUsers",
        };
        f.write_str(name)
    }
}

/// A platform call and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateCorpus(NewCorpus),
    /// Clears the indexed content of the identity's corpus, keeping the corpus itself.
    ResetCorpus,
    /// Removes the identity's corpus permanently.
    DeleteCorpus,
    IndexDocument(Document),
    UploadFile(FileUpload),
    DeleteDocument {
        document_id: String,
    },
    Query(QueryBatch),
    ComputeCorpusSize,
    SetCorpusEnabled {
        enabled: bool,
    },
    CreateApiKey(NewApiKey),
    SetApiKeyEnabled {
        key_id: String,
        enabled: bool,
    },
    DeleteApiKey {
        key_id: String,
    },
    ListApiKeys {
        num_results: u32,
    },
    /// Basic info, size and API keys of the identity's corpus.
    ReadCorpus,
    /// Serving usage of the identity's corpus over a time window.
    GetUsageMetrics(UsageWindow),
    CreateUser(NewUser),
    DeleteUser {
        user_id: i64,
    },
    SetUserEnabled {
        user_id: i64,
        enabled: bool,
    },
    ListUsers {
        num_results: u32,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateCorpus(_) => OperationKind::CreateCorpus,
            Operation::ResetCorpus => OperationKind::ResetCorpus,
            Operation::DeleteCorpus => OperationKind::DeleteCorpus,
            Operation::IndexDocument(_) => OperationKind::IndexDocument,
            Operation::UploadFile(_) => OperationKind::UploadFile,
            Operation::DeleteDocument { .. } => OperationKind::DeleteDocument,
            Operation::Query(_) => OperationKind::Query,
            Operation::ComputeCorpusSize => OperationKind::ComputeCorpusSize,
            Operation::SetCorpusEnabled { .. } => OperationKind::SetCorpusEnabled,
            Operation::CreateApiKey(_) => OperationKind::CreateApiKey,
            Operation::SetApiKeyEnabled { .. } => OperationKind::SetApiKeyEnabled,
            Operation::DeleteApiKey { .. } => OperationKind::DeleteApiKey,
            Operation::ListApiKeys { .. } => OperationKind::ListApiKeys,
            Operation::ReadCorpus => OperationKind::ReadCorpus,
            Operation::GetUsageMetrics(_) => OperationKind::GetUsageMetrics,
            Operation::CreateUser(_) => OperationKind::CreateUser,
            Operation::DeleteUser { .. } => OperationKind::DeleteUser,
            Operation::SetUserEnabled { .. } => OperationKind::SetUserEnabled,
            Operation::ListUsers { .. } => OperationKind::ListUsers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCorpus {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Caller-chosen id, unique within the corpus.
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default, alias = "section")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub metadata_json: String,
}

impl Section {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A file for server-side extraction and indexing.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusKey {
    pub customer_id: i64,
    pub corpus_id: i64,
}

impl fmt::Display for CorpusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.customer_id, self.corpus_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub query: String,
    pub start: u32,
    pub num_results: u32,
    pub corpus_keys: Vec<CorpusKey>,
}

/// The query payload is always a batch, even when a single query is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBatch {
    pub queries: Vec<QuerySpec>,
}

impl QueryBatch {
    pub fn single(
        query: impl Into<String>,
        num_results: u32,
        customer_id: i64,
        corpus_id: i64,
    ) -> Self {
        Self {
            queries: vec![QuerySpec {
                query: query.into(),
                start: 0,
                num_results,
                corpus_keys: vec![CorpusKey {
                    customer_id,
                    corpus_id,
                }],
            }],
        }
    }

    /// The corpus named in the identity of a query: the first corpus key of the batch.
    pub fn primary_corpus(&self) -> Option<i64> {
        self.queries
            .iter()
            .flat_map(|q| q.corpus_keys.first())
            .map(|key| key.corpus_id)
            .next()
    }

    /// Corpus keys in request order, flattened over all queries.
    pub fn corpus_keys(&self) -> Vec<CorpusKey> {
        self.queries
            .iter()
            .flat_map(|q| q.corpus_keys.iter().copied())
            .collect()
    }
}

/// Permissions granted to a new API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiKeyType {
    Serving,
    ServingIndexing,
}

impl ApiKeyType {
    pub fn as_i32(self) -> i32 {
        match self {
            ApiKeyType::Serving => 1,
            ApiKeyType::ServingIndexing => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    pub description: String,
    pub key_type: ApiKeyType,
    pub corpus_ids: Vec<i64>,
}

/// Absolute time window and aggregation interval of a usage metrics read.
///
/// Bounds are RFC 3339 timestamps and the interval an ISO 8601 duration, passed through
/// as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageWindow {
    pub start: String,
    pub end: String,
    pub interval: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub roles: Vec<String>,
}

// --- Responses ---------------------------------------------------------------------------

/// A transport's decoded answer, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    CreateCorpus {
        status: StatusResult,
        corpus_id: i64,
    },
    /// Calls answering with a single status (reset/delete corpus, index, upload, ...).
    Status(StatusResult),
    /// Calls answering with one status per item of the request.
    Statuses(Vec<StatusResult>),
    Query(BatchQueryResponse),
    CorpusSize {
        status: StatusResult,
        size: CorpusSize,
    },
    ApiKeysCreated(Vec<CreatedApiKey>),
    ApiKeys {
        status: StatusResult,
        keys: Vec<ApiKeyInfo>,
    },
    Corpora {
        status: StatusResult,
        corpora: Vec<CorpusRecord>,
    },
    UsageMetrics {
        status: StatusResult,
        values: Vec<ServingUsage>,
    },
    /// One entry per user action of the request.
    UsersManaged(Vec<ManagedUser>),
    Users {
        status: StatusResult,
        users: Vec<UserInfo>,
    },
}

impl Response {
    /// Whether any status of the answer, at any level, is not `OK`.
    pub fn reports_failure(&self) -> bool {
        let not_ok = |status: &StatusResult| !status.is_ok();
        match self {
            Response::CreateCorpus { status, .. }
            | Response::Status(status)
            | Response::CorpusSize { status, .. }
            | Response::ApiKeys { status, .. }
            | Response::UsageMetrics { status, .. }
            | Response::Users { status, .. } => not_ok(status),
            Response::Statuses(statuses) => statuses.iter().any(not_ok),
            Response::Query(batch) => {
                batch.status.iter().any(not_ok)
                    || batch
                        .response_sets
                        .iter()
                        .any(|set| set.status.iter().any(not_ok))
            }
            Response::ApiKeysCreated(keys) => keys.iter().any(|key| not_ok(&key.status)),
            Response::Corpora { status, corpora } => {
                not_ok(status)
                    || corpora.iter().any(|record| {
                        not_ok(&record.corpus_status)
                            || not_ok(&record.size_status)
                            || not_ok(&record.api_key_status)
                    })
            }
            Response::UsersManaged(users) => users.iter().any(|user| not_ok(&user.status)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchQueryResponse {
    /// Call-level statuses.
    pub status: Vec<StatusResult>,
    pub response_sets: Vec<ResponseSet>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSet {
    /// Corpus-level statuses.
    pub status: Vec<StatusResult>,
    /// Scored passages, in platform relevance order.
    pub passages: Vec<Passage>,
    pub documents: Vec<ResponseDocument>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Passage {
    pub text: String,
    pub score: f32,
    /// Index into the owning [`ResponseSet::documents`].
    pub document_index: u32,
    pub corpus_key: Option<CorpusKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDocument {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusSize {
    pub epoch_secs: i64,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedApiKey {
    pub key_id: String,
    pub status: StatusResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    pub key_id: String,
    pub description: String,
    pub key_type: String,
    pub enabled: bool,
    pub corpora: Vec<ApiKeyCorpus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCorpus {
    pub corpus_id: i64,
    pub corpus_name: String,
}

/// One corpus of a read-corpus answer, with the status of each part that was read.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRecord {
    pub info: CorpusInfo,
    pub corpus_status: StatusResult,
    pub size_status: StatusResult,
    pub api_key_status: StatusResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusInfo {
    pub corpus_id: i64,
    pub name: String,
    pub description: String,
    /// Provisioning time as reported by the platform.
    pub provisioned: String,
    pub enabled: bool,
    pub size: Option<CorpusSize>,
    pub api_keys: Vec<CorpusApiKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusApiKey {
    pub key_id: String,
    pub description: String,
    pub key_type: String,
    pub enabled: bool,
}

/// Serving usage aggregated over one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingUsage {
    pub start: String,
    pub rows_read: i64,
    pub query_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedUser {
    pub user_id: i64,
    pub status: StatusResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub handle: String,
    pub email: String,
    pub user_type: String,
    pub comment: String,
    pub user_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_operations_to_endpoints() {
        assert_eq!(OperationKind::Query.endpoint(), Endpoint::Serving);
        assert_eq!(OperationKind::UploadFile.endpoint(), Endpoint::Indexing);
        assert_eq!(OperationKind::DeleteDocument.endpoint(), Endpoint::Indexing);
        assert_eq!(OperationKind::CreateCorpus.endpoint(), Endpoint::Admin);
    }

    #[test]
    fn only_account_level_calls_skip_the_corpus() {
        assert!(!OperationKind::CreateCorpus.requires_corpus());
        assert!(!OperationKind::ListApiKeys.requires_corpus());
        assert!(!OperationKind::CreateUser.requires_corpus());
        assert!(OperationKind::Query.requires_corpus());
        assert!(OperationKind::IndexDocument.requires_corpus());
        assert!(OperationKind::ResetCorpus.requires_corpus());
        assert!(OperationKind::ReadCorpus.requires_corpus());
    }

    #[test]
    fn query_identity_names_the_first_corpus() {
        let batch = QueryBatch {
            queries: vec![
                QuerySpec {
                    query: "no keys".into(),
                    start: 0,
                    num_results: 1,
                    corpus_keys: vec![],
                },
                QuerySpec {
                    query: "two keys".into(),
                    start: 0,
                    num_results: 1,
                    corpus_keys: vec![
                        CorpusKey {
                            customer_id: 1,
                            corpus_id: 7,
                        },
                        CorpusKey {
                            customer_id: 1,
                            corpus_id: 8,
                        },
                    ],
                },
            ],
        };

        assert_eq!(batch.primary_corpus(), Some(7));
        assert_eq!(QueryBatch { queries: vec![] }.primary_corpus(), None);
    }

    #[test]
    fn failure_anywhere_in_a_response_is_reported() {
        use crate::status::StatusCode;

        assert!(!Response::Status(StatusResult::ok()).reports_failure());
        assert!(Response::Status(StatusResult::new(StatusCode::InvalidArgument, "")).reports_failure());
        assert!(
            Response::Query(BatchQueryResponse {
                status: vec![],
                response_sets: vec![ResponseSet {
                    status: vec![StatusResult::new(StatusCode::NotFound, "")],
                    ..Default::default()
                }],
            })
            .reports_failure()
        );
    }

    #[test]
    fn single_query_is_still_a_batch() {
        let batch = QueryBatch::single("what?", 10, 1, 2);

        assert_eq!(batch.queries.len(), 1);
        assert_eq!(
            batch.corpus_keys(),
            vec![CorpusKey {
                customer_id: 1,
                corpus_id: 2
            }]
        );
    }
}
