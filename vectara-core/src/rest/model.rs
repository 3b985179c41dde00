//! JSON bodies of the REST binding.
//!
//! Request bodies borrow from the [`Operation`](crate::operation::Operation) payloads.
//! Response bodies are decoded leniently: absent statuses mean `OK`, absent lists are empty
//! and 64-bit integers are accepted both as numbers and as strings (the proto3 JSON
//! mapping renders `int64` as a string).
use crate::operation::{
    ApiKeyCorpus, ApiKeyInfo, ApiKeyType, BatchQueryResponse, CorpusApiKey, CorpusInfo,
    CorpusKey, CorpusRecord, CorpusSize, CreatedApiKey, Document, ManagedUser, NewApiKey,
    NewCorpus, NewUser, Passage, QuerySpec, Response, ResponseDocument, ResponseSet, Section,
    ServingUsage, UsageWindow, UserInfo,
};
use crate::status::StatusResult;
use serde::{Deserialize, Deserializer, Serialize};

pub const CREATE_CORPUS_PATH: &str = "/v1/create-corpus";
pub const RESET_CORPUS_PATH: &str = "/v1/reset-corpus";
pub const DELETE_CORPUS_PATH: &str = "/v1/delete-corpus";
pub const INDEX_PATH: &str = "/v1/index";
pub const UPLOAD_PATH: &str = "/upload";
pub const DELETE_DOC_PATH: &str = "/v1/delete-doc";
pub const QUERY_PATH: &str = "/v1/query";
pub const COMPUTE_CORPUS_SIZE_PATH: &str = "/v1/compute-corpus-size";
pub const CORPUS_ENABLEMENT_PATH: &str = "/v1/update-corpus-enablement";
pub const CREATE_API_KEY_PATH: &str = "/v1/create-api-key";
pub const ENABLE_API_KEY_PATH: &str = "/v1/enable-api-key";
pub const DELETE_API_KEY_PATH: &str = "/v1/delete-api-key";
pub const LIST_API_KEYS_PATH: &str = "/v1/list-api-keys";
pub const READ_CORPUS_PATH: &str = "/v1/read-corpus";
pub const USAGE_METRICS_PATH: &str = "/v1/get-usage-metrics";
pub const MANAGE_USER_PATH: &str = "/v1/manage-user";
pub const LIST_USERS_PATH: &str = "/v1/list-users";

// --- Requests ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreateCorpusRequest<'a> {
    pub corpus: &'a NewCorpus,
}

/// Body of reset-corpus and delete-corpus, which take snake_case keys.
#[derive(Debug, Serialize)]
pub struct CorpusRef {
    pub customer_id: i64,
    pub corpus_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest<'a> {
    pub customer_id: i64,
    pub corpus_id: i64,
    pub document: DocumentBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBody<'a> {
    pub document_id: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub metadata_json: &'a str,
    pub section: &'a [Section],
}

impl<'a> From<&'a Document> for DocumentBody<'a> {
    fn from(document: &'a Document) -> Self {
        Self {
            document_id: &document.document_id,
            title: &document.title,
            description: &document.description,
            metadata_json: &document.metadata_json,
            section: &document.sections,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocRequest<'a> {
    pub customer_id: i64,
    pub corpus_id: i64,
    pub document_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: Vec<QueryBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody<'a> {
    pub query: &'a str,
    pub start: u32,
    pub num_results: u32,
    pub corpus_key: &'a [CorpusKey],
}

impl<'a> From<&'a QuerySpec> for QueryBody<'a> {
    fn from(item: &'a QuerySpec) -> Self {
        Self {
            query: &item.query,
            start: item.start,
            num_results: item.num_results,
            corpus_key: &item.corpus_keys,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusIdRequest {
    pub corpus_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusEnablementRequest {
    pub corpus_id: i64,
    pub enable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest<'a> {
    pub api_key_data: Vec<ApiKeyData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyData<'a> {
    pub description: &'a str,
    pub api_key_type: &'static str,
    pub corpus_id: &'a [i64],
}

impl<'a> From<&'a NewApiKey> for ApiKeyData<'a> {
    fn from(key: &'a NewApiKey) -> Self {
        Self {
            description: &key.description,
            api_key_type: api_key_type_name(key.key_type),
            corpus_id: &key.corpus_ids,
        }
    }
}

fn api_key_type_name(key_type: ApiKeyType) -> &'static str {
    match key_type {
        ApiKeyType::Serving => "API_KEY_TYPE__SERVING",
        ApiKeyType::ServingIndexing => "API_KEY_TYPE__SERVING_INDEXING",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableApiKeyRequest<'a> {
    pub key_enablement: Vec<KeyEnablement<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEnablement<'a> {
    pub key_id: &'a str,
    pub enable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApiKeyRequest<'a> {
    pub key_id: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListApiKeysRequest {
    pub num_results: u32,
    pub read_corpora_info: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadCorpusRequest {
    pub corpus_id: Vec<i64>,
    pub read_basic_info: bool,
    pub read_size: bool,
    pub read_api_keys: bool,
    pub read_custom_dimensions: bool,
    pub read_filter_attributes: bool,
}

impl ReadCorpusRequest {
    /// Basic info, size and API keys of one corpus.
    pub fn everything(corpus_id: i64) -> Self {
        Self {
            corpus_id: vec![corpus_id],
            read_basic_info: true,
            read_size: true,
            read_api_keys: true,
            read_custom_dimensions: false,
            read_filter_attributes: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetricsRequest<'a> {
    pub corpus_id: i64,
    pub window: WindowBody<'a>,
    #[serde(rename = "type")]
    pub metric_type: &'static str,
    pub interval: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowBody<'a> {
    pub absolute_window: AbsoluteWindow<'a>,
}

#[derive(Debug, Serialize)]
pub struct AbsoluteWindow<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

impl<'a> UsageMetricsRequest<'a> {
    pub fn serving(corpus_id: i64, window: &'a UsageWindow) -> Self {
        Self {
            corpus_id,
            window: WindowBody {
                absolute_window: AbsoluteWindow {
                    start: &window.start,
                    end: &window.end,
                },
            },
            metric_type: "METRICTYPE__SERVING",
            interval: &window.interval,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum UserActionType {
    Add,
    Delete,
    Enable,
    Disable,
}

impl Serialize for UserActionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            UserActionType::Add => "USER_ACTION_TYPE__ADD",
            UserActionType::Delete => "USER_ACTION_TYPE__DELETE",
            UserActionType::Enable => "USER_ACTION_TYPE__ENABLE",
            UserActionType::Disable => "USER_ACTION_TYPE__DISABLE",
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageUserRequest<'a> {
    pub user_action: Vec<UserAction<'a>>,
}

impl<'a> ManageUserRequest<'a> {
    pub fn single(action: UserAction<'a>) -> Self {
        Self {
            user_action: vec![action],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction<'a> {
    pub user: UserBody<'a>,
    pub user_action_type: UserActionType,
}

impl<'a> UserAction<'a> {
    pub fn add(user: &'a NewUser) -> Self {
        Self {
            user: UserBody {
                id: None,
                handle: Some(&user.handle),
                email: Some(&user.email),
                user_type: Some("USER_TYPE__USER"),
                role: Some(&user.roles),
            },
            user_action_type: UserActionType::Add,
        }
    }

    /// An action on an existing user, addressed by id only.
    pub fn on_user(user_id: i64, action: UserActionType) -> Self {
        Self {
            user: UserBody {
                id: Some(user_id),
                handle: None,
                email: None,
                user_type: None,
                role: None,
            },
            user_action_type: action,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    pub list_users_type: &'static str,
    pub num_results: u32,
}

impl ListUsersRequest {
    pub fn all(num_results: u32) -> Self {
        Self {
            list_users_type: "LIST_USERS_TYPE__ALL",
            num_results,
        }
    }
}

// --- Responses ---------------------------------------------------------------------------

/// Answer carrying a single optional status.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusReply {
    pub status: Option<StatusResult>,
}

impl From<StatusReply> for Response {
    fn from(reply: StatusReply) -> Self {
        Response::Status(reply.status.unwrap_or_default())
    }
}

/// Answer carrying one status per item of the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusListReply {
    pub status: Vec<StatusResult>,
}

impl From<StatusListReply> for Response {
    fn from(reply: StatusListReply) -> Self {
        Response::Statuses(reply.status)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadReply {
    pub response: StatusReply,
}

impl From<UploadReply> for Response {
    fn from(reply: UploadReply) -> Self {
        reply.response.into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCorpusReply {
    #[serde(deserialize_with = "lenient_i64")]
    pub corpus_id: i64,
    pub status: Option<StatusResult>,
}

impl From<CreateCorpusReply> for Response {
    fn from(reply: CreateCorpusReply) -> Self {
        Response::CreateCorpus {
            status: reply.status.unwrap_or_default(),
            corpus_id: reply.corpus_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryReply {
    pub response_set: Vec<ResponseSetBody>,
    pub status: Vec<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponseSetBody {
    pub response: Vec<PassageBody>,
    pub status: Vec<StatusResult>,
    pub document: Vec<DocumentRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PassageBody {
    pub text: String,
    pub score: f32,
    pub document_index: u32,
    pub corpus_key: Option<CorpusKeyBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusKeyBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub customer_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub corpus_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocumentRef {
    pub id: String,
}

impl From<QueryReply> for Response {
    fn from(reply: QueryReply) -> Self {
        let response_sets = reply
            .response_set
            .into_iter()
            .map(|set| ResponseSet {
                status: set.status,
                passages: set
                    .response
                    .into_iter()
                    .map(|p| Passage {
                        text: p.text,
                        score: p.score,
                        document_index: p.document_index,
                        corpus_key: p.corpus_key.map(|k| CorpusKey {
                            customer_id: k.customer_id,
                            corpus_id: k.corpus_id,
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

        Response::Query(BatchQueryResponse {
            status: reply.status,
            response_sets,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorpusSizeReply {
    pub size: Option<CorpusSizeBody>,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusSizeBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub epoch_secs: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub size: i64,
}

impl From<CorpusSizeReply> for Response {
    fn from(reply: CorpusSizeReply) -> Self {
        let size = reply
            .size
            .map(|s| CorpusSize {
                epoch_secs: s.epoch_secs,
                size: s.size,
            })
            .unwrap_or_default();
        Response::CorpusSize {
            status: reply.status.unwrap_or_default(),
            size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateApiKeyReply {
    pub response: Vec<CreatedKeyBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatedKeyBody {
    pub key_id: String,
    pub status: Option<StatusResult>,
}

impl From<CreateApiKeyReply> for Response {
    fn from(reply: CreateApiKeyReply) -> Self {
        Response::ApiKeysCreated(
            reply
                .response
                .into_iter()
                .map(|key| CreatedApiKey {
                    key_id: key.key_id,
                    status: key.status.unwrap_or_default(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListApiKeysReply {
    pub key_data: Vec<KeyDataBody>,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyDataBody {
    pub api_key: ApiKeyBody,
    pub corpus: Vec<CorpusInfoBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiKeyBody {
    pub id: String,
    pub description: String,
    pub key_type: String,
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorpusInfoBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub name: String,
}

impl From<ListApiKeysReply> for Response {
    fn from(reply: ListApiKeysReply) -> Self {
        let keys = reply
            .key_data
            .into_iter()
            .map(|data| ApiKeyInfo {
                key_id: data.api_key.id,
                description: data.api_key.description,
                key_type: data.api_key.key_type,
                enabled: data.api_key.enabled,
                corpora: data
                    .corpus
                    .into_iter()
                    .map(|c| ApiKeyCorpus {
                        corpus_id: c.id,
                        corpus_name: c.name,
                    })
                    .collect(),
            })
            .collect();

        Response::ApiKeys {
            status: reply.status.unwrap_or_default(),
            keys,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReadCorpusReply {
    pub corpora: Vec<CorpusRecordBody>,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusRecordBody {
    pub corpus: CorpusBody,
    pub corpus_status: Option<StatusResult>,
    pub size: Option<CorpusSizeBody>,
    pub size_status: Option<StatusResult>,
    pub api_key: Vec<ApiKeyBody>,
    pub api_key_status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_text")]
    pub dt_provision: String,
    pub enabled: bool,
}

impl From<ReadCorpusReply> for Response {
    fn from(reply: ReadCorpusReply) -> Self {
        let corpora = reply
            .corpora
            .into_iter()
            .map(|record| CorpusRecord {
                info: CorpusInfo {
                    corpus_id: record.corpus.id,
                    name: record.corpus.name,
                    description: record.corpus.description,
                    provisioned: record.corpus.dt_provision,
                    enabled: record.corpus.enabled,
                    size: record.size.map(|s| CorpusSize {
                        epoch_secs: s.epoch_secs,
                        size: s.size,
                    }),
                    api_keys: record
                        .api_key
                        .into_iter()
                        .map(|key| CorpusApiKey {
                            key_id: key.id,
                            description: key.description,
                            key_type: key.key_type,
                            enabled: key.enabled,
                        })
                        .collect(),
                },
                corpus_status: record.corpus_status.unwrap_or_default(),
                size_status: record.size_status.unwrap_or_default(),
                api_key_status: record.api_key_status.unwrap_or_default(),
            })
            .collect();

        Response::Corpora {
            status: reply.status.unwrap_or_default(),
            corpora,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsageMetricsReply {
    pub values: Vec<UsageValueBody>,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageValueBody {
    pub serving_value: Option<ServingValueBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServingValueBody {
    #[serde(deserialize_with = "lenient_text")]
    pub start: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub rows_read: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub query_count: i64,
}

impl From<UsageMetricsReply> for Response {
    fn from(reply: UsageMetricsReply) -> Self {
        let values = reply
            .values
            .into_iter()
            .filter_map(|value| value.serving_value)
            .map(|value| ServingUsage {
                start: value.start,
                rows_read: value.rows_read,
                query_count: value.query_count,
            })
            .collect();

        Response::UsageMetrics {
            status: reply.status.unwrap_or_default(),
            values,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManageUserReply {
    pub response: Vec<ManagedUserBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManagedUserBody {
    pub user: UserIdBody,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserIdBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
}

impl From<ManageUserReply> for Response {
    fn from(reply: ManageUserReply) -> Self {
        Response::UsersManaged(
            reply
                .response
                .into_iter()
                .map(|item| ManagedUser {
                    user_id: item.user.id,
                    status: item.status.unwrap_or_default(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListUsersReply {
    pub user: Vec<UserRecordBody>,
    pub status: Option<StatusResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecordBody {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub handle: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub comment: String,
    pub user_status: String,
}

impl From<ListUsersReply> for Response {
    fn from(reply: ListUsersReply) -> Self {
        let users = reply
            .user
            .into_iter()
            .map(|user| UserInfo {
                user_id: user.id,
                handle: user.handle,
                email: user.email,
                user_type: user.user_type,
                comment: user.comment,
                user_status: user.user_status,
            })
            .collect();

        // Older deployments answer without a status.
        Response::Users {
            status: reply.status.unwrap_or_default(),
            users,
        }
    }
}

/// Accepts a string or a number and keeps its text.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Wire::deserialize(deserializer)? {
        Wire::Text(text) => text,
        Wire::Number(number) => number.to_string(),
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(i64),
        Text(String),
    }

    match Wire::deserialize(deserializer)? {
        Wire::Number(value) => Ok(value),
        Wire::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;
    use serde_json::json;

    #[test]
    fn index_body_uses_section_key() {
        let document = Document {
            document_id: "doc-1".into(),
            title: "Title".into(),
            sections: vec![Section::text("hello")],
            ..Default::default()
        };
        let body = IndexRequest {
            customer_id: 1,
            corpus_id: 2,
            document: (&document).into(),
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "customerId": 1,
                "corpusId": 2,
                "document": {
                    "documentId": "doc-1",
                    "title": "Title",
                    "section": [{"title": "", "text": "hello", "metadataJson": ""}]
                }
            })
        );
    }

    #[test]
    fn decodes_query_reply_with_string_ids() {
        let reply: QueryReply = serde_json::from_value(json!({
            "responseSet": [{
                "response": [{
                    "text": "passage",
                    "score": 0.75,
                    "documentIndex": 0,
                    "corpusKey": {"customerId": "1", "corpusId": 2}
                }],
                "status": [],
                "document": [{"id": "doc-1"}]
            }],
            "status": [{"code": "OK"}]
        }))
        .unwrap();

        let Response::Query(batch) = Response::from(reply) else {
            panic!("Expected a query response");
        };
        let passage = &batch.response_sets[0].passages[0];
        assert_eq!(
            passage.corpus_key,
            Some(CorpusKey {
                customer_id: 1,
                corpus_id: 2
            })
        );
        assert_eq!(batch.response_sets[0].documents[0].id, "doc-1");
    }

    #[test]
    fn user_actions_address_users_by_id() {
        let user = NewUser {
            handle: "ada".into(),
            email: "ada@example.com".into(),
            roles: vec!["CustomerRole_Admin".into()],
        };

        assert_eq!(
            serde_json::to_value(ManageUserRequest::single(UserAction::add(&user))).unwrap(),
            json!({"userAction": [{
                "user": {
                    "handle": "ada",
                    "email": "ada@example.com",
                    "type": "USER_TYPE__USER",
                    "role": ["CustomerRole_Admin"]
                },
                "userActionType": "USER_ACTION_TYPE__ADD"
            }]})
        );
        assert_eq!(
            serde_json::to_value(UserAction::on_user(9, UserActionType::Disable)).unwrap(),
            json!({"user": {"id": 9}, "userActionType": "USER_ACTION_TYPE__DISABLE"})
        );
    }

    #[test]
    fn read_corpus_reply_keeps_part_statuses() {
        let reply: ReadCorpusReply = serde_json::from_value(json!({
            "corpora": [{
                "corpus": {"id": 5, "name": "docs", "description": "", "dtProvision": "1700000000", "enabled": true},
                "corpusStatus": {"code": "OK"},
                "size": {"epochSecs": "1700000100", "size": "2048"},
                "sizeStatus": {"code": "OK"},
                "apiKey": [{"id": "zqt_1", "description": "ci", "keyType": "API_KEY_TYPE__SERVING", "enabled": true}],
                "apiKeyStatus": {"code": "PERMISSION_DENIED", "statusDetail": "no key access"}
            }]
        }))
        .unwrap();

        let Response::Corpora { status, corpora } = Response::from(reply) else {
            panic!("Expected corpora");
        };
        assert!(status.is_ok());
        assert_eq!(corpora[0].info.size, Some(CorpusSize { epoch_secs: 1_700_000_100, size: 2048 }));
        assert_eq!(corpora[0].info.api_keys[0].key_id, "zqt_1");
        assert_eq!(corpora[0].api_key_status.code, StatusCode::PermissionDenied);
    }

    #[test]
    fn upload_reply_without_status_is_ok() {
        let reply: UploadReply = serde_json::from_value(json!({"response": {}})).unwrap();
        assert_eq!(Response::from(reply), Response::Status(StatusResult::ok()));

        let reply: UploadReply = serde_json::from_value(json!({
            "response": {"status": {"code": "ALREADY_EXISTS", "statusDetail": "dup"}}
        }))
        .unwrap();
        assert_eq!(
            Response::from(reply),
            Response::Status(StatusResult::new(StatusCode::AlreadyExists, "dup"))
        );
    }
}
