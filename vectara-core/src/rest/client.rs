//! # REST Transport
//!
//! One `POST` per operation. JSON bodies everywhere except file upload, which is
//! `multipart/form-data` (`reqwest` picks a random boundary per request).
//!
//! Every request carries the `customer-id` header, `corpus-id` when the identity names a
//! corpus, and the single auth header of the credential.
use super::model::*;
use crate::client::{Call, Transport, TransportError};
use crate::endpoint::{Endpoint, Endpoints, join_url};
use crate::identity::{CORPUS_ID_HEADER, CUSTOMER_ID_HEADER};
use crate::operation::{FileUpload, Operation, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
enum Target {
    Endpoints(Endpoints),
    /// Every endpoint answered by one base url (local servers and tests).
    Base(String),
}

/// The REST binding of the platform API.
#[derive(Debug, Clone)]
pub struct RestTransport {
    http: reqwest::Client,
    target: Target,
}

impl RestTransport {
    /// A transport that only ever speaks HTTPS.
    pub fn new(endpoints: &Endpoints) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .https_only(true)
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            http,
            target: Target::Endpoints(endpoints.clone()),
        })
    }

    /// Sends every call to `base_url` through a caller-supplied client.
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            target: Target::Base(base_url.into()),
        }
    }

    pub fn url(&self, endpoint: Endpoint, path: &str) -> String {
        match &self.target {
            Target::Endpoints(endpoints) => endpoints.rest_url(endpoint, path),
            Target::Base(base) => join_url(base, path),
        }
    }

    fn headers(call: &Call<'_>) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CUSTOMER_ID_HEADER,
            HeaderValue::from(call.identity.customer_id),
        );
        if let Some(corpus_id) = call.identity.corpus_id {
            headers.insert(CORPUS_ID_HEADER, HeaderValue::from(corpus_id));
        }

        let (name, value) = call.credential.auth_header();
        let mut value =
            HeaderValue::from_str(&value).map_err(|_| TransportError::InvalidMetadata(name))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), value);

        Ok(headers)
    }

    async fn post_json<B, R>(
        &self,
        call: &Call<'_>,
        path: &str,
        body: &B,
    ) -> Result<Response, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Into<Response>,
    {
        let url = self.url(call.endpoint, path);
        tracing::debug!(%url, operation = %call.operation.kind(), "sending REST request");

        let request = self.http.post(&url).headers(Self::headers(call)?).json(body);
        read_reply::<R>(url, request).await
    }

    async fn upload(&self, call: &Call<'_>, file: &FileUpload) -> Result<Response, TransportError> {
        let url = self.url(call.endpoint, UPLOAD_PATH);
        tracing::debug!(%url, file = %file.file_name, "uploading file");

        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| TransportError::InvalidArgument {
                    field: "content_type",
                    reason: format!("'{content_type}' is not a mime type: {e}"),
                })?;
        }

        let form = Form::new()
            .text("c", call.identity.customer_id.to_string())
            .text(
                "o",
                call.identity.corpus_id.unwrap_or_default().to_string(),
            )
            .part("file", part);

        let request = self.http.post(&url).headers(Self::headers(call)?).multipart(form);
        read_reply::<UploadReply>(url, request).await
    }
}

async fn read_reply<R>(url: String, request: reqwest::RequestBuilder) -> Result<Response, TransportError>
where
    R: DeserializeOwned + Into<Response>,
{
    let response = request.send().await.map_err(TransportError::Http)?;
    let status = response.status();
    let body = response.text().await.map_err(TransportError::Http)?;

    if !status.is_success() {
        // A platform status in the body outranks the HTTP status.
        let answer = serde_json::from_str::<R>(&body)
            .ok()
            .map(Into::<Response>::into)
            .filter(Response::reports_failure);
        if let Some(answer) = answer {
            tracing::debug!(%url, status = status.as_u16(), "error reply carries a platform status");
            return Ok(answer);
        }

        return Err(TransportError::HttpStatus {
            url,
            status: status.as_u16(),
            body,
        });
    }

    // Some calls answer with an empty body on success.
    let reply: R = if body.trim().is_empty() {
        serde_json::from_str("{}").map_err(TransportError::Decode)?
    } else {
        serde_json::from_str(&body).map_err(TransportError::Decode)?
    };

    Ok(reply.into())
}

impl Transport for RestTransport {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn dispatch(&mut self, call: Call<'_>) -> Result<Response, TransportError> {
        let customer_id = call.identity.customer_id;
        let corpus_id = call.identity.corpus_id.unwrap_or_default();

        match call.operation {
            Operation::CreateCorpus(corpus) => {
                self.post_json::<_, CreateCorpusReply>(
                    &call,
                    CREATE_CORPUS_PATH,
                    &CreateCorpusRequest { corpus },
                )
                .await
            }
            Operation::ResetCorpus => {
                let body = CorpusRef {
                    customer_id,
                    corpus_id,
                };
                self.post_json::<_, StatusReply>(&call, RESET_CORPUS_PATH, &body)
                    .await
            }
            Operation::DeleteCorpus => {
                let body = CorpusRef {
                    customer_id,
                    corpus_id,
                };
                self.post_json::<_, StatusReply>(&call, DELETE_CORPUS_PATH, &body)
                    .await
            }
            Operation::IndexDocument(document) => {
                let body = IndexRequest {
                    customer_id,
                    corpus_id,
                    document: document.into(),
                };
                self.post_json::<_, StatusReply>(&call, INDEX_PATH, &body).await
            }
            Operation::UploadFile(file) => self.upload(&call, file).await,
            Operation::DeleteDocument { document_id } => {
                let body = DeleteDocRequest {
                    customer_id,
                    corpus_id,
                    document_id,
                };
                self.post_json::<_, StatusReply>(&call, DELETE_DOC_PATH, &body)
                    .await
            }
            Operation::Query(batch) => {
                let body = QueryRequest {
                    query: batch.queries.iter().map(QueryBody::from).collect(),
                };
                self.post_json::<_, QueryReply>(&call, QUERY_PATH, &body).await
            }
            Operation::ComputeCorpusSize => {
                self.post_json::<_, CorpusSizeReply>(
                    &call,
                    COMPUTE_CORPUS_SIZE_PATH,
                    &CorpusIdRequest { corpus_id },
                )
                .await
            }
            Operation::SetCorpusEnabled { enabled } => {
                let body = CorpusEnablementRequest {
                    corpus_id,
                    enable: *enabled,
                };
                self.post_json::<_, StatusReply>(&call, CORPUS_ENABLEMENT_PATH, &body)
                    .await
            }
            Operation::CreateApiKey(key) => {
                let body = CreateApiKeyRequest {
                    api_key_data: vec![key.into()],
                };
                self.post_json::<_, CreateApiKeyReply>(&call, CREATE_API_KEY_PATH, &body)
                    .await
            }
            Operation::SetApiKeyEnabled { key_id, enabled } => {
                let body = EnableApiKeyRequest {
                    key_enablement: vec![KeyEnablement {
                        key_id,
                        enable: *enabled,
                    }],
                };
                self.post_json::<_, StatusListReply>(&call, ENABLE_API_KEY_PATH, &body)
                    .await
            }
            Operation::DeleteApiKey { key_id } => {
                let body = DeleteApiKeyRequest {
                    key_id: vec![key_id.as_str()],
                };
                self.post_json::<_, StatusListReply>(&call, DELETE_API_KEY_PATH, &body)
                    .await
            }
            Operation::ListApiKeys { num_results } => {
                let body = ListApiKeysRequest {
                    num_results: *num_results,
                    read_corpora_info: true,
                };
                self.post_json::<_, ListApiKeysReply>(&call, LIST_API_KEYS_PATH, &body)
                    .await
            }
            Operation::ReadCorpus => {
                self.post_json::<_, ReadCorpusReply>(
                    &call,
                    READ_CORPUS_PATH,
                    &ReadCorpusRequest::everything(corpus_id),
                )
                .await
            }
            Operation::GetUsageMetrics(window) => {
                let body = UsageMetricsRequest::serving(corpus_id, window);
                self.post_json::<_, UsageMetricsReply>(&call, USAGE_METRICS_PATH, &body)
                    .await
            }
            Operation::CreateUser(user) => {
                let body = ManageUserRequest::single(UserAction::add(user));
                self.post_json::<_, ManageUserReply>(&call, MANAGE_USER_PATH, &body)
                    .await
            }
            Operation::DeleteUser { user_id } => {
                let body = ManageUserRequest::single(UserAction::on_user(
                    *user_id,
                    UserActionType::Delete,
                ));
                self.post_json::<_, ManageUserReply>(&call, MANAGE_USER_PATH, &body)
                    .await
            }
            Operation::SetUserEnabled { user_id, enabled } => {
                let action = if *enabled {
                    UserActionType::Enable
                } else {
                    UserActionType::Disable
                };
                let body = ManageUserRequest::single(UserAction::on_user(*user_id, action));
                self.post_json::<_, ManageUserReply>(&call, MANAGE_USER_PATH, &body)
                    .await
            }
            Operation::ListUsers { num_results } => {
                let body = ListUsersRequest::all(*num_results);
                self.post_json::<_, ListUsersReply>(&call, LIST_USERS_PATH, &body)
                    .await
            }
        }
    }
}
