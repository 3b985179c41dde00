//! # Response Interpretation
//!
//! Turns a transport [`Response`] into an [`Outcome`]. Statuses appear at three levels:
//!
//! * **call**: the response as a whole (`status` of a batch, a create-corpus status, ...),
//! * **corpus**: one per query response set,
//! * **item**: one per element of a multi-item request (API keys) or a broken passage.
//!
//! `OK` is always a success. Every other code is looked up in a [`StatusPolicy`], which
//! decides whether it only annotates the result or counts as a failure. A failure at one
//! level never stops sibling units from being processed, so a batch with one broken corpus
//! still returns the hits of the others as a [`Outcome::PartialFailure`].
use crate::operation::{
    ApiKeyInfo, BatchQueryResponse, CorpusInfo, CorpusKey, CorpusRecord, CorpusSize,
    CreatedApiKey, ManagedUser, Operation, OperationKind, Response, ServingUsage, UserInfo,
};
use crate::status::{StatusCode, StatusResult};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// What a non-OK status means for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Reported, but the operation still counts as done.
    Informational,
    Failure,
}

/// Per-operation classification of non-OK status codes.
///
/// The default policy treats `ALREADY_EXISTS` as informational when indexing or
/// uploading (re-indexing the same document is a no-op) and everything else as failure.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPolicy {
    overrides: HashMap<(OperationKind, StatusCode), Disposition>,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::strict()
            .with(
                OperationKind::IndexDocument,
                StatusCode::AlreadyExists,
                Disposition::Informational,
            )
            .with(
                OperationKind::UploadFile,
                StatusCode::AlreadyExists,
                Disposition::Informational,
            )
    }
}

impl StatusPolicy {
    /// Every non-OK status is a failure.
    pub fn strict() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: OperationKind, code: StatusCode, disposition: Disposition) -> Self {
        self.overrides.insert((kind, code), disposition);
        self
    }

    pub fn disposition(&self, kind: OperationKind, code: &StatusCode) -> Disposition {
        self.overrides
            .get(&(kind, code.clone()))
            .copied()
            .unwrap_or(Disposition::Failure)
    }
}

/// Where in a response a status was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "index", rename_all = "camelCase")]
pub enum StatusLevel {
    Call,
    /// Index of the response set.
    Corpus(usize),
    /// Index of the item within its request or response set.
    Item(usize),
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Call => f.write_str("call"),
            StatusLevel::Corpus(index) => write!(f, "corpus #{index}"),
            StatusLevel::Item(index) => write!(f, "item #{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFailure {
    pub level: StatusLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_key: Option<CorpusKey>,
    pub status: StatusResult,
}

impl fmt::Display for StatusFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.corpus_key {
            Some(key) => write!(f, "[{} {key}] {}", self.level, self.status),
            None => write!(f, "[{}] {}", self.level, self.status),
        }
    }
}

/// A scored passage of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHit {
    pub score: f32,
    pub document_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_key: Option<CorpusKey>,
}

impl fmt::Display for QueryHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {} {}", self.score, self.document_id, self.text)
    }
}

/// The usable part of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Extracted {
    /// The call has no payload beyond its statuses.
    Ack,
    CorpusId(i64),
    /// Hits in platform order, response set by response set.
    Hits(Vec<QueryHit>),
    CorpusSize(CorpusSize),
    ApiKeyIds(Vec<String>),
    ApiKeys(Vec<ApiKeyInfo>),
    CorpusInfo(CorpusInfo),
    UsageMetrics(Vec<ServingUsage>),
    /// Ids of the users whose action succeeded.
    UserIds(Vec<i64>),
    Users(Vec<UserInfo>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    Success {
        extracted: Extracted,
    },
    Informational {
        extracted: Extracted,
        statuses: Vec<StatusResult>,
    },
    PartialFailure {
        extracted: Extracted,
        failures: Vec<StatusFailure>,
    },
    Failure {
        failures: Vec<StatusFailure>,
    },
}

impl Outcome {
    /// Whether the caller should stop a multi-step flow.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    pub fn extracted(&self) -> Option<&Extracted> {
        match self {
            Outcome::Success { extracted }
            | Outcome::Informational { extracted, .. }
            | Outcome::PartialFailure { extracted, .. } => Some(extracted),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn failures(&self) -> &[StatusFailure] {
        match self {
            Outcome::PartialFailure { failures, .. } | Outcome::Failure { failures } => failures,
            _ => &[],
        }
    }
}

/// Collects statuses while a response is walked.
struct Ledger<'a> {
    kind: OperationKind,
    policy: &'a StatusPolicy,
    informational: Vec<StatusResult>,
    failures: Vec<StatusFailure>,
}

impl<'a> Ledger<'a> {
    fn new(kind: OperationKind, policy: &'a StatusPolicy) -> Self {
        Self {
            kind,
            policy,
            informational: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Records `status` and reports whether its unit is still usable.
    fn record(
        &mut self,
        level: StatusLevel,
        corpus_key: Option<CorpusKey>,
        status: StatusResult,
    ) -> bool {
        if status.is_ok() {
            return true;
        }

        match self.policy.disposition(self.kind, &status.code) {
            Disposition::Informational => {
                self.informational.push(status);
                true
            }
            Disposition::Failure => {
                self.failures.push(StatusFailure {
                    level,
                    corpus_key,
                    status,
                });
                false
            }
        }
    }

    fn record_all(
        &mut self,
        level: StatusLevel,
        corpus_key: Option<CorpusKey>,
        statuses: Vec<StatusResult>,
    ) -> bool {
        statuses
            .into_iter()
            .fold(true, |usable, status| self.record(level, corpus_key, status) && usable)
    }

    fn finish(self, extracted: Extracted, usable: bool) -> Outcome {
        if !self.failures.is_empty() {
            return if usable {
                Outcome::PartialFailure {
                    extracted,
                    failures: self.failures,
                }
            } else {
                Outcome::Failure {
                    failures: self.failures,
                }
            };
        }

        if self.informational.is_empty() {
            Outcome::Success { extracted }
        } else {
            Outcome::Informational {
                extracted,
                statuses: self.informational,
            }
        }
    }
}

/// Classifies `response`, the answer to `operation`, under `policy`.
pub fn interpret(operation: &Operation, response: Response, policy: &StatusPolicy) -> Outcome {
    let mut ledger = Ledger::new(operation.kind(), policy);

    match response {
        Response::Status(status) => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::Ack, false)
        }
        Response::CreateCorpus { status, corpus_id } => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::CorpusId(corpus_id), false)
        }
        Response::CorpusSize { status, size } => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::CorpusSize(size), false)
        }
        Response::ApiKeys { status, keys } => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::ApiKeys(keys), false)
        }
        Response::Statuses(statuses) => {
            let mut usable = false;
            for (index, status) in statuses.into_iter().enumerate() {
                usable |= ledger.record(StatusLevel::Item(index), None, status);
            }
            ledger.finish(Extracted::Ack, usable)
        }
        Response::ApiKeysCreated(created) => {
            let ids = created_key_ids(&mut ledger, created);
            let usable = !ids.is_empty();
            ledger.finish(Extracted::ApiKeyIds(ids), usable)
        }
        Response::UsageMetrics { status, values } => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::UsageMetrics(values), false)
        }
        Response::Users { status, users } => {
            ledger.record(StatusLevel::Call, None, status);
            ledger.finish(Extracted::Users(users), false)
        }
        Response::UsersManaged(users) => {
            let ids = managed_user_ids(&mut ledger, users);
            let usable = !ids.is_empty();
            ledger.finish(Extracted::UserIds(ids), usable)
        }
        Response::Corpora { status, corpora } => {
            let call_ok = ledger.record(StatusLevel::Call, None, status);
            match read_corpus(&mut ledger, corpora) {
                Some(info) => ledger.finish(Extracted::CorpusInfo(info), call_ok),
                None => ledger.finish(Extracted::Ack, false),
            }
        }
        Response::Query(batch) => {
            let corpus_keys = match operation {
                Operation::Query(query) => query.corpus_keys(),
                _ => Vec::new(),
            };
            let (hits, usable) = extract_hits(&mut ledger, batch, &corpus_keys);
            ledger.finish(Extracted::Hits(hits), usable)
        }
    }
}

fn created_key_ids(ledger: &mut Ledger<'_>, created: Vec<CreatedApiKey>) -> Vec<String> {
    created
        .into_iter()
        .enumerate()
        .filter_map(|(index, key)| {
            ledger
                .record(StatusLevel::Item(index), None, key.status)
                .then_some(key.key_id)
        })
        .collect()
}

fn managed_user_ids(ledger: &mut Ledger<'_>, users: Vec<ManagedUser>) -> Vec<i64> {
    users
        .into_iter()
        .enumerate()
        .filter_map(|(index, user)| {
            ledger
                .record(StatusLevel::Item(index), None, user.status)
                .then_some(user.user_id)
        })
        .collect()
}

/// Picks the first corpus of a read-corpus answer.
///
/// A missing corpus or a failed corpus status leaves nothing usable. Failed size or
/// API key reads only drop that part.
fn read_corpus(ledger: &mut Ledger<'_>, corpora: Vec<CorpusRecord>) -> Option<CorpusInfo> {
    let Some(record) = corpora.into_iter().next() else {
        ledger.record(
            StatusLevel::Corpus(0),
            None,
            StatusResult::new(StatusCode::NotFound, "corpus not found"),
        );
        return None;
    };

    let mut info = record.info;
    if !ledger.record(StatusLevel::Corpus(0), None, record.corpus_status) {
        return None;
    }
    if !ledger.record(StatusLevel::Item(0), None, record.size_status) {
        info.size = None;
    }
    if !ledger.record(StatusLevel::Item(1), None, record.api_key_status) {
        info.api_keys.clear();
    }
    Some(info)
}

/// Flattens the response sets into hits and reports whether any set was usable.
///
/// Response set `i` belongs to the `i`-th corpus key of the request.
fn extract_hits(
    ledger: &mut Ledger<'_>,
    batch: BatchQueryResponse,
    corpus_keys: &[CorpusKey],
) -> (Vec<QueryHit>, bool) {
    let call_ok = ledger.record_all(StatusLevel::Call, None, batch.status);
    let had_sets = !batch.response_sets.is_empty();
    let mut hits = Vec::new();
    let mut any_set_ok = false;

    for (set_index, set) in batch.response_sets.into_iter().enumerate() {
        let set_key = corpus_keys.get(set_index).copied();
        any_set_ok |= ledger.record_all(StatusLevel::Corpus(set_index), set_key, set.status);

        for (passage_index, passage) in set.passages.into_iter().enumerate() {
            let corpus_key = passage.corpus_key.or(set_key);
            let document_id = match set.documents.get(passage.document_index as usize) {
                Some(document) => document.id.clone(),
                None => {
                    ledger.record(
                        StatusLevel::Item(passage_index),
                        corpus_key,
                        StatusResult::new(
                            StatusCode::OutOfRange,
                            format!(
                                "document index {} outside {} documents",
                                passage.document_index,
                                set.documents.len()
                            ),
                        ),
                    );
                    String::new()
                }
            };

            hits.push(QueryHit {
                score: passage.score,
                document_id,
                text: passage.text,
                corpus_key,
            });
        }
    }

    let usable = if had_sets {
        any_set_ok || !hits.is_empty()
    } else {
        call_ok
    };
    (hits, usable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{
        ApiKeyType, CorpusApiKey, Document, NewApiKey, Passage, QueryBatch, QuerySpec,
        ResponseDocument, ResponseSet,
    };

    fn key(corpus_id: i64) -> CorpusKey {
        CorpusKey {
            customer_id: 1,
            corpus_id,
        }
    }

    fn index_op() -> Operation {
        Operation::IndexDocument(Document {
            document_id: "doc-1".into(),
            ..Default::default()
        })
    }

    fn two_corpus_query() -> Operation {
        Operation::Query(QueryBatch {
            queries: vec![QuerySpec {
                query: "q".into(),
                start: 0,
                num_results: 10,
                corpus_keys: vec![key(10), key(20)],
            }],
        })
    }

    fn passage(text: &str, score: f32, document_index: u32) -> Passage {
        Passage {
            text: text.into(),
            score,
            document_index,
            corpus_key: None,
        }
    }

    #[test]
    fn already_exists_on_index_is_informational() {
        let status = StatusResult::new(StatusCode::AlreadyExists, "doc-1 exists");
        let outcome = interpret(&index_op(), Response::Status(status.clone()), &StatusPolicy::default());

        assert_eq!(
            outcome,
            Outcome::Informational {
                extracted: Extracted::Ack,
                statuses: vec![status]
            }
        );
    }

    #[test]
    fn already_exists_elsewhere_is_a_failure() {
        let status = StatusResult::new(StatusCode::AlreadyExists, "");
        let outcome = interpret(
            &Operation::DeleteCorpus,
            Response::Status(status),
            &StatusPolicy::default(),
        );
        assert!(outcome.is_failure());

        let strict = interpret(
            &index_op(),
            Response::Status(StatusResult::new(StatusCode::AlreadyExists, "")),
            &StatusPolicy::strict(),
        );
        assert!(strict.is_failure());
    }

    #[test]
    fn ok_status_is_success() {
        let outcome = interpret(
            &Operation::ResetCorpus,
            Response::Status(StatusResult::ok()),
            &StatusPolicy::default(),
        );
        assert_eq!(
            outcome,
            Outcome::Success {
                extracted: Extracted::Ack
            }
        );
    }

    #[test]
    fn hits_keep_platform_order_and_resolve_document_ids() {
        let batch = BatchQueryResponse {
            status: vec![],
            response_sets: vec![ResponseSet {
                status: vec![],
                passages: vec![passage("second doc", 0.91, 1), passage("first doc", 0.42, 0)],
                documents: vec![
                    ResponseDocument { id: "a".into() },
                    ResponseDocument { id: "b".into() },
                ],
            }],
        };

        let outcome = interpret(&two_corpus_query(), Response::Query(batch), &StatusPolicy::default());
        let Outcome::Success {
            extracted: Extracted::Hits(hits),
        } = outcome
        else {
            panic!("Expected hits, got {outcome:?}");
        };

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "b");
        assert_eq!(hits[0].corpus_key, Some(key(10)));
        assert_eq!(hits[1].document_id, "a");
        assert_eq!(hits[0].to_string(), "0.910 b second doc");
    }

    #[test]
    fn one_failing_corpus_is_a_partial_failure() {
        let batch = BatchQueryResponse {
            status: vec![],
            response_sets: vec![
                ResponseSet {
                    status: vec![StatusResult::ok()],
                    passages: vec![passage("hit", 0.5, 0)],
                    documents: vec![ResponseDocument { id: "a".into() }],
                },
                ResponseSet {
                    status: vec![StatusResult::new(StatusCode::PermissionDenied, "no access")],
                    passages: vec![],
                    documents: vec![],
                },
            ],
        };

        let outcome = interpret(&two_corpus_query(), Response::Query(batch), &StatusPolicy::default());
        let Outcome::PartialFailure {
            extracted: Extracted::Hits(hits),
            failures,
        } = outcome
        else {
            panic!("Expected a partial failure, got {outcome:?}");
        };

        assert_eq!(hits.len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].level, StatusLevel::Corpus(1));
        assert_eq!(failures[0].corpus_key, Some(key(20)));
        assert_eq!(failures[0].status.code, StatusCode::PermissionDenied);
    }

    #[test]
    fn out_of_range_document_index_is_an_item_failure() {
        let batch = BatchQueryResponse {
            status: vec![],
            response_sets: vec![ResponseSet {
                status: vec![],
                passages: vec![passage("orphan", 0.3, 5)],
                documents: vec![],
            }],
        };

        let outcome = interpret(&two_corpus_query(), Response::Query(batch), &StatusPolicy::default());
        let Outcome::PartialFailure {
            extracted: Extracted::Hits(hits),
            failures,
        } = outcome
        else {
            panic!("Expected a partial failure, got {outcome:?}");
        };

        assert_eq!(hits[0].document_id, "");
        assert_eq!(failures[0].level, StatusLevel::Item(0));
        assert_eq!(failures[0].status.code, StatusCode::OutOfRange);
    }

    #[test]
    fn failed_query_without_results_is_a_failure() {
        let batch = BatchQueryResponse {
            status: vec![StatusResult::new(StatusCode::Unauthenticated, "bad token")],
            response_sets: vec![],
        };

        let outcome = interpret(&two_corpus_query(), Response::Query(batch), &StatusPolicy::default());
        assert!(outcome.is_failure());
        assert_eq!(outcome.failures()[0].level, StatusLevel::Call);
    }

    #[test]
    fn created_keys_are_reported_per_item() {
        let created = vec![
            CreatedApiKey {
                key_id: "zqt_ok".into(),
                status: StatusResult::ok(),
            },
            CreatedApiKey {
                key_id: String::new(),
                status: StatusResult::new(StatusCode::ResourceExhausted, "quota"),
            },
        ];

        let op = Operation::CreateApiKey(NewApiKey {
            description: "two keys".into(),
            key_type: ApiKeyType::Serving,
            corpus_ids: vec![10],
        });
        let outcome = interpret(&op, Response::ApiKeysCreated(created), &StatusPolicy::default());

        assert_eq!(
            outcome.extracted(),
            Some(&Extracted::ApiKeyIds(vec!["zqt_ok".into()]))
        );
        assert_eq!(outcome.failures()[0].level, StatusLevel::Item(1));
    }

    fn corpus_record(api_key_status: StatusResult) -> CorpusRecord {
        CorpusRecord {
            info: CorpusInfo {
                corpus_id: 5,
                name: "docs".into(),
                size: Some(CorpusSize {
                    epoch_secs: 1,
                    size: 2048,
                }),
                api_keys: vec![CorpusApiKey {
                    key_id: "zqt_1".into(),
                    description: String::new(),
                    key_type: "API_KEY_TYPE__SERVING".into(),
                    enabled: true,
                }],
                ..Default::default()
            },
            corpus_status: StatusResult::ok(),
            size_status: StatusResult::ok(),
            api_key_status,
        }
    }

    #[test]
    fn failed_api_key_read_keeps_the_rest_of_the_corpus() {
        let response = Response::Corpora {
            status: StatusResult::ok(),
            corpora: vec![corpus_record(StatusResult::new(
                StatusCode::PermissionDenied,
                "no key access",
            ))],
        };

        let outcome = interpret(&Operation::ReadCorpus, response, &StatusPolicy::default());
        let Outcome::PartialFailure {
            extracted: Extracted::CorpusInfo(info),
            failures,
        } = outcome
        else {
            panic!("Expected a partial failure, got {outcome:?}");
        };

        assert_eq!(info.corpus_id, 5);
        assert_eq!(info.size.map(|s| s.size), Some(2048));
        assert!(info.api_keys.is_empty());
        assert_eq!(failures[0].level, StatusLevel::Item(1));
    }

    #[test]
    fn read_corpus_without_corpora_is_not_found() {
        let response = Response::Corpora {
            status: StatusResult::ok(),
            corpora: vec![],
        };

        let outcome = interpret(&Operation::ReadCorpus, response, &StatusPolicy::default());

        assert!(outcome.is_failure());
        assert_eq!(outcome.failures()[0].status.code, StatusCode::NotFound);
    }

    #[test]
    fn managed_users_report_successful_ids() {
        let users = vec![
            ManagedUser {
                user_id: 41,
                status: StatusResult::ok(),
            },
            ManagedUser {
                user_id: 0,
                status: StatusResult::new(StatusCode::AlreadyExists, "handle taken"),
            },
        ];

        let op = Operation::DeleteUser { user_id: 41 };
        let outcome = interpret(&op, Response::UsersManaged(users), &StatusPolicy::default());

        assert_eq!(outcome.extracted(), Some(&Extracted::UserIds(vec![41])));
        assert_eq!(outcome.failures()[0].level, StatusLevel::Item(1));
    }
}
