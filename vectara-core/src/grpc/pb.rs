//! Protobuf messages of the `com.vectara` services, limited to the fields this crate sends
//! and reads. Unknown fields are skipped by the decoder, so the subset stays compatible with
//! the full platform schema.

/// `com.vectara.Status`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub status_detail: String,
}

// --- AdminService ------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Corpus {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateCorpusRequest {
    #[prost(message, optional, tag = "1")]
    pub corpus: Option<Corpus>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateCorpusResponse {
    #[prost(uint32, tag = "1")]
    pub corpus_id: u32,
    #[prost(message, optional, tag = "2")]
    pub status: Option<Status>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteCorpusRequest {
    #[prost(int64, tag = "1")]
    pub customer_id: i64,
    #[prost(int64, tag = "2")]
    pub corpus_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteCorpusResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResetCorpusRequest {
    #[prost(int64, tag = "1")]
    pub customer_id: i64,
    #[prost(int64, tag = "2")]
    pub corpus_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResetCorpusResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
}

// --- IndexService ------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Section {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(string, tag = "3")]
    pub text: String,
    #[prost(string, tag = "4")]
    pub metadata_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Document {
    #[prost(string, tag = "1")]
    pub document_id: String,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub metadata_json: String,
    #[prost(message, repeated, tag = "5")]
    pub section: Vec<Section>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexDocumentRequest {
    #[prost(int64, tag = "1")]
    pub customer_id: i64,
    #[prost(int64, tag = "2")]
    pub corpus_id: i64,
    #[prost(message, optional, tag = "3")]
    pub document: Option<Document>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexDocumentResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteDocumentRequest {
    #[prost(int64, tag = "1")]
    pub customer_id: i64,
    #[prost(int64, tag = "2")]
    pub corpus_id: i64,
    #[prost(string, tag = "3")]
    pub document_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteDocumentResponse {}

// --- QueryService ------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CorpusKey {
    #[prost(uint32, tag = "1")]
    pub customer_id: u32,
    #[prost(uint32, tag = "2")]
    pub corpus_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryRequest {
    #[prost(string, tag = "1")]
    pub query: String,
    #[prost(uint32, tag = "2")]
    pub start: u32,
    #[prost(uint32, tag = "3")]
    pub num_results: u32,
    #[prost(message, repeated, tag = "4")]
    pub corpus_key: Vec<CorpusKey>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchQueryRequest {
    #[prost(message, repeated, tag = "1")]
    pub query: Vec<QueryRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(float, tag = "2")]
    pub score: f32,
    #[prost(uint32, tag = "4")]
    pub document_index: u32,
    #[prost(message, optional, tag = "5")]
    pub corpus_key: Option<CorpusKey>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseDocument {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseSet {
    #[prost(message, repeated, tag = "1")]
    pub response: Vec<Response>,
    #[prost(message, repeated, tag = "2")]
    pub status: Vec<Status>,
    #[prost(message, repeated, tag = "3")]
    pub document: Vec<ResponseDocument>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchQueryResponse {
    #[prost(message, repeated, tag = "1")]
    pub response_set: Vec<ResponseSet>,
    #[prost(message, repeated, tag = "2")]
    pub status: Vec<Status>,
}
