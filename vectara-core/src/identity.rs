//! # Identity Context
//!
//! The tenant (customer) and, for corpus-scoped calls, the corpus a request acts on.
//! Both transports send it alongside the credential: REST as decimal `customer-id` /
//! `corpus-id` headers, gRPC as 8-byte big-endian `customer-id-bin` / `corpus-id-bin`
//! binary metadata.

use crate::operation::QueryBatch;

pub const CUSTOMER_ID_HEADER: &str = "customer-id";
pub const CORPUS_ID_HEADER: &str = "corpus-id";
pub const CUSTOMER_ID_BIN_KEY: &str = "customer-id-bin";
pub const CORPUS_ID_BIN_KEY: &str = "corpus-id-bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityContext {
    pub customer_id: i64,
    pub corpus_id: Option<i64>,
}

impl IdentityContext {
    /// Identity for account-level calls (e.g. creating a corpus).
    pub fn for_account(customer_id: i64) -> Self {
        Self {
            customer_id,
            corpus_id: None,
        }
    }

    pub fn for_corpus(customer_id: i64, corpus_id: i64) -> Self {
        Self {
            customer_id,
            corpus_id: Some(corpus_id),
        }
    }

    /// Identity of a query: the corpus of its first corpus key.
    ///
    /// A batch without corpus keys yields an account identity, which the dispatcher
    /// rejects.
    pub fn for_query(customer_id: i64, batch: &QueryBatch) -> Self {
        Self {
            customer_id,
            corpus_id: batch.primary_corpus(),
        }
    }

    /// Packs the customer id the way gRPC metadata expects it.
    pub fn customer_id_bin(&self) -> [u8; 8] {
        self.customer_id.to_be_bytes()
    }

    pub fn corpus_id_bin(&self) -> Option<[u8; 8]> {
        self.corpus_id.map(i64::to_be_bytes)
    }
}
