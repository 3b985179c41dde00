//! # Vectara Core
//!
//! `vectara-core` is the library behind the `vectara` CLI. It knows how to authenticate
//! against the Vectara platform, how to shape each platform call for either of the two
//! public transports (REST/JSON and gRPC/Protobuf) and how to read the layered status
//! codes the platform answers with.
//!
//! ## Key Components
//!
//! * **[`auth`]:** Resolves a [`auth::Credential`] from an OAuth2 client-credentials grant
//!   or a static API key.
//! * **[`operation::Operation`]:** One variant per platform call, carrying a typed payload.
//! * **[`client::Transport`]:** The seam between operations and the wire. Implemented by
//!   [`rest::RestTransport`] and [`grpc::GrpcTransport`].
//! * **[`interpret`]:** Turns a [`operation::Response`] into an [`interpret::Outcome`]
//!   (success, informational, partial failure, failure).
//! * **[`client::VectaraClient`]:** Ties the pieces together for a single invocation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vectara_core::auth::{self, AuthMode};
//! use vectara_core::client::authenticate;
//! use vectara_core::endpoint::Endpoints;
//! use vectara_core::identity::IdentityContext;
//! use vectara_core::operation::{Operation, QueryBatch};
//! use vectara_core::rest::RestTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mode = AuthMode::ApiKey("zqt_...".into());
//! let endpoints = Endpoints::unified("api.vectara.io");
//!
//! let mut client = authenticate(&auth::token_http_client()?, &mode, async {
//!     RestTransport::new(&endpoints)
//! })
//! .await?;
//!
//! let batch = QueryBatch::single("who wrote this?", 10, 1234, 5);
//! let outcome = client
//!     .execute(IdentityContext::for_query(1234, &batch), &Operation::Query(batch))
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod grpc;
pub mod identity;
pub mod interpret;
pub mod operation;
pub mod rest;
pub mod status;

// Re-exports
pub use prost;
pub use reqwest;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
