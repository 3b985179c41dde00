//! # gRPC Binding
//!
//! Protobuf-over-HTTP/2 rendition of the platform operations, built on `tonic`.
pub mod client;
pub mod interceptor;
pub mod pb;

pub use client::GrpcTransport;
pub use interceptor::AuthInterceptor;
