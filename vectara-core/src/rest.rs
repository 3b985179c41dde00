//! # REST Binding
//!
//! JSON-over-HTTPS rendition of the platform operations, built on `reqwest`.
pub mod client;
pub mod model;

pub use client::RestTransport;
