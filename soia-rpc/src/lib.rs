//! # soia-rpc
//!
//! RPC envelope over HTTP for soia services.
//!
//! This crate provides:
//! - [`Method`]: the `(name, number, request, response)` contract of one
//!   remote procedure
//! - Request framing: `name:number:format:payload` bodies, where `format`
//!   is empty (dense JSON) or `readable`
//! - [`Service`]: a framework-agnostic request handler with method-listing
//!   self-description and the browser-based explorer page
//! - [`ServiceClient`]: a typed client over a pluggable [`HttpTransport`]
//! - [`http::serve`]: a ready-made hyper binding

mod client;
mod envelope;
mod error;
pub mod http;
mod method;
mod restudio;
mod service;

pub use client::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ServiceClient};
pub use envelope::RequestFrame;
pub use error::{BoxError, ClientError, RpcError};
pub use method::Method;
pub use service::{MethodListing, MethodSummary, RpcResponse, Service};
