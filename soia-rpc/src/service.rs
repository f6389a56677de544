//! Framework-agnostic service: method table and request dispatch.

use crate::envelope::RequestFrame;
use crate::error::{BoxError, RpcError};
use crate::method::Method;
use crate::restudio::RESTUDIO_HTML;
use serde::Serialize;
use serde_json::Value;
use soia::JsonFlavor;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// An HTTP-shaped response the host framework writes out.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl RpcResponse {
    fn ok_json(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    fn ok_html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_HTML,
            body: body.to_owned(),
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: 400,
            content_type: CONTENT_TYPE_TEXT,
            body: message,
        }
    }

    fn server_error(message: String) -> Self {
        Self {
            status: 500,
            content_type: CONTENT_TYPE_TEXT,
            body: message,
        }
    }
}

type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BoxError>> + Send + 'a>>;

/// Parses the request synchronously (a 400 on failure), then runs the
/// user handler and serializes the response in the request's flavor.
trait ErasedHandler: Send + Sync {
    fn call<'a>(
        &'a self,
        request: &'a Value,
        flavor: JsonFlavor,
    ) -> Result<HandlerFuture<'a>, soia::DecodeError>;
}

struct MethodHandler<Req, Resp, H> {
    method: Method<Req, Resp>,
    handler: H,
}

impl<Req, Resp, H, Fut> ErasedHandler for MethodHandler<Req, Resp, H>
where
    Req: Send + 'static,
    Resp: 'static,
    H: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, BoxError>> + Send,
{
    fn call<'a>(
        &'a self,
        request: &'a Value,
        flavor: JsonFlavor,
    ) -> Result<HandlerFuture<'a>, soia::DecodeError> {
        let request = self.method.request_serializer.from_json(request)?;
        Ok(Box::pin(async move {
            let response = (self.handler)(request).await?;
            Ok(self
                .method
                .response_serializer
                .to_json_code(&response, flavor))
        }))
    }
}

struct MethodEntry {
    name: &'static str,
    number: i32,
    request_type: Value,
    response_type: Value,
    handler: Box<dyn ErasedHandler>,
}

/// One entry of the method-listing document.
#[derive(Debug, Clone, Serialize)]
pub struct MethodSummary {
    pub method: &'static str,
    pub number: i32,
    /// Type descriptor JSON of the request type.
    pub request: Value,
    /// Type descriptor JSON of the response type.
    pub response: Value,
}

/// The self-description document served for `""` and `"list"` bodies.
#[derive(Debug, Clone, Serialize)]
pub struct MethodListing {
    pub methods: Vec<MethodSummary>,
}

/// A set of methods sharing one HTTP endpoint.
///
/// `handle_request` is async but suspends only on the user handler future;
/// serialization itself never suspends. Cancellation of the future simply
/// drops it: no partial response is produced.
#[derive(Default)]
pub struct Service {
    methods: HashMap<i32, MethodEntry>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method with its handler. Method numbers must be unique
    /// within a service.
    pub fn add_method<Req, Resp, H, Fut>(
        &mut self,
        method: Method<Req, Resp>,
        handler: H,
    ) -> Result<(), RpcError>
    where
        Req: Send + 'static,
        Resp: 'static,
        H: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, BoxError>> + Send + 'static,
    {
        if self.methods.contains_key(&method.number) {
            return Err(RpcError::DuplicateMethodNumber(method.number));
        }
        let entry = MethodEntry {
            name: method.name,
            number: method.number,
            request_type: method.request_serializer.type_descriptor().as_json(),
            response_type: method.response_serializer.type_descriptor().as_json(),
            handler: Box::new(MethodHandler { method, handler }),
        };
        self.methods.insert(entry.number, entry);
        Ok(())
    }

    /// Lists every registered method with its full type descriptors.
    pub fn method_list(&self) -> MethodListing {
        let mut entries: Vec<&MethodEntry> = self.methods.values().collect();
        entries.sort_by_key(|e| e.number);
        MethodListing {
            methods: entries
                .iter()
                .map(|e| MethodSummary {
                    method: e.name,
                    number: e.number,
                    request: e.request_type.clone(),
                    response: e.response_type.clone(),
                })
                .collect(),
        }
    }

    /// Handles one request body, returning the response the host framework
    /// should write out.
    pub async fn handle_request(&self, body: &str) -> RpcResponse {
        match body {
            "" | "list" => {
                let listing = self.method_list();
                RpcResponse::ok_json(
                    serde_json::to_string(&listing).unwrap_or_else(|_| "{}".to_owned()),
                )
            }
            "restudio" => RpcResponse::ok_html(RESTUDIO_HTML),
            _ => self.dispatch(body).await,
        }
    }

    async fn dispatch(&self, body: &str) -> RpcResponse {
        let frame = match RequestFrame::parse(body) {
            Ok(frame) => frame,
            Err(e) => return RpcResponse::bad_request(e.to_string()),
        };
        let entry = match self.methods.get(&frame.method_number) {
            Some(entry) => entry,
            None => {
                tracing::warn!(
                    "Unknown method: {} (number={})",
                    frame.method_name,
                    frame.method_number
                );
                return RpcResponse::bad_request(
                    RpcError::UnknownMethod(frame.method_number).to_string(),
                );
            }
        };
        let request_json: Value = match serde_json::from_str(frame.payload) {
            Ok(value) => value,
            Err(e) => return RpcResponse::bad_request(format!("bad request: {e}")),
        };
        tracing::debug!("Request: {} (number={})", entry.name, entry.number);
        let future = match entry.handler.call(&request_json, frame.flavor) {
            Ok(future) => future,
            Err(e) => return RpcResponse::bad_request(format!("bad request: {e}")),
        };
        match future.await {
            Ok(body) => RpcResponse::ok_json(body),
            Err(e) => {
                tracing::error!("Handler {} failed: {}", entry.name, e);
                RpcResponse::server_error(format!("server error: {e}"))
            }
        }
    }
}
