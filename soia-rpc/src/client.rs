//! Typed client for a remote soia service.

use crate::envelope::RequestFrame;
use crate::error::{BoxError, ClientError};
use crate::method::Method;
use serde_json::Value;
use soia::{DecodeMode, JsonFlavor};
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing HTTP request. GET requests carry the framed body in the
/// query string; POST requests carry it in the body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The host HTTP stack, kept pluggable: implement this for whatever client
/// the application already uses.
pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, BoxError>> + Send + '_>>;
}

type HeaderProvider = Box<dyn Fn(&mut Vec<(String, String)>) + Send + Sync>;

/// Invokes methods on a remote service over an [`HttpTransport`].
pub struct ServiceClient<T> {
    transport: T,
    url: String,
    request_headers: Option<HeaderProvider>,
}

impl<T: HttpTransport> ServiceClient<T> {
    /// Creates a client for the service at `url`, which must be an absolute
    /// URL without a query string.
    pub fn new(transport: T, url: impl Into<String>) -> Result<Self, ClientError> {
        let url = url.into();
        if !url.contains("://") || url.contains('?') {
            return Err(ClientError::InvalidUrl(url));
        }
        Ok(Self {
            transport,
            url,
            request_headers: None,
        })
    }

    /// Installs a callback that may add arbitrary headers to each request.
    pub fn with_request_headers(
        mut self,
        provider: impl Fn(&mut Vec<(String, String)>) + Send + Sync + 'static,
    ) -> Self {
        self.request_headers = Some(Box::new(provider));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and decodes the response. Responses come from the
    /// service the client was pointed at, so unrecognized fields are
    /// preserved.
    pub async fn invoke_remote<Req, Resp>(
        &self,
        method: &Method<Req, Resp>,
        request: &Req,
        http_method: HttpMethod,
    ) -> Result<Resp, ClientError> {
        let payload = method
            .request_serializer
            .to_json_code(request, JsonFlavor::Dense);
        let body = RequestFrame::format(method.name, method.number, JsonFlavor::Dense, &payload);
        let mut headers = Vec::new();
        if let Some(provider) = &self.request_headers {
            provider(&mut headers);
        }
        let request = match http_method {
            HttpMethod::Post => HttpRequest {
                method: HttpMethod::Post,
                url: self.url.clone(),
                headers,
                body,
            },
            // The body moves into the query string, with % doubled so the
            // frame survives URL decoding.
            HttpMethod::Get => HttpRequest {
                method: HttpMethod::Get,
                url: format!("{}?{}", self.url, body.replace('%', "%25")),
                headers,
                body: String::new(),
            },
        };
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ClientError::Transport)?;
        if response.status != 200 {
            return Err(ClientError::Server {
                status: response.status,
                message: response.body,
            });
        }
        let json: Value = serde_json::from_str(&response.body)?;
        Ok(method
            .response_serializer
            .from_json_with(&json, DecodeMode::KeepUnrecognized)?)
    }
}
