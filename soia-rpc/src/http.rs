//! Hyper HTTP/1.1 binding for [`Service`].
//!
//! The service itself is framework-agnostic; this module is the bundled
//! way to put it on a socket. POST bodies carry the request frame; GET
//! requests carry it in the query string with `%25` standing for `%`.

use crate::service::Service;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Configuration for the bundled HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".parse().unwrap(),
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

impl HttpServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Accepts connections until the shutdown signal fires.
pub async fn serve(
    service: Arc<Service>,
    config: HttpServerConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("soia service listening on http://{}", config.bind_addr);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let service = service.clone();
                        let max_body_bytes = config.max_body_bytes;
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let handler = service_fn(move |req| {
                                let service = service.clone();
                                async move { handle_http(req, service, max_body_bytes).await }
                            });
                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, handler)
                                .await
                            {
                                tracing::debug!("Connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Service shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_http(
    req: Request<Incoming>,
    service: Arc<Service>,
    max_body_bytes: usize,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let body = match req.method().as_str() {
        "GET" => req.uri().query().unwrap_or("").replace("%25", "%"),
        "POST" => {
            let bytes = req.into_body().collect().await?.to_bytes();
            if bytes.len() > max_body_bytes {
                return Ok(text_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "request body too large",
                ));
            }
            match String::from_utf8(bytes.to_vec()) {
                Ok(body) => body,
                Err(_) => {
                    return Ok(text_response(
                        StatusCode::BAD_REQUEST,
                        "request body is not UTF-8",
                    ))
                }
            }
        }
        _ => {
            return Ok(text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "only GET and POST are supported",
            ))
        }
    };

    let response = service.handle_request(&body).await;
    Ok(Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("Content-Type", response.content_type)
        .body(Full::new(Bytes::from(response.body)))
        .unwrap())
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message)))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpServerConfig::default();
        assert_eq!(config.max_body_bytes, 4 * 1024 * 1024);
        assert_eq!(config.bind_addr.port(), 8787);
    }

    #[test]
    fn test_config_builders() {
        let config = HttpServerConfig::new("0.0.0.0:9000".parse().unwrap())
            .with_max_body_bytes(1024);
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.max_body_bytes, 1024);
    }
}
