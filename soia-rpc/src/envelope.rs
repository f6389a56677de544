//! Request body framing: `name:number:format:payload`.

use crate::error::RpcError;
use soia::JsonFlavor;

/// A parsed request body. The payload is JSON in the indicated flavor; the
/// response is produced in the same flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFrame<'a> {
    pub method_name: &'a str,
    pub method_number: i32,
    pub flavor: JsonFlavor,
    pub payload: &'a str,
}

impl<'a> RequestFrame<'a> {
    pub fn parse(body: &'a str) -> Result<Self, RpcError> {
        let mut parts = body.splitn(4, ':');
        let method_name = parts
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RpcError::BadRequest("missing method name".to_owned()))?;
        let number_part = parts
            .next()
            .ok_or_else(|| RpcError::BadRequest("missing method number".to_owned()))?;
        let method_number = number_part
            .parse::<i32>()
            .map_err(|_| RpcError::BadRequest(format!("invalid method number: {number_part:?}")))?;
        let flavor = match parts.next() {
            Some("") => JsonFlavor::Dense,
            Some("readable") => JsonFlavor::Readable,
            Some(other) => {
                return Err(RpcError::BadRequest(format!("invalid format: {other:?}")))
            }
            None => return Err(RpcError::BadRequest("missing format".to_owned())),
        };
        let payload = parts
            .next()
            .ok_or_else(|| RpcError::BadRequest("missing request payload".to_owned()))?;
        Ok(Self {
            method_name,
            method_number,
            flavor,
            payload,
        })
    }

    /// Formats a request body for the wire.
    pub fn format(name: &str, number: i32, flavor: JsonFlavor, payload: &str) -> String {
        let format = match flavor {
            JsonFlavor::Dense => "",
            JsonFlavor::Readable => "readable",
        };
        format!("{name}:{number}:{format}:{payload}")
    }
}
