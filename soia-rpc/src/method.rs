//! Method identification.

use soia::Serializer;

/// The wire-level contract of one remote procedure. The number is assigned
/// by the schema compiler (hash-derived from the name when not written out
/// in the schema) and is what requests are dispatched on.
pub struct Method<Req, Resp> {
    pub name: &'static str,
    pub number: i32,
    pub request_serializer: Serializer<Req>,
    pub response_serializer: Serializer<Resp>,
}

impl<Req, Resp> Method<Req, Resp> {
    pub fn new(
        name: &'static str,
        number: i32,
        request_serializer: Serializer<Req>,
        response_serializer: Serializer<Resp>,
    ) -> Self {
        Self {
            name,
            number,
            request_serializer,
            response_serializer,
        }
    }
}

impl<Req, Resp> Clone for Method<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            number: self.number,
            request_serializer: self.request_serializer.clone(),
            response_serializer: self.response_serializer.clone(),
        }
    }
}
