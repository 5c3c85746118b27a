use crate::base::neterror::NetError;
use crate::filter::filterstream::{FilterFactory, FilterStream};
use crate::filter::sourcetype::{AcceptedEncodings, SourceType};
use crate::http::responseheaders::HttpResponseHeaders;
use bytes::{Bytes, BytesMut};

/// Ordered decoding pipeline for one response body.
///
/// Layers are stored in application order: the last `Content-Encoding`
/// token is undone first. An empty chain passes bytes through.
#[derive(Default)]
pub struct DecodeChain {
    filters: Vec<Box<dyn FilterStream>>,
}

impl DecodeChain {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Content codings to undo, in header order.
    ///
    /// Returns an empty list as soon as an identity, unknown or
    /// non-accepted coding is seen: such a body is delivered raw.
    pub fn parse_types(headers: &HttpResponseHeaders, accepted: AcceptedEncodings) -> Vec<SourceType> {
        let mut types = Vec::new();
        for token in headers.enumerate_header_values("content-encoding") {
            let source_type = SourceType::parse_encoding(&token);
            match source_type {
                SourceType::Gzip | SourceType::Deflate | SourceType::Brotli => {
                    if !accepted.contains_source(source_type) {
                        tracing::debug!(encoding = %source_type, "encoding not accepted, passing body through");
                        return Vec::new();
                    }
                    types.push(source_type);
                }
                SourceType::None => return Vec::new(),
                SourceType::Unknown => {
                    tracing::debug!(encoding = %token, "unknown content encoding, passing body through");
                    return Vec::new();
                }
            }
        }
        types
    }

    /// Builds the chain for `headers`. Any layer the factory cannot
    /// construct fails the whole chain.
    pub fn build(
        headers: &HttpResponseHeaders,
        accepted: AcceptedEncodings,
        factory: &dyn FilterFactory,
    ) -> Result<Self, NetError> {
        let types = Self::parse_types(headers, accepted);
        let mut filters = Vec::with_capacity(types.len());
        for source_type in types.into_iter().rev() {
            match factory.create_filter(source_type) {
                Some(filter) => filters.push(filter),
                None => {
                    tracing::warn!(encoding = %source_type, "failed to create content decoder");
                    return Err(NetError::ContentDecodingInitFailed);
                }
            }
        }
        Ok(Self { filters })
    }

    pub fn is_identity(&self) -> bool {
        self.filters.is_empty()
    }

    /// Layer types in application order.
    pub fn source_types(&self) -> Vec<SourceType> {
        self.filters.iter().map(|f| f.source_type()).collect()
    }

    pub fn filter(&mut self, input: &[u8]) -> Result<Bytes, NetError> {
        let mut carry = Bytes::copy_from_slice(input);
        for filter in &mut self.filters {
            if carry.is_empty() {
                break;
            }
            carry = filter.filter(&carry)?;
        }
        Ok(carry)
    }

    /// Flushes every layer at end of body; each layer's tail feeds the next.
    pub fn finish(&mut self) -> Result<Bytes, NetError> {
        let mut carry = Bytes::new();
        for filter in &mut self.filters {
            let mut out = BytesMut::new();
            if !carry.is_empty() {
                out.extend_from_slice(&filter.filter(&carry)?);
            }
            out.extend_from_slice(&filter.finish()?);
            carry = out.freeze();
        }
        Ok(carry)
    }
}

impl std::fmt::Debug for DecodeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeChain")
            .field("types", &self.source_types())
            .finish()
    }
}
