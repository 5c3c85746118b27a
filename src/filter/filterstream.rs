use crate::base::neterror::NetError;
use crate::filter::gzip::{DeflateFilter, GzipFilter};
use crate::filter::sourcetype::SourceType;
use bytes::Bytes;

/// One decoding layer of a response body.
///
/// Input arrives in arbitrary slices; output is whatever became available.
/// `finish` flushes the layer at end of input.
pub trait FilterStream: Send {
    fn source_type(&self) -> SourceType;

    fn filter(&mut self, input: &[u8]) -> Result<Bytes, NetError>;

    fn finish(&mut self) -> Result<Bytes, NetError>;
}

/// Builds decoding layers. Returning `None` means the layer cannot be
/// constructed, which fails the whole chain.
pub trait FilterFactory: Send + Sync {
    fn create_filter(&self, source_type: SourceType) -> Option<Box<dyn FilterStream>>;
}

/// `flate2` for gzip/deflate and, with the `brotli` feature, `brotli`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilterFactory;

impl FilterFactory for DefaultFilterFactory {
    fn create_filter(&self, source_type: SourceType) -> Option<Box<dyn FilterStream>> {
        match source_type {
            SourceType::Gzip => Some(Box::new(GzipFilter::new())),
            SourceType::Deflate => Some(Box::new(DeflateFilter::new())),
            #[cfg(feature = "brotli")]
            SourceType::Brotli => Some(Box::new(crate::filter::brotli::BrotliFilter::new())),
            #[cfg(not(feature = "brotli"))]
            SourceType::Brotli => None,
            SourceType::None | SourceType::Unknown => None,
        }
    }
}

pub(crate) fn decoding_failed(err: std::io::Error) -> NetError {
    tracing::debug!(error = %err, "content decoding failed");
    NetError::ContentDecodingFailed
}
