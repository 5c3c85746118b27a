use crate::base::neterror::NetError;
use crate::filter::filterstream::{decoding_failed, FilterStream};
use crate::filter::sourcetype::SourceType;
use brotli::DecompressorWriter;
use bytes::Bytes;
use std::io::Write;

const BUFFER_SIZE: usize = 4096;

pub struct BrotliFilter {
    // Taken on finish.
    decoder: Option<DecompressorWriter<Vec<u8>>>,
}

impl BrotliFilter {
    pub fn new() -> Self {
        Self {
            decoder: Some(DecompressorWriter::new(Vec::new(), BUFFER_SIZE)),
        }
    }
}

impl Default for BrotliFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStream for BrotliFilter {
    fn source_type(&self) -> SourceType {
        SourceType::Brotli
    }

    fn filter(&mut self, input: &[u8]) -> Result<Bytes, NetError> {
        let decoder = self.decoder.as_mut().ok_or(NetError::ContentDecodingFailed)?;
        decoder.write_all(input).map_err(decoding_failed)?;
        decoder.flush().map_err(decoding_failed)?;
        Ok(Bytes::from(std::mem::take(decoder.get_mut())))
    }

    fn finish(&mut self) -> Result<Bytes, NetError> {
        let Some(decoder) = self.decoder.take() else {
            return Ok(Bytes::new());
        };
        match decoder.into_inner() {
            Ok(rest) => Ok(Bytes::from(rest)),
            Err(_) => {
                tracing::debug!("brotli stream truncated");
                Err(NetError::ContentDecodingFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut w = brotli::CompressorWriter::new(Vec::new(), 4096, 5, 22);
        w.write_all(data).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_brotli_roundtrip_in_chunks() {
        let body = b"brotli brotli brotli body".repeat(50);
        let data = compress(&body);
        let mut filter = BrotliFilter::new();
        let mut out = Vec::new();
        for piece in data.chunks(7) {
            out.extend_from_slice(&filter.filter(piece).unwrap());
        }
        out.extend_from_slice(&filter.finish().unwrap());
        assert_eq!(out, body);
    }

    #[test]
    fn test_brotli_truncated_stream_fails() {
        let data = compress(&b"some data that will be truncated".repeat(10));
        let mut filter = BrotliFilter::new();
        filter.filter(&data[..data.len() / 2]).unwrap();
        assert_eq!(filter.finish(), Err(NetError::ContentDecodingFailed));
    }
}
