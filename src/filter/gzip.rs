//! gzip and deflate layers on top of `flate2`'s write-side decoders.

use crate::base::neterror::NetError;
use crate::filter::filterstream::{decoding_failed, FilterStream};
use crate::filter::sourcetype::SourceType;
use bytes::Bytes;
use flate2::write::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::io::Write;

/// Feeds `input` to `decoder` and flushes its buffered output into the
/// inner `Vec`. Bytes after the end of the compressed stream are dropped.
fn feed<W: Write>(decoder: &mut W, input: &[u8]) -> Result<(), NetError> {
    let mut rest = input;
    while !rest.is_empty() {
        let n = decoder.write(rest).map_err(decoding_failed)?;
        if n == 0 {
            break;
        }
        rest = &rest[n..];
    }
    decoder.flush().map_err(decoding_failed)
}

pub struct GzipFilter {
    decoder: GzDecoder<Vec<u8>>,
}

impl GzipFilter {
    pub fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
        }
    }
}

impl Default for GzipFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStream for GzipFilter {
    fn source_type(&self) -> SourceType {
        SourceType::Gzip
    }

    fn filter(&mut self, input: &[u8]) -> Result<Bytes, NetError> {
        feed(&mut self.decoder, input)?;
        Ok(Bytes::from(std::mem::take(self.decoder.get_mut())))
    }

    fn finish(&mut self) -> Result<Bytes, NetError> {
        self.decoder.try_finish().map_err(decoding_failed)?;
        Ok(Bytes::from(std::mem::take(self.decoder.get_mut())))
    }
}

enum DeflateState {
    /// Fewer than two bytes seen; the header decides zlib vs raw.
    Sniffing(Vec<u8>),
    Zlib(ZlibDecoder<Vec<u8>>),
    Raw(DeflateDecoder<Vec<u8>>),
}

/// `deflate` is meant to be zlib-wrapped, but many servers send raw
/// deflate. The first two bytes decide.
pub struct DeflateFilter {
    state: DeflateState,
}

impl DeflateFilter {
    pub fn new() -> Self {
        Self {
            state: DeflateState::Sniffing(Vec::with_capacity(2)),
        }
    }

    fn looks_like_zlib(header: &[u8]) -> bool {
        match header {
            [cmf, flg, ..] => {
                let method_ok = cmf & 0x0f == 8 && cmf >> 4 <= 7;
                let check = (u16::from(*cmf) << 8) | u16::from(*flg);
                method_ok && check % 31 == 0
            }
            _ => false,
        }
    }

    fn select(&mut self, header: Vec<u8>) -> Result<(), NetError> {
        if Self::looks_like_zlib(&header) {
            let mut decoder = ZlibDecoder::new(Vec::new());
            feed(&mut decoder, &header)?;
            self.state = DeflateState::Zlib(decoder);
        } else {
            tracing::trace!("deflate body without zlib header, decoding raw");
            let mut decoder = DeflateDecoder::new(Vec::new());
            feed(&mut decoder, &header)?;
            self.state = DeflateState::Raw(decoder);
        }
        Ok(())
    }

    fn drain(&mut self) -> Bytes {
        match &mut self.state {
            DeflateState::Sniffing(_) => Bytes::new(),
            DeflateState::Zlib(d) => Bytes::from(std::mem::take(d.get_mut())),
            DeflateState::Raw(d) => Bytes::from(std::mem::take(d.get_mut())),
        }
    }
}

impl Default for DeflateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStream for DeflateFilter {
    fn source_type(&self) -> SourceType {
        SourceType::Deflate
    }

    fn filter(&mut self, input: &[u8]) -> Result<Bytes, NetError> {
        let mut input = input;
        if let DeflateState::Sniffing(buffered) = &mut self.state {
            let needed = 2usize.saturating_sub(buffered.len()).min(input.len());
            buffered.extend_from_slice(&input[..needed]);
            input = &input[needed..];
            if buffered.len() < 2 {
                return Ok(Bytes::new());
            }
            let header = std::mem::take(buffered);
            self.select(header)?;
        }

        match &mut self.state {
            DeflateState::Sniffing(_) => {}
            DeflateState::Zlib(d) => feed(d, input)?,
            DeflateState::Raw(d) => feed(d, input)?,
        }
        Ok(self.drain())
    }

    fn finish(&mut self) -> Result<Bytes, NetError> {
        if let DeflateState::Sniffing(buffered) = &mut self.state {
            if buffered.is_empty() {
                return Ok(Bytes::new());
            }
            let header = std::mem::take(buffered);
            self.select(header)?;
        }

        match &mut self.state {
            DeflateState::Sniffing(_) => {}
            DeflateState::Zlib(d) => d.try_finish().map_err(decoding_failed)?,
            DeflateState::Raw(d) => d.try_finish().map_err(decoding_failed)?,
        }
        Ok(self.drain())
    }
}
