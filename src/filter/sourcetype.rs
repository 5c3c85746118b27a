use bitflags::bitflags;
use std::fmt;

/// Content coding of a response body layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// `identity` or an empty token.
    None,
    Gzip,
    Deflate,
    Brotli,
    Unknown,
}

impl SourceType {
    /// Maps one `Content-Encoding` token to a source type.
    pub fn parse_encoding(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("identity") {
            SourceType::None
        } else if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            SourceType::Gzip
        } else if token.eq_ignore_ascii_case("deflate") {
            SourceType::Deflate
        } else if token.eq_ignore_ascii_case("br") {
            SourceType::Brotli
        } else {
            SourceType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::None => "identity",
            SourceType::Gzip => "gzip",
            SourceType::Deflate => "deflate",
            SourceType::Brotli => "br",
            SourceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Content codings a request is willing to have decoded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AcceptedEncodings: u8 {
        const GZIP = 1 << 0;
        const DEFLATE = 1 << 1;
        const BROTLI = 1 << 2;
    }
}

impl Default for AcceptedEncodings {
    fn default() -> Self {
        AcceptedEncodings::all()
    }
}

impl AcceptedEncodings {
    /// Whether decoding `source` is permitted. `None` and `Unknown` are
    /// never "accepted" since they have no decoder.
    pub fn contains_source(self, source: SourceType) -> bool {
        match source {
            SourceType::Gzip => self.contains(AcceptedEncodings::GZIP),
            SourceType::Deflate => self.contains(AcceptedEncodings::DEFLATE),
            SourceType::Brotli => self.contains(AcceptedEncodings::BROTLI),
            SourceType::None | SourceType::Unknown => false,
        }
    }
}
