//! Upload body attached to a request.

use bytes::Bytes;

/// Request body for methods that send data.
///
/// The job only hands the stream to the transaction; a chunked stream has
/// no known size up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadDataStream {
    #[default]
    Empty,
    Bytes(Bytes),
    Chunked(Vec<Bytes>),
}

impl From<String> for UploadDataStream {
    fn from(s: String) -> Self {
        UploadDataStream::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for UploadDataStream {
    fn from(v: Vec<u8>) -> Self {
        UploadDataStream::Bytes(Bytes::from(v))
    }
}

impl From<&str> for UploadDataStream {
    fn from(s: &str) -> Self {
        UploadDataStream::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for UploadDataStream {
    fn from(b: Bytes) -> Self {
        UploadDataStream::Bytes(b)
    }
}

impl UploadDataStream {
    pub fn is_empty(&self) -> bool {
        match self {
            UploadDataStream::Empty => true,
            UploadDataStream::Bytes(b) => b.is_empty(),
            UploadDataStream::Chunked(chunks) => chunks.iter().all(Bytes::is_empty),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, UploadDataStream::Chunked(_))
    }

    /// Declared size; `None` for chunked uploads.
    pub fn size(&self) -> Option<u64> {
        match self {
            UploadDataStream::Empty => Some(0),
            UploadDataStream::Bytes(b) => Some(b.len() as u64),
            UploadDataStream::Chunked(_) => None,
        }
    }
}
