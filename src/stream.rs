//! Single-range partial-content serving of a generated output file.
//!
//! One chunk per request: the client scrubs by issuing successive `Range`
//! requests and we answer each with at most [`CHUNK_SIZE`] bytes. Only the
//! first start offset in the header is honored; an explicit end offset, or
//! any additional ranges, are ignored.

use crate::error::StreamError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Largest span returned for one range request, in bytes.
pub const CHUNK_SIZE: u64 = 1_000_000;

/// The byte span `[start, end]` (inclusive) served out of a `file_size`-byte
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpan {
    pub start: u64,
    pub end: u64,
    pub file_size: u64,
}

impl RangeSpan {
    /// Clamp a requested start offset to one chunk's worth of file.
    pub fn compute(start: u64, file_size: u64) -> Result<Self, StreamError> {
        if start >= file_size {
            return Err(StreamError::Unsatisfiable { start, size: file_size });
        }
        let end = (start + CHUNK_SIZE - 1).min(file_size - 1);
        Ok(Self { start, end, file_size })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// A 206 response carrying one chunk of the file.
#[derive(Debug)]
pub struct PartialContent {
    pub span: RangeSpan,
    pub body: Bytes,
}

impl IntoResponse for PartialContent {
    fn into_response(self) -> Response {
        (
            StatusCode::PARTIAL_CONTENT,
            [
                (
                    header::CONTENT_RANGE,
                    format!(
                        "bytes {}-{}/{}",
                        self.span.start, self.span.end, self.span.file_size
                    ),
                ),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CONTENT_LENGTH, self.span.len().to_string()),
                (header::CONTENT_TYPE, "video/mp4".to_string()),
            ],
            self.body,
        )
            .into_response()
    }
}

/// First contiguous digit run in the `Range` header value.
pub fn parse_range_start(header: &str) -> Option<u64> {
    let digits: String = header
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Serve one chunk of `path` for the given `Range` header.
///
/// A missing header is a client error and is rejected before any filesystem
/// access.
pub async fn serve(path: &Path, range_header: Option<&str>) -> Result<PartialContent, StreamError> {
    let header = range_header.ok_or(StreamError::RangeRequired)?;
    let start = parse_range_start(header).ok_or(StreamError::UnparsableRange)?;

    let metadata = tokio::fs::metadata(path).await.map_err(|e| not_found(e, path))?;
    let span = RangeSpan::compute(start, metadata.len())?;

    let mut file = tokio::fs::File::open(path).await.map_err(|e| not_found(e, path))?;
    file.seek(SeekFrom::Start(span.start)).await?;
    let mut buf = vec![0u8; span.len() as usize];
    file.read_exact(&mut buf).await?;

    tracing::debug!(
        path = %path.display(),
        start = span.start,
        end = span.end,
        "serving range"
    );

    Ok(PartialContent { span, body: Bytes::from(buf) })
}

fn not_found(err: std::io::Error, path: &Path) -> StreamError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StreamError::NotFound { path: path.to_path_buf() }
    } else {
        StreamError::Io(err)
    }
}
