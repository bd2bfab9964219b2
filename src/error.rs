//! Error taxonomy for the merge pipeline and the range streamer, plus the
//! mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use std::process::ExitStatus;

/// Failures raised while building or running the two-pass transcode.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid clip {clip_id}: {reason}")]
    InvalidClip { clip_id: String, reason: String },

    #[error("{stage} pass failed to start: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} pass exited abnormally ({status}): {stderr_tail}")]
    Process {
        stage: &'static str,
        status: ExitStatus,
        stderr_tail: String,
    },

    #[error("{stage} pass exceeded the {limit_secs}s transcode timeout")]
    Timeout { stage: &'static str, limit_secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures raised while answering a range request.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Range header required")]
    RangeRequired,

    #[error("Range header carries no start offset")]
    UnparsableRange,

    #[error("range start {start} is past the end of the {size}-byte file")]
    Unsatisfiable { start: u64, size: u64 },

    #[error("video not found: {path}")]
    NotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    fn status(&self) -> StatusCode {
        match self {
            PipelineError::InvalidClip { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StreamError {
    fn status(&self) -> StatusCode {
        match self {
            StreamError::RangeRequired | StreamError::UnparsableRange => StatusCode::BAD_REQUEST,
            StreamError::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::NotFound { .. } => StatusCode::NOT_FOUND,
            StreamError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "merge request failed");
        }
        (status, self.to_string()).into_response()
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "video request failed");
        }
        (status, self.to_string()).into_response()
    }
}
