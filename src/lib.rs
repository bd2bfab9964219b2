//! Clip merge and range-streaming service.
//!
//! Takes an ordered list of trimmed clips, concatenates them with a
//! scale/pad/concat ffmpeg pass, removes the trimmed spans with a
//! timestamp-exclusion trim pass, and serves the result over single-range
//! partial-content HTTP for in-browser scrubbing.

pub mod config;
pub mod error;
pub mod filtergraph;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod stream;
pub mod timeline;
