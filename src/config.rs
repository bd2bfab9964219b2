use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration. The storage root is passed in explicitly rather
/// than read from the process environment at call time.
#[derive(Parser, Debug, Clone)]
#[command(name = "clipstitch", version, about = "Clip merge and range-streaming service")]
pub struct Config {
    /// Root directory holding one media directory per owner.
    #[arg(long, default_value = "./storage")]
    pub storage_root: PathBuf,

    /// Address the HTTP server listens on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// ffmpeg binary to invoke for the transcode passes.
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// Upper bound, in seconds, on each transcode pass before the process is
    /// killed and the merge fails.
    #[arg(long, default_value_t = 300)]
    pub transcode_timeout_secs: u64,
}
