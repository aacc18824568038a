use std::path::PathBuf;

use clap::Parser;

/// Serves files from a directory over HTTP/1.1, one connection at a time.
#[derive(Parser, Debug)]
#[command(version)]
pub struct ServerArgs {
    /// Port to listen on.
    #[clap(long, short, default_value_t = 8080)]
    pub port: u16,

    /// File served when the request path names a directory.
    #[clap(long, short, default_value = "index.html")]
    pub index: String,

    /// Directory beneath which all served files are resolved.
    pub doc_root: PathBuf,

    #[clap(long, default_value = "warn")]
    pub log_level: super::logging::Level,

    #[clap(long)]
    pub log_file: Option<PathBuf>,
}

/// Fetches a URL with a single HTTP/1.1 GET request.
#[derive(Parser, Debug)]
#[command(version)]
pub struct ClientArgs {
    /// Port to connect to.
    #[clap(long, short, default_value_t = 80)]
    pub port: u16,

    /// Write the response body to this file.
    #[clap(long, short, conflicts_with = "dir")]
    pub output: Option<PathBuf>,

    /// Write the response body to a file in this directory, named after
    /// the last segment of the URL path.
    #[clap(long, short, conflicts_with = "output")]
    pub dir: Option<PathBuf>,

    /// URL to request. Must start with "http://".
    pub url: String,

    #[clap(long, default_value = "warn")]
    pub log_level: super::logging::Level,

    #[clap(long)]
    pub log_file: Option<PathBuf>,
}
