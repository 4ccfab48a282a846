use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub results_url: String,
    pub runtime_token: String,
    /// Largest chunk body accepted by a single PATCH, in bytes.
    pub max_chunk_size: usize,
    /// File the cache URL is exported to once the server is listening.
    pub github_env: Option<PathBuf>,
}
