use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Written to stdout once the listener is bound, for whoever launched the shim.
#[derive(Serialize, Debug)]
pub struct ReadyMessage {
    pub kind: &'static str,
    pub address: String,
}

impl ReadyMessage {
    pub fn new(addr: SocketAddr) -> Self {
        ReadyMessage {
            kind: "ready",
            address: format!("http://{addr}"),
        }
    }

    /// The value clients expect in `ACTIONS_CACHE_URL`, which must end in `/`.
    pub fn cache_url(&self) -> String {
        format!("{}/", self.address)
    }
}

/// Appends `ACTIONS_CACHE_URL=<url>` to a `GITHUB_ENV` style file.
pub async fn export_cache_url(env_file: &Path, cache_url: &str) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_file)
        .await?;
    file.write_all(format!("ACTIONS_CACHE_URL={cache_url}\n").as_bytes())
        .await?;
    file.flush().await
}
