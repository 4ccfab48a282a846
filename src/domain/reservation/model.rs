use super::blocks::{BlockList, SealError, Sealed, StagedBlock};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;

/// Handle for an upload in progress, as seen by legacy API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheId(pub u64);

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An upload accepted by the cache service and not yet committed.
#[derive(Debug)]
pub struct Reservation {
    pub key: String,
    /// The version as sent by the client, before namespacing.
    pub version: String,
    pub upload_url: String,
    blocks: Mutex<BlockList>,
}

impl Reservation {
    pub fn new(
        key: impl Into<String>,
        version: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        Reservation {
            key: key.into(),
            version: version.into(),
            upload_url: upload_url.into(),
            blocks: Mutex::new(BlockList::default()),
        }
    }

    /// Records a staged block, unless a commit has sealed the reservation.
    pub async fn append_block(&self, block: StagedBlock) -> Result<(), Sealed> {
        self.blocks.lock().await.append(block)
    }

    pub async fn is_sealed(&self) -> bool {
        self.blocks.lock().await.is_sealed()
    }

    pub async fn block_count(&self) -> usize {
        self.blocks.lock().await.len()
    }

    pub async fn staged_size(&self) -> u64 {
        self.blocks.lock().await.total_size()
    }

    /// Orders the staged blocks for commit and stops further appends until
    /// [`Reservation::unseal`] is called.
    pub async fn seal(&self, declared_size: u64) -> Result<Vec<String>, SealError> {
        self.blocks.lock().await.seal(declared_size)
    }

    pub async fn unseal(&self) {
        self.blocks.lock().await.unseal();
    }
}
