use sha2::{Digest, Sha256};

/// Fixed prefix mixed into every namespaced version. Changing it orphans every
/// entry previously written through the shim.
const VERSION_NAMESPACE: &str = "actions-cache-shim/artifactcache-v1";

/// Maps a client supplied cache version onto the version sent to the cache
/// service, so entries written through the legacy API never collide with
/// entries written natively under the same key and version.
///
/// Only versions travelling to the backend go through this; reservations keep
/// the client's original value.
pub fn namespaced_version(version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(VERSION_NAMESPACE.as_bytes());
    hasher.update([0u8]);
    hasher.update(version.as_bytes());
    hex::encode(hasher.finalize())
}
