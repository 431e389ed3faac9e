use sha2::{Digest, Sha256};

const CONTENT_ID_BYTES: usize = 16;

/// Derive a stable id for a catalog entry from its catalogue and entry ids.
///
/// Only source identifiers go into the digest, so names and costs can change
/// between revisions without breaking upserts.
pub fn content_id(catalogue_id: &str, entry_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(catalogue_id.as_bytes());
    hasher.update(b":");
    hasher.update(entry_id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..CONTENT_ID_BYTES])
}
