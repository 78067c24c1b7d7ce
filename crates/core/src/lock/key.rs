//! Lock file naming.

use sha2::{Digest, Sha256};

const MAX_PLAIN_KEY_LEN: usize = 64;

/// File name of the lock for `key`.
///
/// Keys made of `[A-Za-z0-9_-]` (at most 64 bytes) keep their name so lock
/// files are easy to spot; anything else is replaced by its SHA-256 digest.
pub fn lock_file_name(key: &str) -> String {
    let plain = !key.is_empty()
        && key.len() <= MAX_PLAIN_KEY_LEN
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if plain {
        format!("nrfeed_{key}.lock")
    } else {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("nrfeed_{}.lock", hex::encode(hasher.finalize()))
    }
}
