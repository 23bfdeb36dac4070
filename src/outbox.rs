//! Content-addressed outbox queue.
//!
//! Each composed message becomes one file named after the digest of its
//! exact bytes. Exclusive creation makes the queue idempotent per content
//! and race-safe across concurrent invocations sharing the directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::TootError;

const OUTBOX_EXTENSION: &str = "json";

/// A message durably queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutboxEntry {
    pub(crate) path: PathBuf,
}

/// Filename for the given message bytes.
pub(crate) fn entry_name(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!(
        "{}.{OUTBOX_EXTENSION}",
        Base64UrlUnpadded::encode_string(&digest)
    )
}

/// Queue `bytes` as a new file under `outbox_dir`.
///
/// Byte-identical content already present fails with `DuplicateMessage`
/// and leaves the existing entry untouched. Any other failure cleans up
/// the partial file so the queue never holds an inconsistent entry.
pub(crate) fn enqueue(bytes: &[u8], outbox_dir: &Path) -> Result<OutboxEntry, TootError> {
    let name = entry_name(bytes);
    let path = outbox_dir.join(&name);

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(TootError::DuplicateMessage(name));
        }
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = file.write_all(bytes).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(err.into());
    }

    debug!(target: "outbox", %name, "queued message");
    Ok(OutboxEntry { path })
}
