//! authorized_keys rewriter.
//!
//! Renders the `ssh_key` field of every entity into an authorized_keys
//! file, one key per line, and replaces the file atomically on each
//! delivery so a concurrent sshd never reads a half-written credentials
//! file.

use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::constants::SSH_KEY_FIELD;
use crate::utils::file_io::atomic_replace;
use crate::utils::file_io::ensure_private_dir;
use crate::EntityMap;
use crate::Result;

pub struct AuthorizedKeysWriter {
    path: PathBuf,
}

impl AuthorizedKeysWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newline-joined `ssh_key` values, sorted by entity key so repeated
    /// deliveries of the same state produce byte-identical files. Entities
    /// without an `ssh_key` string are skipped.
    pub fn render(entities: &EntityMap) -> String {
        let mut keyed: Vec<(&str, &str)> = entities
            .iter()
            .filter_map(|(entity, fields)| {
                fields
                    .get(SSH_KEY_FIELD)
                    .and_then(|value| value.as_str())
                    .map(|key| (entity.as_str(), key))
            })
            .collect();
        keyed.sort_unstable_by_key(|(entity, _)| *entity);

        let mut out = keyed
            .iter()
            .map(|(_, key)| *key)
            .collect::<Vec<_>>()
            .join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Rewrite the authorized_keys file from a delivered snapshot.
    ///
    /// The containing directory is created owner-only (0700) if missing;
    /// the file lands with mode 0600 via temp-file-and-rename. Every error
    /// path leaves the previous file untouched.
    pub fn apply(
        &self,
        entities: &EntityMap,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_private_dir(parent)?;
        }
        let content = Self::render(entities);
        atomic_replace(&self.path, content.as_bytes(), 0o600)?;
        info!(
            path = %self.path.display(),
            entities = entities.len(),
            "authorized_keys rewritten"
        );
        Ok(())
    }
}
