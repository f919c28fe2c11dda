use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// How a cached library was verified when it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Matched a declared `sha1`.
    Jar,
    /// Matched a `checksums[]` list; re-validated the same way on lookup.
    Forge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryIndexEntry {
    pub name: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
}

/// `cache/index.json`: `{"libraries": [{"name", "hash", "type"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    #[serde(default)]
    pub libraries: Vec<LibraryIndexEntry>,
}

impl CacheIndex {
    /// Read the index; a missing or unreadable file starts an empty one.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Unable to read cache index {:?}: {}", path, e);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(index) => index,
            Err(e) => {
                warn!("Unable to parse cache index {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write through a temp file and rename so readers never see a torn index.
    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| LauncherError::Other(format!("Index path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;

        let tmp = parent.join(format!(".index-{}.tmp", uuid::Uuid::new_v4()));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, json).map_err(|e| LauncherError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            LauncherError::io(path, e)
        })
    }

    /// Entries recorded under `name`, oldest first.
    pub fn entries_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LibraryIndexEntry> + 'a {
        self.libraries.iter().filter(move |entry| entry.name == name)
    }

    /// Append unless the same `(name, hash)` is already recorded.
    pub fn record(&mut self, entry: LibraryIndexEntry) -> bool {
        let exists = self
            .libraries
            .iter()
            .any(|e| e.name == entry.name && e.hash.eq_ignore_ascii_case(&entry.hash));
        if exists {
            return false;
        }
        self.libraries.push(entry);
        true
    }
}
