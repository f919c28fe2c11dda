use std::path::{Path, PathBuf};

use crate::core::version::Library;

/// Layout of a shared game directory:
/// - `<root>/versions/<id>/<id>.json` + `<id>.jar`
/// - `<root>/libraries/<maven path>`
/// - `<root>/assets/{indexes,objects,log_configs}`
/// - `<root>/cache/` (content-addressed store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDirectory {
    root: PathBuf,
}

impl GameDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    pub fn version_json(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.json", id))
    }

    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.jar", id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Location of a library under `libraries/`, using its resolved download path.
    pub fn library_file(&self, library: &Library, default_repository: &str) -> PathBuf {
        self.library_path(&library.download(default_repository).path)
    }

    pub fn library_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.libraries_dir(), |path, segment| path.join(segment))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index_file(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", index_id))
    }

    /// `assets/objects/<2-char prefix>/<hash>`
    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let prefix = hash.get(..2).unwrap_or(hash);
        self.assets_dir().join("objects").join(prefix).join(hash)
    }

    pub fn logging_config(&self, file_id: &str) -> PathBuf {
        self.assets_dir().join("log_configs").join(file_id)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }
}
