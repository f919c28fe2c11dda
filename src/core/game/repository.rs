// ─── Game Repository ───
// Reads version descriptors from `versions/` and memoizes raw and resolved forms.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{
    resolve, ResolveOptions, ResolvedVersion, VersionDescriptor, VersionProvider,
};

use super::GameDirectory;

pub struct GameRepository {
    directory: GameDirectory,
    options: ResolveOptions,
    raw: RwLock<HashMap<String, Arc<VersionDescriptor>>>,
    resolved: RwLock<HashMap<String, Arc<ResolvedVersion>>>,
}

impl GameRepository {
    pub fn new(directory: GameDirectory, options: ResolveOptions) -> Self {
        Self {
            directory,
            options,
            raw: RwLock::new(HashMap::new()),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &GameDirectory {
        &self.directory
    }

    pub fn has_version(&self, id: &str) -> bool {
        self.directory.version_json(id).is_file()
    }

    /// Ids of every `versions/<id>/<id>.json` on disk, sorted.
    pub fn version_ids(&self) -> LauncherResult<Vec<String>> {
        let versions_dir = self.directory.versions_dir();
        let entries = match std::fs::read_dir(&versions_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LauncherError::io(versions_dir, source)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LauncherError::io(&versions_dir, e))?;
            let id = entry.file_name().to_string_lossy().to_string();
            if self.has_version(&id) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Resolve `id` through its inheritance chain, memoized until [`refresh`](Self::refresh).
    #[instrument(skip(self))]
    pub fn resolve(&self, id: &str) -> LauncherResult<Arc<ResolvedVersion>> {
        if let Some(hit) = read_lock(&self.resolved).get(id) {
            return Ok(Arc::clone(hit));
        }

        let raw = self.get_version(id)?;
        let resolved = Arc::new(resolve(&raw, self, self.options)?);
        write_lock(&self.resolved).insert(id.to_string(), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Write a descriptor to `versions/<id>/<id>.json` and drop cached entries.
    pub fn save_version(&self, version: &VersionDescriptor) -> LauncherResult<()> {
        let dir = self.directory.version_dir(&version.id);
        std::fs::create_dir_all(&dir).map_err(|e| LauncherError::io(&dir, e))?;
        let path = self.directory.version_json(&version.id);
        let json = serde_json::to_string_pretty(version)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(&path, e))?;
        self.refresh();
        Ok(())
    }

    /// Forget every cached descriptor, raw and resolved.
    pub fn refresh(&self) {
        write_lock(&self.raw).clear();
        write_lock(&self.resolved).clear();
        info!("Version cache cleared for {:?}", self.directory.root());
    }
}

impl VersionProvider for GameRepository {
    fn get_version(&self, id: &str) -> LauncherResult<Arc<VersionDescriptor>> {
        if let Some(hit) = read_lock(&self.raw).get(id) {
            return Ok(Arc::clone(hit));
        }

        let path = self.directory.version_json(id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LauncherError::VersionNotFound(id.to_string()));
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };

        let mut version: VersionDescriptor = serde_json::from_str(&raw)?;
        if version.id != id {
            debug!("Descriptor {:?} declares id {}, using folder name", path, version.id);
            version.id = id.to_string();
        }

        let version = Arc::new(version);
        write_lock(&self.raw).insert(id.to_string(), Arc::clone(&version));
        Ok(version)
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
