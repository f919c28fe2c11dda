// ─── Cache Repository ───
// Content-addressed store shared by every installed version:
//   <common>/cache/<algorithm>/<first 2 hex>/<hash>
// plus `cache/index.json`, recording which hashes were verified for which
// library name. Blob writes go through a temp file and a rename, so a
// concurrent writer of the same hash only ever replaces identical bytes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, instrument, warn};

use crate::core::config::DEFAULT_LIBRARIES_URL;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::Library;

use super::checksums::{checksums_valid, checksums_valid_as};
use super::digest::{digest_bytes, digest_file, CachedArtifact, HashAlgorithm};
use super::index::{CacheIndex, IndexKind, LibraryIndexEntry};

/// Outcome of asking the repository for an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Found(PathBuf),
    NotFound,
    /// A candidate existed but did not hash to what was expected.
    VerificationFailed { expected: String, actual: String },
}

impl CacheLookup {
    pub fn found(self) -> Option<PathBuf> {
        match self {
            CacheLookup::Found(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct CacheRepository {
    inner: Arc<Inner>,
}

struct Inner {
    common_dir: PathBuf,
    cache_dir: PathBuf,
    libraries_dir: PathBuf,
    index_file: PathBuf,
    index: RwLock<CacheIndex>,
}

impl CacheRepository {
    /// Open the repository rooted at `common_dir`, loading `cache/index.json` wholesale.
    pub fn open(common_dir: impl Into<PathBuf>) -> Self {
        let common_dir = common_dir.into();
        let cache_dir = common_dir.join("cache");
        let index_file = cache_dir.join("index.json");
        let index = CacheIndex::load(&index_file);
        debug!(
            "Opened cache at {:?} ({} indexed libraries)",
            cache_dir,
            index.libraries.len()
        );

        Self {
            inner: Arc::new(Inner {
                libraries_dir: common_dir.join("libraries"),
                common_dir,
                cache_dir,
                index_file,
                index: RwLock::new(index),
            }),
        }
    }

    /// A fresh snapshot rooted elsewhere. Existing handles keep their directory.
    pub fn change_directory(&self, common_dir: impl Into<PathBuf>) -> Self {
        Self::open(common_dir)
    }

    pub fn common_dir(&self) -> &Path {
        &self.inner.common_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    pub fn index_snapshot(&self) -> CacheIndex {
        self.read_index().clone()
    }

    // ── Generic files ───────────────────────────────────

    pub fn file_path(&self, artifact: &CachedArtifact) -> PathBuf {
        let hash = artifact.hash.as_str();
        self.inner
            .cache_dir
            .join(artifact.algorithm.dir_name())
            .join(&hash[..hash.len().min(2)])
            .join(hash)
    }

    /// Whether the store holds `artifact` and its bytes still hash correctly.
    pub fn file_exists(&self, artifact: &CachedArtifact) -> bool {
        if !artifact.is_well_formed() {
            return false;
        }
        let path = self.file_path(artifact);
        if !path.is_file() {
            return false;
        }
        match digest_file(artifact.algorithm, &path) {
            Ok(actual) if actual == artifact.hash => true,
            Ok(actual) => {
                debug!("Cached {:?} is corrupt (hash {}), ignoring", path, actual);
                false
            }
            Err(e) => {
                debug!("Unable to hash cached {:?}: {}", path, e);
                false
            }
        }
    }

    /// Copy `path` into the store unless the blob is already present.
    pub fn try_cache_file(&self, path: &Path, artifact: &CachedArtifact) -> LauncherResult<()> {
        if self.file_path(artifact).is_file() {
            return Ok(());
        }
        self.cache_file(path, artifact).map(|_| ())
    }

    pub fn cache_file(&self, path: &Path, artifact: &CachedArtifact) -> LauncherResult<PathBuf> {
        if !artifact.is_well_formed() {
            return Err(LauncherError::Other(format!(
                "Refusing to cache {:?} under malformed hash {}",
                path, artifact.hash
            )));
        }
        let dest = self.file_path(artifact);
        store_copy(path, &dest)?;
        Ok(dest)
    }

    pub fn cache_bytes(
        &self,
        bytes: &[u8],
        algorithm: HashAlgorithm,
    ) -> LauncherResult<(CachedArtifact, PathBuf)> {
        let artifact = CachedArtifact::new(digest_bytes(algorithm, bytes), algorithm);
        let dest = self.file_path(&artifact);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let tmp = temp_sibling(&dest);
        std::fs::write(&tmp, bytes).map_err(|e| LauncherError::io(&tmp, e))?;
        rename_into_place(&tmp, &dest)?;
        Ok((artifact, dest))
    }

    /// Find `hash` in the store, else verify `original` and migrate it in.
    pub fn check_existent_file(
        &self,
        original: Option<&Path>,
        algorithm: HashAlgorithm,
        hash: Option<&str>,
    ) -> CacheLookup {
        let artifact = hash.map(|h| CachedArtifact::new(h, algorithm));
        if let Some(artifact) = &artifact {
            if self.file_exists(artifact) {
                return CacheLookup::Found(self.file_path(artifact));
            }
        }

        let Some(original) = original.filter(|p| p.is_file()) else {
            return CacheLookup::NotFound;
        };
        let Some(artifact) = artifact else {
            return CacheLookup::Found(original.to_path_buf());
        };

        match digest_file(algorithm, original) {
            Ok(actual) if actual == artifact.hash => {
                match self
                    .cache_file(original, &artifact)
                    .and_then(|cached| self.restore(original, &cached))
                {
                    Ok(cached) => CacheLookup::Found(cached),
                    Err(e) => {
                        warn!("Unable to migrate {:?} into the cache: {}", original, e);
                        CacheLookup::Found(original.to_path_buf())
                    }
                }
            }
            Ok(actual) => CacheLookup::VerificationFailed {
                expected: artifact.hash,
                actual,
            },
            Err(e) => {
                debug!("Unable to hash {:?}: {}", original, e);
                CacheLookup::NotFound
            }
        }
    }

    // ── Libraries ───────────────────────────────────────

    /// Cache `jar` only if it verifies against the library's `sha1` or,
    /// lacking one, its `checksums[]`. Returns whether it was cached.
    pub fn try_cache_library(&self, library: &Library, jar: &Path) -> LauncherResult<bool> {
        let sha1 = library.download(DEFAULT_LIBRARIES_URL).sha1;

        if let Some(expected) = sha1 {
            let expected = expected.to_ascii_lowercase();
            let actual = digest_file(HashAlgorithm::Sha1, jar)?;
            if actual != expected {
                debug!(
                    "Not caching {}: hash {} does not match {}",
                    library.name(),
                    actual,
                    expected
                );
                return Ok(false);
            }
            if self.is_indexed(&library.name(), &expected) && self.file_exists(&CachedArtifact::sha1(&expected)) {
                return Ok(false);
            }
            self.cache_library(library, jar, IndexKind::Jar)?;
            return Ok(true);
        }

        if library.checksums().is_empty() {
            return Ok(false);
        }
        if !checksums_valid(jar, library.checksums())? {
            debug!("Not caching {}: checksum list rejected {:?}", library.name(), jar);
            return Ok(false);
        }
        self.cache_library(library, jar, IndexKind::Forge)?;
        Ok(true)
    }

    /// Locate a verified copy of `library`: by declared hash, then by every
    /// hash previously indexed under its name, then in the legacy
    /// `libraries/` tree (migrating it into the store on success).
    pub fn lookup_library(&self, library: &Library) -> CacheLookup {
        let download = library.download(DEFAULT_LIBRARIES_URL);
        let name = library.name();
        let declared = download.sha1.as_deref().map(CachedArtifact::sha1);

        if let Some(artifact) = &declared {
            if self.file_exists(artifact) {
                return CacheLookup::Found(self.file_path(artifact));
            }
        }

        let candidates: Vec<LibraryIndexEntry> = self.read_index().entries_for(&name).cloned().collect();
        for entry in candidates {
            let artifact = CachedArtifact::sha1(&entry.hash);
            if !self.file_exists(&artifact) {
                debug!("Index entry {} -> {} has no blob, skipping", name, entry.hash);
                continue;
            }
            let file = self.file_path(&artifact);
            let accepted = match entry.kind {
                IndexKind::Forge => {
                    checksums_valid_as(&file, library.checksums(), library.artifact.packaging == "jar")
                        .unwrap_or(false)
                }
                // The blob already verified against its own hash.
                IndexKind::Jar => true,
            };
            if accepted {
                return CacheLookup::Found(file);
            }
        }

        let legacy = self.legacy_library_path(&download.path);
        if !legacy.is_file() {
            return CacheLookup::NotFound;
        }

        if let Some(artifact) = declared {
            return match digest_file(HashAlgorithm::Sha1, &legacy) {
                Ok(actual) if actual == artifact.hash => self.migrate_library(library, &legacy, IndexKind::Jar),
                Ok(actual) => CacheLookup::VerificationFailed {
                    expected: artifact.hash,
                    actual,
                },
                Err(e) => {
                    debug!("Unable to hash {:?}: {}", legacy, e);
                    CacheLookup::NotFound
                }
            };
        }

        if !library.checksums().is_empty() {
            return match checksums_valid(&legacy, library.checksums()) {
                Ok(true) => self.migrate_library(library, &legacy, IndexKind::Forge),
                Ok(false) => CacheLookup::VerificationFailed {
                    expected: library.checksums().join(","),
                    actual: digest_file(HashAlgorithm::Sha1, &legacy).unwrap_or_default(),
                },
                Err(_) => CacheLookup::NotFound,
            };
        }

        CacheLookup::Found(legacy)
    }

    /// Copy an already-verified `path` into the store and index it under the
    /// library's name. The hash is the declared `sha1`, else computed.
    #[instrument(skip(self, library, path), fields(library = %library.name()))]
    pub fn cache_library(&self, library: &Library, path: &Path, kind: IndexKind) -> LauncherResult<PathBuf> {
        let name = library.name();
        let hash = match library.download(DEFAULT_LIBRARIES_URL).sha1 {
            Some(hash) => hash.to_ascii_lowercase(),
            None => digest_file(HashAlgorithm::Sha1, path).map_err(|e| e.for_artifact(&name, "?"))?,
        };

        let artifact = CachedArtifact::sha1(&hash);
        let cached = self
            .cache_file(path, &artifact)
            .map_err(|e| e.for_artifact(&name, &hash))?;

        let mut index = self.write_index();
        if index.record(LibraryIndexEntry {
            name: name.clone(),
            hash: hash.clone(),
            kind,
        }) {
            index
                .save(&self.inner.index_file)
                .map_err(|e| e.for_artifact(&name, &hash))?;
            info!("Cached {} as {}", name, hash);
        }
        Ok(cached)
    }

    pub fn legacy_library_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.inner.libraries_dir.clone(), |path, segment| path.join(segment))
    }

    fn is_indexed(&self, name: &str, hash: &str) -> bool {
        self.read_index()
            .entries_for(name)
            .any(|e| e.hash.eq_ignore_ascii_case(hash))
    }

    fn migrate_library(&self, library: &Library, legacy: &Path, kind: IndexKind) -> CacheLookup {
        match self
            .cache_library(library, legacy, kind)
            .and_then(|cached| self.restore(legacy, &cached))
        {
            Ok(cached) => CacheLookup::Found(cached),
            Err(e) => {
                warn!("Unable to migrate {:?} into the cache: {}", legacy, e);
                CacheLookup::Found(legacy.to_path_buf())
            }
        }
    }

    /// Replace `original` with a hard link to `cached`. The blob is already in
    /// the store and verified, and the link is built beside `original` then
    /// renamed over it, so at no point is the only copy of the bytes missing.
    fn restore(&self, original: &Path, cached: &Path) -> LauncherResult<PathBuf> {
        let link = temp_sibling(original);
        if let Err(e) = std::fs::hard_link(cached, &link) {
            // Different filesystems: keep the original file as is.
            debug!("Hard link {:?} -> {:?} failed: {}", link, cached, e);
            return Ok(cached.to_path_buf());
        }
        if let Err(e) = std::fs::rename(&link, original) {
            let _ = std::fs::remove_file(&link);
            return Err(LauncherError::io(original, e));
        }
        debug!("Restored {:?} as a link into the cache", original);
        Ok(cached.to_path_buf())
    }

    fn read_index(&self) -> RwLockReadGuard<'_, CacheIndex> {
        self.inner
            .index
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, CacheIndex> {
        self.inner
            .index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

fn store_copy(src: &Path, dest: &Path) -> LauncherResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }
    let tmp = temp_sibling(dest);
    std::fs::copy(src, &tmp).map_err(|e| LauncherError::io(src, e))?;
    rename_into_place(&tmp, dest)
}

fn rename_into_place(tmp: &Path, dest: &Path) -> LauncherResult<()> {
    std::fs::rename(tmp, dest).map_err(|e| {
        let _ = std::fs::remove_file(tmp);
        LauncherError::io(dest, e)
    })
}
