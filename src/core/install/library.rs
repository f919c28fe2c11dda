use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::cache::{checksums_valid, digest_file, CacheLookup, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::task::{Outcome, Significance, Task, TaskContext, TaskNode};
use crate::core::version::{Library, VersionDescriptor};

use super::download::DownloadTask;
use super::{blocking, place_file, InstallContext};

/// Whether `library` must be fetched into `file`: it is missing, or
/// `integrity_check` is on and it fails its declared hash or checksum list.
pub fn should_download_library(library: &Library, file: &Path, integrity_check: bool) -> bool {
    if !file.is_file() {
        return true;
    }
    if !integrity_check {
        return false;
    }

    if let Some(expected) = library.download("").sha1 {
        match digest_file(HashAlgorithm::Sha1, file) {
            Ok(actual) if actual.eq_ignore_ascii_case(&expected) => {}
            Ok(_) => return true,
            Err(e) => warn!("Unable to hash {:?}: {}", file, e),
        }
    }
    if !library.checksums().is_empty() {
        match checksums_valid(file, library.checksums()) {
            Ok(true) => {}
            Ok(false) => return true,
            Err(e) => {
                debug!("{:?} is unreadable, re-downloading: {}", file, e);
                return true;
            }
        }
    }
    false
}

/// Materialize one library under `libraries/`: from the cache when a
/// verified copy exists, downloading otherwise.
pub struct LibraryDownloadTask {
    ctx: InstallContext,
    library: Library,
    /// Coordinate the bytes are fetched from; differs only for Forge.
    remote: Library,
    dest: PathBuf,
    cached: AtomicBool,
}

impl LibraryDownloadTask {
    pub fn new(ctx: InstallContext, library: &Library) -> Self {
        // Forge's own jar is published under the `universal` classifier but
        // lives on the classpath under its plain name.
        let remote = if library.is("net.minecraftforge", "forge") && library.artifact.classifier.is_none() {
            library.with_classifier("universal")
        } else {
            library.clone()
        };
        let dest = ctx.directory.library_file(library, &ctx.libraries_url);
        Self {
            ctx,
            library: library.clone(),
            remote,
            dest,
            cached: AtomicBool::new(false),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn download_url(&self) -> String {
        self.remote.download(&self.ctx.libraries_url).url
    }

    pub fn into_node(self) -> TaskNode {
        TaskNode::new(self)
    }

    fn download_error(&self, reason: impl Into<String>) -> LauncherError {
        LauncherError::LibraryDownload {
            name: self.library.name(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Task for LibraryDownloadTask {
    fn name(&self) -> String {
        format!("library {}", self.library.name())
    }

    /// Runs even when the download failed, to report it as a library failure.
    fn relies_on_dependencies(&self) -> bool {
        false
    }

    async fn prepare(&self, _cx: &TaskContext) -> LauncherResult<Vec<TaskNode>> {
        let cache = self.ctx.cache.clone();
        let library = self.library.clone();
        let dest = self.dest.clone();
        let integrity_check = self.ctx.integrity_check;

        let hit = blocking(move || {
            if !should_download_library(&library, &dest, integrity_check) {
                return Ok(true);
            }
            match cache.lookup_library(&library) {
                CacheLookup::Found(found) => {
                    place_file(&found, &dest)?;
                    Ok(true)
                }
                CacheLookup::VerificationFailed { expected, actual } => {
                    debug!(
                        "Existing {:?} hashes to {}, expected {}",
                        dest, actual, expected
                    );
                    let _ = std::fs::remove_file(&dest);
                    Ok(false)
                }
                CacheLookup::NotFound => Ok(false),
            }
        })
        .await
        .map_err(|e| self.download_error(e.to_string()))?;

        if hit {
            debug!("{} satisfied from cache", self.library.name());
            self.cached.store(true, Ordering::SeqCst);
            return Ok(Vec::new());
        }

        let sha1 = self.library.download(&self.ctx.libraries_url).sha1;
        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.download_error(LauncherError::io(parent, e).to_string()))?;
        }
        Ok(vec![DownloadTask::new(self.ctx.fetcher.clone(), self.download_url(), &self.dest)
            .named(format!("download {}", self.library.name()))
            .with_sha1(sha1)
            .with_retries(self.ctx.download_retries)
            .with_significance(Significance::Minor)
            .into_node()])
    }

    async fn execute(&self, cx: &TaskContext) -> LauncherResult<Outcome> {
        if self.cached.load(Ordering::SeqCst) {
            return Ok(Outcome::with_output(self.dest.clone()));
        }

        if let Some((_, error)) = cx.failed_dependencies().first() {
            return Err(self.download_error(error.to_string()));
        }

        let library = self.library.clone();
        let dest = self.dest.clone();
        let cache = self.ctx.cache.clone();
        let name = self.library.name();

        blocking(move || {
            if !library.checksums().is_empty() && !checksums_valid(&dest, library.checksums())? {
                let _ = std::fs::remove_file(&dest);
                return Err(LauncherError::Other(format!("Checksum failed for {}", name)));
            }
            match cache.try_cache_library(&library, &dest) {
                Ok(true) => info!("Library {} added to the cache", name),
                Ok(false) => {}
                Err(e) => warn!("Unable to cache library {}: {}", name, e),
            }
            Ok(())
        })
        .await
        .map_err(|e| self.download_error(e.to_string()))?;

        Ok(Outcome::with_output(self.dest.clone()))
    }
}

/// Downloads every library of a resolved version that applies here, as a
/// continuation so the step only completes once each library did.
pub struct GameLibrariesTask {
    ctx: InstallContext,
    libraries: Vec<Library>,
}

impl GameLibrariesTask {
    pub fn new(ctx: InstallContext, version: &VersionDescriptor) -> Self {
        Self {
            ctx,
            libraries: version.applicable_libraries().cloned().collect(),
        }
    }

    pub fn into_node(self) -> TaskNode {
        TaskNode::new(self)
    }
}

#[async_trait]
impl Task for GameLibrariesTask {
    fn name(&self) -> String {
        "libraries".to_string()
    }

    async fn execute(&self, _cx: &TaskContext) -> LauncherResult<Outcome> {
        let mut seen = Vec::new();
        let mut nodes = Vec::new();
        for library in &self.libraries {
            let task = LibraryDownloadTask::new(self.ctx.clone(), library);
            // Same file requested twice (e.g. a patch re-declaring a library).
            if seen.contains(&task.dest) {
                continue;
            }
            seen.push(task.dest.clone());
            nodes.push(task.into_node());
        }
        debug!("Scheduling {} library downloads", nodes.len());
        Ok(Outcome::done().then_all(nodes))
    }
}
