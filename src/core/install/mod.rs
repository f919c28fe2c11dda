// ─── Installation ───
// Concrete tasks that materialize a resolved version on disk:
//   - client jar, asset index + objects, logging config: hash-addressed files
//   - libraries: cache lookup first, download otherwise, then cache
//   - `build_install_graph` wires them under one root node

mod assets;
mod download;
mod file;
mod graph;
mod library;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::core::cache::CacheRepository;
use crate::core::config::EngineConfig;
use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::game::GameDirectory;

pub use assets::{AssetIndex, AssetObject, AssetsTask};
pub use download::DownloadTask;
pub use file::CachedFileTask;
pub use graph::build_install_graph;
pub use library::{should_download_library, GameLibrariesTask, LibraryDownloadTask};

/// Everything an installation task needs, shared by every node of a graph.
#[derive(Clone)]
pub struct InstallContext {
    pub directory: GameDirectory,
    pub cache: CacheRepository,
    pub fetcher: Arc<dyn Fetcher>,
    pub libraries_url: String,
    pub assets_url: String,
    pub versions_url: String,
    pub index_url: String,
    pub download_retries: u32,
    pub integrity_check: bool,
}

impl InstallContext {
    pub fn new(config: &EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            directory: GameDirectory::new(&config.common_dir),
            cache: CacheRepository::open(&config.common_dir),
            fetcher,
            libraries_url: config.libraries_url.clone(),
            assets_url: config.assets_url.clone(),
            versions_url: config.versions_url.clone(),
            index_url: config.index_url.clone(),
            download_retries: config.download_retries,
            integrity_check: config.integrity_check,
        }
    }
}

/// Run blocking filesystem work (hashing, cache copies) off the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> LauncherResult<T>
where
    F: FnOnce() -> LauncherResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LauncherError::Other(format!("Blocking task failed: {}", e)))?
}

/// Put a verified copy of `source` at `dest`, hard-linking when possible.
pub(crate) fn place_file(source: &Path, dest: &Path) -> LauncherResult<()> {
    if source == dest {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }

    let tmp = partial_path(dest);
    if std::fs::hard_link(source, &tmp).is_err() {
        std::fs::copy(source, &tmp).map_err(|e| LauncherError::io(source, e))?;
    }
    std::fs::rename(&tmp, dest).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        LauncherError::io(dest, e)
    })?;
    debug!("Placed {:?} from {:?}", dest, source);
    Ok(())
}

/// In-progress name beside `dest`; never collides between concurrent writers.
pub(crate) fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4()))
}
