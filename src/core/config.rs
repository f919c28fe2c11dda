// ─── Engine Configuration ───
// Persisted knobs for the resolver, cache and installer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "InterfaceOficial";

pub const DEFAULT_LIBRARIES_URL: &str = "https://libraries.minecraft.net/";
pub const DEFAULT_ASSETS_URL: &str = "https://resources.download.minecraft.net/";
pub const DEFAULT_VERSIONS_URL: &str = "https://s3.amazonaws.com/Minecraft.Download/versions/";
pub const DEFAULT_INDEX_URL: &str = "https://s3.amazonaws.com/Minecraft.Download/indexes/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root holding `versions/`, `libraries/`, `assets/` and `cache/`.
    pub common_dir: PathBuf,
    pub max_concurrency: usize,
    /// Extra download attempts after a checksum mismatch.
    pub download_retries: u32,
    pub request_timeout_secs: u64,
    pub libraries_url: String,
    pub assets_url: String,
    pub versions_url: String,
    pub index_url: String,
    /// Fail on circular `inheritsFrom` chains instead of truncating them.
    pub strict_inheritance: bool,
    /// Re-hash library files that already exist before trusting them.
    pub integrity_check: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            common_dir: default_common_dir(),
            max_concurrency: 8,
            download_retries: 1,
            request_timeout_secs: 120,
            libraries_url: DEFAULT_LIBRARIES_URL.to_string(),
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            versions_url: DEFAULT_VERSIONS_URL.to_string(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            strict_inheritance: false,
            integrity_check: true,
        }
    }
}

impl EngineConfig {
    pub fn with_common_dir(mut self, common_dir: impl Into<PathBuf>) -> Self {
        self.common_dir = common_dir.into();
        self
    }

    /// Load the configuration from `path`. A missing file yields the defaults,
    /// an unreadable one is reported.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No engine config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };

        let mut config: EngineConfig = serde_json::from_str(&raw)?;
        if config.max_concurrency == 0 {
            warn!("max_concurrency = 0 in {:?}, falling back to 1", path);
            config.max_concurrency = 1;
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| LauncherError::io(path, e))
    }
}

fn default_common_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("minecraft")
}
