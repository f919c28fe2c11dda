use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installation engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A low-level failure tagged with the artifact it happened on.
    #[error("Artifact {name} ({hash}): {source}")]
    Artifact {
        name: String,
        hash: String,
        #[source]
        source: Box<LauncherError>,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Versions ────────────────────────────────────────
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Circular inheritance between versions: {0}")]
    CircularInheritance(String),

    #[error("Version {0} still inherits from another version, resolve it first")]
    NotIndependent(String),

    // ── Tasks ───────────────────────────────────────────
    #[error("Unable to download library {name}: {reason}")]
    LibraryDownload { name: String, reason: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("Task {0} panicked")]
    TaskPanicked(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wrap this error with the identity of the artifact being processed.
    pub fn for_artifact(self, name: impl Into<String>, hash: impl Into<String>) -> Self {
        LauncherError::Artifact {
            name: name.into(),
            hash: hash.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}
