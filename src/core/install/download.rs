use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::task::{Outcome, Significance, Task, TaskContext, TaskNode};

use super::partial_path;

/// Fetch one URL into `dest`, verifying SHA-1 when known. A mismatch is
/// re-fetched up to `retries` more times; the file only appears at `dest`
/// once it verified.
pub struct DownloadTask {
    name: String,
    url: String,
    dest: PathBuf,
    sha1: Option<String>,
    retries: u32,
    significance: Significance,
    fetcher: Arc<dyn Fetcher>,
}

impl DownloadTask {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        let url = url.into();
        Self {
            name: format!("download {}", url),
            url,
            dest: dest.into(),
            sha1: None,
            retries: 1,
            significance: Significance::Major,
            fetcher,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1.map(|s| s.to_ascii_lowercase());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_significance(mut self, significance: Significance) -> Self {
        self.significance = significance;
        self
    }

    pub fn into_node(self) -> TaskNode {
        TaskNode::new(self)
    }
}

#[async_trait]
impl Task for DownloadTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn significance(&self) -> Significance {
        self.significance
    }

    async fn execute(&self, cx: &TaskContext) -> LauncherResult<Outcome> {
        let mut mismatch = None;

        for attempt in 0..=self.retries {
            if cx.is_cancelled() {
                return Err(LauncherError::Cancelled);
            }

            let tmp = partial_path(&self.dest);
            let fetched = match self.fetcher.fetch(&self.url, &tmp).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    let _ = tokio::fs::remove_file(&tmp).await;
                    return Err(e);
                }
            };

            if let Some(expected) = &self.sha1 {
                if !fetched.sha1.eq_ignore_ascii_case(expected) {
                    let _ = tokio::fs::remove_file(&tmp).await;
                    warn!(
                        "Checksum mismatch for {} (attempt {}): expected {}, got {}",
                        self.url,
                        attempt + 1,
                        expected,
                        fetched.sha1
                    );
                    mismatch = Some(LauncherError::ChecksumMismatch {
                        name: self.url.clone(),
                        expected: expected.clone(),
                        actual: fetched.sha1,
                    });
                    continue;
                }
            }

            if let Err(e) = tokio::fs::rename(&tmp, &self.dest).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(LauncherError::io(&self.dest, e));
            }
            debug!("{} -> {:?} ({} bytes)", self.url, self.dest, fetched.size);
            return Ok(Outcome::with_output(self.dest.clone()));
        }

        let hash = self.sha1.clone().unwrap_or_default();
        Err(mismatch
            .unwrap_or(LauncherError::Cancelled)
            .for_artifact(self.url.clone(), hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::{digest_bytes, HashAlgorithm};
    use crate::core::downloader::FetchedFile;
    use crate::core::task::{TaskExecutor, TaskGraph, TaskState};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a bad body for the first `bad` requests, then the good one.
    struct Flaky {
        good: Vec<u8>,
        bad: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for Flaky {
        async fn fetch(&self, _url: &str, dest: &Path) -> LauncherResult<FetchedFile> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let body: &[u8] = if call < self.bad { b"garbage" } else { &self.good };
            std::fs::write(dest, body).unwrap();
            Ok(FetchedFile {
                sha1: digest_bytes(HashAlgorithm::Sha1, body),
                size: body.len() as u64,
            })
        }
    }

    #[tokio::test]
    async fn mismatch_is_retried_once() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("client.jar");
        let fetcher = Arc::new(Flaky {
            good: b"real jar".to_vec(),
            bad: 1,
            calls: AtomicUsize::new(0),
        });
        let sha1 = digest_bytes(HashAlgorithm::Sha1, b"real jar");

        let node = DownloadTask::new(fetcher.clone(), "https://example.invalid/client.jar", &dest)
            .with_sha1(Some(sha1))
            .into_node();
        let report = TaskExecutor::new(1).execute(TaskGraph::from(node)).await;

        assert!(report.succeeded);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read(&dest).unwrap(), b"real jar");
    }

    #[tokio::test]
    async fn persistent_mismatch_fails_with_artifact_identity() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("client.jar");
        let fetcher = Arc::new(Flaky {
            good: b"real jar".to_vec(),
            bad: 10,
            calls: AtomicUsize::new(0),
        });
        let sha1 = digest_bytes(HashAlgorithm::Sha1, b"real jar");

        let node = DownloadTask::new(fetcher.clone(), "https://example.invalid/client.jar", &dest)
            .with_sha1(Some(sha1.clone()))
            .into_node();
        let report = TaskExecutor::new(1).execute(TaskGraph::from(node.clone())).await;

        assert_eq!(node.state(), TaskState::Failed);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(!dest.exists());
        match report.failures[0].error.as_ref() {
            LauncherError::Artifact { hash, source, .. } => {
                assert_eq!(hash, &sha1);
                assert!(matches!(source.as_ref(), LauncherError::ChecksumMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        // No partial files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
