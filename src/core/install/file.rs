use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::cache::{CacheLookup, CachedArtifact, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::task::{Outcome, Significance, Task, TaskContext, TaskNode};

use super::download::DownloadTask;
use super::{blocking, place_file, InstallContext};

/// A hash-addressed file (client jar, asset index, asset object, logging
/// config): served from the cache store when possible, downloaded and
/// cached otherwise.
pub struct CachedFileTask {
    ctx: InstallContext,
    name: String,
    url: String,
    dest: PathBuf,
    sha1: Option<String>,
    significance: Significance,
    downloading: AtomicBool,
}

impl CachedFileTask {
    pub fn new(
        ctx: InstallContext,
        name: impl Into<String>,
        url: impl Into<String>,
        dest: impl Into<PathBuf>,
        sha1: Option<String>,
    ) -> Self {
        Self {
            ctx,
            name: name.into(),
            url: url.into(),
            dest: dest.into(),
            sha1: sha1.map(|s| s.to_ascii_lowercase()),
            significance: Significance::Major,
            downloading: AtomicBool::new(false),
        }
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
impl Task for CachedFileTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn significance(&self) -> Significance {
        self.significance
    }

    async fn prepare(&self, _cx: &TaskContext) -> LauncherResult<Vec<TaskNode>> {
        let cache = self.ctx.cache.clone();
        let dest = self.dest.clone();
        let sha1 = self.sha1.clone();

        let satisfied = blocking(move || {
            match cache.check_existent_file(Some(&dest), HashAlgorithm::Sha1, sha1.as_deref()) {
                CacheLookup::Found(found) => {
                    place_file(&found, &dest)?;
                    Ok(true)
                }
                CacheLookup::VerificationFailed { expected, actual } => {
                    debug!("{:?} is stale ({} != {}), re-downloading", dest, actual, expected);
                    let _ = std::fs::remove_file(&dest);
                    Ok(false)
                }
                CacheLookup::NotFound => Ok(false),
            }
        })
        .await?;

        if satisfied {
            debug!("{} satisfied locally", self.name);
            return Ok(Vec::new());
        }

        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        self.downloading.store(true, Ordering::SeqCst);
        Ok(vec![DownloadTask::new(self.ctx.fetcher.clone(), &self.url, &self.dest)
            .named(format!("download {}", self.name))
            .with_sha1(self.sha1.clone())
            .with_retries(self.ctx.download_retries)
            .with_significance(self.significance)
            .into_node()])
    }

    async fn execute(&self, _cx: &TaskContext) -> LauncherResult<Outcome> {
        if self.downloading.load(Ordering::SeqCst) {
            if let Some(sha1) = self.sha1.clone() {
                let cache = self.ctx.cache.clone();
                let dest = self.dest.clone();
                let cached = blocking(move || cache.try_cache_file(&dest, &CachedArtifact::sha1(sha1))).await;
                if let Err(e) = cached {
                    warn!("Unable to cache {:?}: {}", self.dest, e);
                }
            }
        }
        Ok(Outcome::with_output(self.dest.clone()))
    }
}
