#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use launcher_core::core::cache::{digest_bytes, HashAlgorithm};
use launcher_core::core::config::EngineConfig;
use launcher_core::core::downloader::{FetchedFile, Fetcher};
use launcher_core::{LauncherError, LauncherResult};

/// Serves fixed bodies by URL and records every request.
#[derive(Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn serve(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), body.into());
        self
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<FetchedFile> {
        self.requests.lock().unwrap().push(url.to_string());
        let Some(body) = self.files.get(url) else {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            });
        };
        std::fs::write(dest, body).map_err(LauncherError::from)?;
        Ok(FetchedFile {
            sha1: sha1(body),
            size: body.len() as u64,
        })
    }
}

pub fn sha1(bytes: &[u8]) -> String {
    digest_bytes(HashAlgorithm::Sha1, bytes)
}

pub fn config(root: &Path) -> EngineConfig {
    EngineConfig {
        max_concurrency: 4,
        ..EngineConfig::default().with_common_dir(root)
    }
}

pub fn write_version(root: &Path, id: &str, json: &serde_json::Value) {
    let dir = root.join("versions").join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.json", id)), serde_json::to_vec_pretty(json).unwrap()).unwrap();
}
