use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::config::EngineConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

/// What a completed fetch wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Lowercase hex SHA-1 of the written bytes.
    pub sha1: String,
    pub size: u64,
}

/// Network-fetch capability used by the install tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest` (overwriting it), hashing while writing.
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<FetchedFile>;
}

/// `reqwest`-backed fetcher, streaming the body to disk.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &EngineConfig) -> LauncherResult<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<FetchedFile> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut hasher = Sha1::new();
        let mut size = 0u64;
        // Scoped so the handle is closed before the caller renames the file.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                size += chunk.len() as u64;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(dest, e))?;
            }
            file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, size);
        Ok(FetchedFile {
            sha1: hex::encode(hasher.finalize()),
            size,
        })
    }
}
