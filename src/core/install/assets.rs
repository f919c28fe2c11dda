use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::task::{Outcome, Significance, Task, TaskContext, TaskNode};
use crate::core::version::AssetIndexInfo;

use super::file::CachedFileTask;
use super::InstallContext;

/// `assets/indexes/<id>.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: BTreeMap<String, AssetObject>,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub map_to_resources: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// `<first 2 hex>/<hash>`, both on the CDN and under `assets/objects`.
    pub fn location(&self) -> String {
        format!("{}/{}", self.hash.get(..2).unwrap_or(&self.hash), self.hash)
    }
}

/// Fetches the asset index, then every object it lists as a continuation.
/// Individual objects are minor: one missing sound does not stop the
/// libraries from installing, but the step still counts as failed.
pub struct AssetsTask {
    ctx: InstallContext,
    info: AssetIndexInfo,
}

impl AssetsTask {
    pub fn new(ctx: InstallContext, info: AssetIndexInfo) -> Self {
        Self { ctx, info }
    }

    /// The asset step, depending on its index download.
    pub fn into_node(self) -> TaskNode {
        let index = CachedFileTask::new(
            self.ctx.clone(),
            format!("asset index {}", self.info.id),
            self.info.url.clone(),
            self.ctx.directory.asset_index_file(&self.info.id),
            self.info.sha1.clone(),
        )
        .into_node();
        TaskNode::new(self).with_dependency(index)
    }
}

#[async_trait]
impl Task for AssetsTask {
    fn name(&self) -> String {
        format!("assets {}", self.info.id)
    }

    async fn execute(&self, _cx: &TaskContext) -> LauncherResult<Outcome> {
        let path = self.ctx.directory.asset_index_file(&self.info.id);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        let index: AssetIndex = serde_json::from_str(&raw)?;

        let mut hashes = BTreeSet::new();
        let base = self.ctx.assets_url.trim_end_matches('/');
        let nodes: Vec<TaskNode> = index
            .objects
            .values()
            .filter(|object| hashes.insert(object.hash.to_ascii_lowercase()))
            .map(|object| {
                CachedFileTask::new(
                    self.ctx.clone(),
                    format!("asset {}", object.hash),
                    format!("{}/{}", base, object.location()),
                    self.ctx.directory.asset_object(&object.hash),
                    Some(object.hash.clone()),
                )
                .with_significance(Significance::Minor)
                .into_node()
            })
            .collect();

        debug!(
            "Asset index {} lists {} objects ({} unique)",
            self.info.id,
            index.objects.len(),
            nodes.len()
        );
        Ok(Outcome::with_output(index).then_all(nodes))
    }
}
