use tracing::{debug, info, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::task::{Outcome, Significance, SimpleTask, TaskGraph, TaskNode};
use crate::core::version::{DownloadType, ResolvedVersion};

use super::assets::AssetsTask;
use super::file::CachedFileTask;
use super::library::GameLibrariesTask;
use super::InstallContext;

/// Everything needed to play `version`, under one root node:
///
/// ```text
/// install <id>
///  ├── version json <id>
///  ├── client jar <id>
///  ├── libraries ──then──> library <name> ... (each: cache hit or download <name>)
///  ├── assets <index> ──then──> asset <hash> ...
///  │    └── asset index <index>
///  └── logging config <file>   (minor)
/// ```
///
/// If the version directory did not exist beforehand and the run fails, it
/// is removed again.
#[instrument(skip_all, fields(version = %version.id))]
pub fn build_install_graph(ctx: &InstallContext, version: &ResolvedVersion) -> LauncherResult<TaskGraph> {
    let flat = version.flatten();
    let id = flat.id.clone();
    let version_dir = ctx.directory.version_dir(&id);
    let created_here = !version_dir.exists();

    let mut steps: Vec<TaskNode> = Vec::new();
    steps.push(version_json_node(ctx, version)?);

    let client = flat.client_download(&ctx.versions_url);
    steps.push(
        CachedFileTask::new(
            ctx.clone(),
            format!("client jar {}", id),
            client.url,
            ctx.directory.version_jar(&id),
            client.sha1,
        )
        .into_node(),
    );

    steps.push(GameLibrariesTask::new(ctx.clone(), &flat).into_node());
    steps.push(AssetsTask::new(ctx.clone(), flat.asset_index_info(&ctx.index_url)).into_node());

    if let Some(logging) = flat.logging_config(DownloadType::Client) {
        steps.push(
            CachedFileTask::new(
                ctx.clone(),
                format!("logging config {}", logging.file.id),
                logging.file.url.clone(),
                ctx.directory.logging_config(&logging.file.id),
                logging.file.sha1.clone(),
            )
            .with_significance(Significance::Minor)
            .into_node(),
        );
    }

    debug!("Install graph for {} has {} top-level steps", id, steps.len());

    let root_id = id.clone();
    let root = SimpleTask::new(format!("install {}", id), move |_| {
        let id = root_id.clone();
        async move {
            info!("Version {} installed", id);
            Ok(Outcome::done())
        }
    })
    .into_node()
    .with_dependencies(steps)
    .when_complete(move |success| {
        if success || !created_here {
            return;
        }
        warn!("Installing {} failed, removing {:?}", id, version_dir);
        if let Err(e) = std::fs::remove_dir_all(&version_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Unable to remove {:?}: {}", version_dir, e);
            }
        }
    });

    Ok(TaskGraph::from(root))
}

/// Writes `versions/<id>/<id>.json` unless one is already there.
fn version_json_node(ctx: &InstallContext, version: &ResolvedVersion) -> LauncherResult<TaskNode> {
    let path = ctx.directory.version_json(&version.id);
    let json = serde_json::to_string_pretty(&**version)?;

    Ok(SimpleTask::new(format!("version json {}", version.id), move |_| {
        let path = path.clone();
        let json = json.clone();
        async move {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(Outcome::done());
            }
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| LauncherError::io(parent, e))?;
            }
            tokio::fs::write(&path, json)
                .await
                .map_err(|e| LauncherError::io(&path, e))?;
            Ok(Outcome::done())
        }
    })
    .into_node())
}
