mod common;

use std::path::Path;
use std::sync::Arc;

use launcher_core::core::cache::CachedArtifact;
use launcher_core::core::install::{build_install_graph, InstallContext};
use launcher_core::core::task::TaskExecutor;
use launcher_core::core::version::{ResolvedVersion, VersionDescriptor};
use launcher_core::{Engine, LauncherError};
use serde_json::json;

use common::{config, sha1, write_version, MemoryFetcher};

const CLIENT_URL: &str = "https://meta.test/1.20.1/client.jar";
const INDEX_URL: &str = "https://meta.test/indexes/5.json";
const LIBRARY_URL: &str = "https://libs.test/com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar";
const LOGGING_URL: &str = "https://meta.test/client-1.12.xml";
const LIBRARY_PATH: &str = "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar";

struct Fixture {
    fetcher: MemoryFetcher,
    version: serde_json::Value,
    icon_hash: String,
}

fn fixture() -> Fixture {
    fixture_serving(true)
}

fn fixture_serving(library_available: bool) -> Fixture {
    let client = b"client jar bytes".to_vec();
    let library = b"brigadier jar bytes".to_vec();
    let logging = b"<Configuration/>".to_vec();
    let icon = b"PNG!".to_vec();
    let icon_hash = sha1(&icon);
    let index = serde_json::to_vec(&json!({
        "objects": {
            "icons/icon_16x16.png": { "hash": icon_hash, "size": icon.len() },
            "icons/icon_32x32.png": { "hash": icon_hash, "size": icon.len() }
        }
    }))
    .unwrap();
    let icon_url = format!(
        "https://resources.download.minecraft.net/{}/{}",
        &icon_hash[..2],
        icon_hash
    );

    let version = json!({
        "id": "1.20.1",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "assets": "5",
        "assetIndex": {
            "id": "5",
            "url": INDEX_URL,
            "sha1": sha1(&index),
            "size": index.len(),
            "totalSize": icon.len()
        },
        "downloads": {
            "client": { "url": CLIENT_URL, "sha1": sha1(&client), "size": client.len() }
        },
        "libraries": [{
            "name": "com.mojang:brigadier:1.1.8",
            "downloads": {
                "artifact": {
                    "path": LIBRARY_PATH,
                    "url": LIBRARY_URL,
                    "sha1": sha1(&library),
                    "size": library.len()
                }
            }
        }],
        "logging": {
            "client": {
                "argument": "-Dlog4j.configurationFile=${path}",
                "file": { "id": "client-1.12.xml", "url": LOGGING_URL, "sha1": sha1(&logging), "size": logging.len() },
                "type": "log4j2-xml"
            }
        }
    });

    let mut fetcher = MemoryFetcher::default()
        .serve(CLIENT_URL, client)
        .serve(INDEX_URL, index)
        .serve(LOGGING_URL, logging)
        .serve(icon_url, icon);
    if library_available {
        fetcher = fetcher.serve(LIBRARY_URL, library);
    }

    Fixture {
        fetcher,
        version,
        icon_hash,
    }
}

fn library_file(root: &Path) -> std::path::PathBuf {
    LIBRARY_PATH
        .split('/')
        .fold(root.join("libraries"), |path, segment| path.join(segment))
}

#[tokio::test]
async fn installs_every_artifact_of_a_version() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture {
        fetcher,
        version,
        icon_hash,
    } = fixture();
    write_version(root, "1.20.1", &version);

    let fetcher = Arc::new(fetcher);
    let engine = Engine::with_fetcher(config(root), fetcher.clone());
    let report = engine.install("1.20.1").await.unwrap();

    assert!(report.succeeded, "failures: {:?}", report.failures);
    assert!(report.failures.is_empty());
    assert_eq!(
        std::fs::read(root.join("versions/1.20.1/1.20.1.jar")).unwrap(),
        b"client jar bytes"
    );
    assert_eq!(std::fs::read(library_file(root)).unwrap(), b"brigadier jar bytes");
    assert!(root.join("assets/indexes/5.json").is_file());
    assert!(root
        .join("assets/objects")
        .join(&icon_hash[..2])
        .join(&icon_hash)
        .is_file());
    assert!(root.join("assets/log_configs/client-1.12.xml").is_file());

    // Two index entries share one object: fetched once.
    let icon_url = format!(
        "https://resources.download.minecraft.net/{}/{}",
        &icon_hash[..2],
        icon_hash
    );
    assert_eq!(fetcher.requests_for(&icon_url), 1);

    let library_hash = sha1(b"brigadier jar bytes");
    assert!(engine.cache().file_exists(&CachedArtifact::sha1(&library_hash)));
}

#[tokio::test]
async fn reinstall_is_served_from_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture { fetcher, version, .. } = fixture();
    write_version(root, "1.20.1", &version);

    let fetcher = Arc::new(fetcher);
    let engine = Engine::with_fetcher(config(root), fetcher.clone());
    assert!(engine.install("1.20.1").await.unwrap().succeeded);
    let first_run = fetcher.total_requests();

    std::fs::remove_file(library_file(root)).unwrap();
    std::fs::remove_file(root.join("versions/1.20.1/1.20.1.jar")).unwrap();

    let report = engine.install("1.20.1").await.unwrap();
    assert!(report.succeeded, "failures: {:?}", report.failures);
    assert_eq!(fetcher.total_requests(), first_run);
    assert_eq!(std::fs::read(library_file(root)).unwrap(), b"brigadier jar bytes");
    assert!(root.join("versions/1.20.1/1.20.1.jar").is_file());
}

#[tokio::test]
async fn corrupt_library_is_downloaded_again() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture { fetcher, version, .. } = fixture();
    write_version(root, "1.20.1", &version);

    let path = library_file(root);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"truncated").unwrap();

    let fetcher = Arc::new(fetcher);
    let engine = Engine::with_fetcher(config(root), fetcher.clone());
    let report = engine.install("1.20.1").await.unwrap();

    assert!(report.succeeded, "failures: {:?}", report.failures);
    assert_eq!(fetcher.requests_for(LIBRARY_URL), 1);
    assert_eq!(std::fs::read(&path).unwrap(), b"brigadier jar bytes");
}

#[tokio::test]
async fn missing_library_fails_the_install() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture { fetcher, version, .. } = fixture_serving(false);
    write_version(root, "1.20.1", &version);

    let engine = Engine::with_fetcher(config(root), Arc::new(fetcher));
    let report = engine.install("1.20.1").await.unwrap();

    assert!(!report.succeeded);
    let failure = report
        .failure("library com.mojang:brigadier:1.1.8")
        .expect("library failure reported");
    assert!(matches!(
        failure.error.as_ref(),
        LauncherError::LibraryDownload { name, .. } if name == "com.mojang:brigadier:1.1.8"
    ));
    assert!(report.skipped.contains(&"install 1.20.1".to_string()));
    assert!(!library_file(root).exists());
    // The version existed before this install, so it stays.
    assert!(root.join("versions/1.20.1/1.20.1.json").is_file());
}

#[tokio::test]
async fn nothing_reachable_cancels_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture { version, .. } = fixture();
    write_version(root, "1.20.1", &version);

    let engine = Engine::with_fetcher(config(root), Arc::new(MemoryFetcher::default()));
    let report = engine.install("1.20.1").await.unwrap();

    assert!(!report.succeeded);
    assert!(report.cancelled);
    assert!(report.blocking_failure().is_some());
}

#[tokio::test]
async fn failed_fresh_install_removes_the_version_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let Fixture { version, .. } = fixture();

    let descriptor: VersionDescriptor = serde_json::from_value(version).unwrap();
    let resolved = ResolvedVersion::from_independent(descriptor).unwrap();
    let ctx = InstallContext::new(&config(root), Arc::new(MemoryFetcher::default()));

    let graph = build_install_graph(&ctx, &resolved).unwrap();
    let report = TaskExecutor::new(1).execute(graph).await;

    assert!(!report.succeeded);
    assert!(!root.join("versions/1.20.1").exists());
}

#[tokio::test]
async fn unknown_version_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::with_fetcher(config(dir.path()), Arc::new(MemoryFetcher::default()));
    assert!(matches!(
        engine.install("nope").await,
        Err(LauncherError::VersionNotFound(id)) if id == "nope"
    ));
}
