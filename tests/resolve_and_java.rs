mod common;

use std::sync::Arc;

use launcher_core::core::java::{
    select_from, JavaRanges, JavaRuntime, JavaSelection, Range, StaticRuntimes, VersionNumber,
};
use launcher_core::core::loaders::{LibraryAnalyzer, LoaderKind};
use launcher_core::{Engine, LauncherError};
use serde_json::json;

use common::{config, write_version, MemoryFetcher};

fn engine_with_forge(root: &std::path::Path) -> Engine {
    write_version(
        root,
        "1.17.1",
        &json!({
            "id": "1.17.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "1.17",
            "libraries": [
                { "name": "com.mojang:brigadier:1.0.18" },
                { "name": "org.lwjgl:lwjgl:3.2.2" }
            ]
        }),
    );
    write_version(
        root,
        "1.17.1-forge",
        &json!({
            "id": "1.17.1-forge",
            "inheritsFrom": "1.17.1",
            "mainClass": "cpw.mods.modlauncher.Launcher",
            "libraries": [
                { "name": "net.minecraftforge:forge:1.17.1-37.0.50" },
                { "name": "cpw.mods:modlauncher:9.0.7" }
            ]
        }),
    );
    Engine::with_fetcher(config(root), Arc::new(MemoryFetcher::default()))
}

fn installed() -> StaticRuntimes {
    StaticRuntimes(vec![
        JavaRuntime::new("/usr/lib/jvm/java-8/bin/java", "1.8.0_292"),
        JavaRuntime::new("/usr/lib/jvm/java-16/bin/java", "16.0.2"),
        JavaRuntime::new("/usr/lib/jvm/java-17/bin/java", "17.0.1"),
    ])
}

#[test]
fn inherited_version_merges_parent_first() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_forge(dir.path());

    let resolved = engine.resolve("1.17.1-forge").unwrap();
    assert_eq!(resolved.id, "1.17.1-forge");
    assert_eq!(resolved.inherits_from, None);
    assert_eq!(resolved.jar_name(), "1.17.1");
    assert_eq!(resolved.main_class.as_deref(), Some("cpw.mods.modlauncher.Launcher"));
    assert_eq!(resolved.assets.as_deref(), Some("1.17"));

    let names: Vec<String> = resolved.libraries.iter().map(|lib| lib.name()).collect();
    assert_eq!(
        names,
        [
            "com.mojang:brigadier:1.0.18",
            "org.lwjgl:lwjgl:3.2.2",
            "net.minecraftforge:forge:1.17.1-37.0.50",
            "cpw.mods:modlauncher:9.0.7",
        ]
    );

    let analyzer = LibraryAnalyzer::analyze(&resolved).unwrap();
    assert!(analyzer.has(LoaderKind::Forge));
    assert!(analyzer.is_modded());
    assert_eq!(analyzer.version(LoaderKind::Forge), Some("1.17.1-37.0.50"));

    let vanilla = analyzer.remove_library(LoaderKind::Forge);
    assert!(vanilla.libraries.iter().all(|lib| !lib.is("net.minecraftforge", "forge")));
    assert_eq!(vanilla.libraries.len(), 3);
}

#[test]
fn old_forge_prefers_java_16() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_forge(dir.path());

    let forge = engine.select_java_runtime("1.17.1-forge", &installed()).unwrap();
    assert_eq!(forge.runtime().unwrap().version, VersionNumber::new("16.0.2"));

    let vanilla = engine.select_java_runtime("1.17.1", &installed()).unwrap();
    assert_eq!(vanilla.runtime().unwrap().version, VersionNumber::new("17.0.1"));
}

#[test]
fn no_runtime_new_enough() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_forge(dir.path());

    let only_java_8 = StaticRuntimes(vec![JavaRuntime::new("/opt/java8/bin/java", "1.8.0_292")]);
    let selection = engine.select_java_runtime("1.17.1", &only_java_8).unwrap();
    match selection {
        JavaSelection::NotFound { ranges } => {
            assert!(ranges.mandatory.contains(&VersionNumber::new("16")));
            assert!(!ranges.mandatory.contains(&VersionNumber::new("1.8.0_292")));
        }
        JavaSelection::Found(runtime) => panic!("unexpected {:?}", runtime),
    }
}

#[test]
fn newest_suggested_then_mandatory_fallback() {
    let ranges = JavaRanges {
        mandatory: Range::half_open(VersionNumber::new("8"), VersionNumber::new("16")),
        suggested: Range::half_open(VersionNumber::new("8"), VersionNumber::new("11")),
    };
    let runtimes = |versions: &[&str]| -> Vec<JavaRuntime> {
        versions
            .iter()
            .map(|v| JavaRuntime::new(format!("/jdk/{}/bin/java", v), v))
            .collect()
    };

    let picked = select_from(&ranges, &runtimes(&["8", "9", "11", "16"]));
    assert_eq!(picked.runtime().unwrap().version, VersionNumber::new("9"));

    let picked = select_from(&ranges, &runtimes(&["16", "8"]));
    assert_eq!(picked.runtime().unwrap().version, VersionNumber::new("8"));
}

#[test]
fn missing_parent_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_version(
        dir.path(),
        "orphan",
        &json!({ "id": "orphan", "inheritsFrom": "1.12.2" }),
    );
    let engine = Engine::with_fetcher(config(dir.path()), Arc::new(MemoryFetcher::default()));

    assert!(matches!(
        engine.resolve("orphan"),
        Err(LauncherError::VersionNotFound(id)) if id == "1.12.2"
    ));
}

#[test]
fn refresh_picks_up_changes_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_forge(dir.path());
    assert_eq!(engine.resolve("1.17.1").unwrap().libraries.len(), 2);

    write_version(
        dir.path(),
        "1.17.1",
        &json!({
            "id": "1.17.1",
            "libraries": [{ "name": "com.mojang:brigadier:1.0.18" }]
        }),
    );
    // Still memoized.
    assert_eq!(engine.resolve("1.17.1").unwrap().libraries.len(), 2);

    engine.repository().refresh();
    assert_eq!(engine.resolve("1.17.1").unwrap().libraries.len(), 1);
    assert_eq!(engine.resolve("1.17.1-forge").unwrap().libraries.len(), 3);
}
