// ─── Version Descriptor ───
// Parsed form of `versions/<id>/<id>.json`. Values are immutable: every update
// goes through a `with_*` method that returns a new descriptor.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::arguments::{default_jvm_arguments, Arguments};
use super::library::Library;
use super::rules::{CompatibilityRule, FeatureSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    /// Loader version carried by installer patches (`forge` → `37.0.50`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_rules: Option<Vec<CompatibilityRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<BTreeMap<String, DownloadInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<BTreeMap<String, LoggingInfo>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_launcher_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<VersionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingInfo {
    pub file: LoggingFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingFile {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub major_version: u32,
}

/// Keys of the `downloads` and `logging` maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadType {
    Client,
    Server,
    WindowsServer,
    ClientMappings,
    ServerMappings,
}

impl DownloadType {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadType::Client => "client",
            DownloadType::Server => "server",
            DownloadType::WindowsServer => "windows_server",
            DownloadType::ClientMappings => "client_mappings",
            DownloadType::ServerMappings => "server_mappings",
        }
    }
}

impl VersionDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_independent(&self) -> bool {
        self.inherits_from.is_none()
    }

    /// Merge `child` over `parent`: child scalars win, lists are parent then child.
    pub fn merge(child: &VersionDescriptor, parent: &VersionDescriptor) -> VersionDescriptor {
        VersionDescriptor {
            id: child.id.clone(),
            version: child.version.clone().or_else(|| parent.version.clone()),
            priority: child.priority.or(parent.priority),
            inherits_from: None,
            main_class: child.main_class.clone().or_else(|| parent.main_class.clone()),
            jar: child.jar.clone().or_else(|| parent.jar.clone()),
            asset_index: child.asset_index.clone().or_else(|| parent.asset_index.clone()),
            assets: child.assets.clone().or_else(|| parent.assets.clone()),
            libraries: concat(&parent.libraries, &child.libraries),
            compatibility_rules: merge_optional_lists(
                parent.compatibility_rules.as_ref(),
                child.compatibility_rules.as_ref(),
            ),
            arguments: Arguments::merge(parent.arguments.as_ref(), child.arguments.as_ref()),
            minecraft_arguments: child
                .minecraft_arguments
                .clone()
                .or_else(|| parent.minecraft_arguments.clone()),
            downloads: merge_maps(parent.downloads.as_ref(), child.downloads.as_ref()),
            logging: merge_maps(parent.logging.as_ref(), child.logging.as_ref()),
            release_type: child.release_type.clone().or_else(|| parent.release_type.clone()),
            time: child.time.or(parent.time),
            release_time: child.release_time.or(parent.release_time),
            minimum_launcher_version: child
                .minimum_launcher_version
                .max(parent.minimum_launcher_version),
            java_version: child.java_version.clone().or_else(|| parent.java_version.clone()),
            patches: concat(&parent.patches, &child.patches),
        }
    }

    // ── Views ───────────────────────────────────────────

    /// `jar` if declared, else the descriptor id.
    pub fn jar_name(&self) -> &str {
        self.jar.as_deref().unwrap_or(&self.id)
    }

    pub fn download(&self, kind: DownloadType) -> Option<&DownloadInfo> {
        self.downloads.as_ref()?.get(kind.as_str())
    }

    /// Client jar download, defaulting to `<versions_url>/<jar>/<jar>.jar`.
    pub fn client_download(&self, versions_url: &str) -> DownloadInfo {
        if let Some(info) = self.download(DownloadType::Client) {
            return info.clone();
        }
        let jar = self.jar_name();
        DownloadInfo {
            url: format!("{}/{}/{}.jar", versions_url.trim_end_matches('/'), jar, jar),
            sha1: None,
            size: None,
        }
    }

    /// Asset index reference, defaulting to `<index_url>/<assets or legacy>.json`.
    pub fn asset_index_info(&self, index_url: &str) -> AssetIndexInfo {
        if let Some(info) = &self.asset_index {
            return info.clone();
        }
        let id = self.assets.clone().unwrap_or_else(|| "legacy".to_string());
        AssetIndexInfo {
            url: format!("{}/{}.json", index_url.trim_end_matches('/'), id),
            id,
            sha1: None,
            size: None,
            total_size: None,
        }
    }

    pub fn logging_config(&self, kind: DownloadType) -> Option<&LoggingInfo> {
        self.logging.as_ref()?.get(kind.as_str())
    }

    /// Game arguments, splitting the legacy string form on whitespace.
    pub fn game_arguments(&self, features: &FeatureSet) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.game.is_empty() => args.game_values(features),
            _ => self
                .minecraft_arguments
                .as_deref()
                .map(|s| s.split_whitespace().map(ToString::to_string).collect())
                .unwrap_or_default(),
        }
    }

    pub fn jvm_arguments(&self, features: &FeatureSet) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.jvm.is_empty() => args.jvm_values(features),
            _ => default_jvm_arguments(),
        }
    }

    /// Libraries whose rules allow the current platform.
    pub fn applicable_libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries
            .iter()
            .filter(|lib| lib.applies_to_current_environment())
    }

    pub fn applies_to_current_environment(&self, features: &FeatureSet) -> bool {
        CompatibilityRule::applies(self.compatibility_rules.as_deref(), features)
    }

    // ── Immutable updates ───────────────────────────────

    pub fn with_libraries(&self, libraries: Vec<Library>) -> Self {
        Self {
            libraries,
            ..self.clone()
        }
    }

    pub fn with_jar(&self, jar: Option<String>) -> Self {
        Self {
            jar,
            ..self.clone()
        }
    }

    pub fn with_patches(&self, patches: Vec<VersionDescriptor>) -> Self {
        Self {
            patches,
            ..self.clone()
        }
    }

    /// Add or replace the patch with the same id.
    pub fn with_patch(&self, patch: VersionDescriptor) -> Self {
        let mut patches: Vec<_> = self
            .patches
            .iter()
            .filter(|p| p.id != patch.id)
            .cloned()
            .collect();
        patches.push(patch);
        self.with_patches(patches)
    }

    pub fn without_patch(&self, patch_id: &str) -> Self {
        self.with_patches(
            self.patches
                .iter()
                .filter(|p| p.id != patch_id)
                .cloned()
                .collect(),
        )
    }

    pub fn patch(&self, patch_id: &str) -> Option<&VersionDescriptor> {
        self.patches.iter().find(|p| p.id == patch_id)
    }
}

fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
    first.iter().chain(second).cloned().collect()
}

fn merge_optional_lists<T: Clone>(parent: Option<&Vec<T>>, child: Option<&Vec<T>>) -> Option<Vec<T>> {
    match (parent, child) {
        (None, None) => None,
        (p, c) => Some(concat(
            p.map(Vec::as_slice).unwrap_or(&[]),
            c.map(Vec::as_slice).unwrap_or(&[]),
        )),
    }
}

fn merge_maps<V: Clone>(
    parent: Option<&BTreeMap<String, V>>,
    child: Option<&BTreeMap<String, V>>,
) -> Option<BTreeMap<String, V>> {
    match (parent, child) {
        (None, None) => None,
        (p, c) => {
            let mut merged = p.cloned().unwrap_or_default();
            if let Some(c) = c {
                merged.extend(c.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(merged)
        }
    }
}

/// Installer-written JSON is not always RFC 3339; unparseable stamps become `None`.
fn lenient_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_time))
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: serde_json::Value) -> VersionDescriptor {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn parses_vanilla_json() {
        let v = descriptor(serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "5",
            "assetIndex": {
                "id": "5",
                "sha1": "6a2bd8ea0d1a1d1e7e4bd17d5c17a0b4c6e5a2f1",
                "size": 414150,
                "totalSize": 622046424,
                "url": "https://piston-meta.mojang.com/v1/packages/6a2bd8/5.json"
            },
            "downloads": {
                "client": {
                    "sha1": "0c3ec587af28e5a785c0b4a7b8a30f9a8f78f838",
                    "size": 23028853,
                    "url": "https://piston-data.mojang.com/v1/objects/0c3ec5/client.jar"
                }
            },
            "javaVersion": {"component": "java-runtime-gamma", "majorVersion": 17},
            "minimumLauncherVersion": 21,
            "releaseTime": "2023-06-12T13:25:51+00:00",
            "time": "2023-06-12T13:25:51+00:00",
            "libraries": [{"name": "com.mojang:logging:1.1.1"}]
        }));

        assert_eq!(v.release_type.as_deref(), Some("release"));
        assert_eq!(v.jar_name(), "1.20.1");
        assert_eq!(v.java_version.as_ref().unwrap().major_version, 17);
        assert_eq!(v.asset_index.as_ref().unwrap().total_size, Some(622046424));
        assert!(v.release_time.is_some());
        assert!(v.client_download("https://unused").sha1.is_some());
    }

    #[test]
    fn odd_timestamps_do_not_fail_parsing() {
        let v = descriptor(serde_json::json!({
            "id": "1.7.10-Forge10.13.4.1614",
            "time": "2015-12-16T22:37:58-0500",
            "releaseTime": "not a date"
        }));
        assert!(v.time.is_some());
        assert!(v.release_time.is_none());
    }

    #[test]
    fn defaults_for_missing_download_info() {
        let v = descriptor(serde_json::json!({"id": "b1.7.3"}));

        let client = v.client_download("https://s3.amazonaws.com/Minecraft.Download/versions/");
        assert_eq!(
            client.url,
            "https://s3.amazonaws.com/Minecraft.Download/versions/b1.7.3/b1.7.3.jar"
        );

        let index = v.asset_index_info("https://s3.amazonaws.com/Minecraft.Download/indexes/");
        assert_eq!(index.id, "legacy");
        assert!(index.url.ends_with("/indexes/legacy.json"));
    }

    #[test]
    fn legacy_arguments_split_on_whitespace() {
        let v = descriptor(serde_json::json!({
            "id": "1.8.9",
            "minecraftArguments": "--username ${auth_player_name}  --version ${version_name}"
        }));
        let features = FeatureSet::new();
        assert_eq!(v.game_arguments(&features).len(), 4);
        assert_eq!(v.jvm_arguments(&features), default_jvm_arguments());
    }

    #[test]
    fn merge_prefers_child_and_appends_lists() {
        let parent = descriptor(serde_json::json!({
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "5",
            "minimumLauncherVersion": 21,
            "libraries": [{"name": "a:parent:1"}]
        }));
        let child = descriptor(serde_json::json!({
            "id": "fabric-loader-0.15.7-1.20.1",
            "inheritsFrom": "1.20.1",
            "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
            "minimumLauncherVersion": 0,
            "libraries": [{"name": "a:child:1"}]
        }));

        let merged = VersionDescriptor::merge(&child, &parent);
        assert_eq!(merged.id, "fabric-loader-0.15.7-1.20.1");
        assert_eq!(
            merged.main_class.as_deref(),
            Some("net.fabricmc.loader.impl.launch.knot.KnotClient")
        );
        assert_eq!(merged.assets.as_deref(), Some("5"));
        assert_eq!(merged.minimum_launcher_version, Some(21));
        assert!(merged.inherits_from.is_none());
        let names: Vec<_> = merged.libraries.iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["a:parent:1", "a:child:1"]);
    }

    #[test]
    fn patch_updates_return_new_values() {
        let base = VersionDescriptor::new("1.20.1");
        let mut forge = VersionDescriptor::new("forge");
        forge.priority = Some(30000);

        let patched = base.with_patch(forge.clone());
        assert!(base.patches.is_empty());
        assert_eq!(patched.patches.len(), 1);
        assert!(patched.patch("forge").is_some());
        assert!(patched.without_patch("forge").patches.is_empty());
    }
}
