// ─── Library Entry ───
// One `libraries[]` element of a version descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::maven::MavenArtifact;

use super::rules::{current_os_name, native_arch_bits, CompatibilityRule, FeatureSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(rename = "name")]
    pub artifact: MavenArtifact,
    /// Base URL of the maven repository hosting this library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    /// Secondary integrity scheme used by Forge libraries without `sha1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksums: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<CompatibilityRule>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<LibraryDownloadInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<BTreeMap<String, LibraryDownloadInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryDownloadInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Where a library comes from and what it must hash to, after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDownload {
    /// Path relative to the libraries directory, `/`-separated.
    pub path: String,
    pub url: String,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

impl Library {
    pub fn new(artifact: MavenArtifact) -> Self {
        Self {
            artifact,
            url: None,
            downloads: None,
            checksums: None,
            extract: None,
            natives: None,
            rules: None,
        }
    }

    /// `group:artifact:version`
    pub fn name(&self) -> String {
        self.artifact.name()
    }

    pub fn is_native(&self) -> bool {
        self.natives.is_some()
    }

    /// Identity of a library inside a classpath: coordinates plus the native flag.
    pub fn identity(&self) -> (String, bool) {
        (self.name(), self.is_native())
    }

    pub fn is(&self, group_id: &str, artifact_id: &str) -> bool {
        self.artifact.is(group_id, artifact_id)
    }

    pub fn checksums(&self) -> &[String] {
        self.checksums.as_deref().unwrap_or(&[])
    }

    pub fn applies_to_current_environment(&self) -> bool {
        CompatibilityRule::applies(self.rules.as_deref(), &FeatureSet::new())
    }

    /// Check if this library has native classifiers for the current OS.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let natives = self.natives.as_ref()?;
        natives
            .get(current_os_name())
            .map(|template| template.replace("${arch}", native_arch_bits()))
    }

    /// Explicit classifier, else the native classifier for this platform.
    pub fn classifier(&self) -> Option<String> {
        self.artifact
            .classifier
            .clone()
            .or_else(|| self.native_classifier_for_current_os())
    }

    pub fn with_classifier(&self, classifier: &str) -> Self {
        let mut clone = self.clone();
        clone.artifact = self.artifact.with_classifier(Some(classifier));
        clone
    }

    /// Resolve path, URL and hash, falling back to the maven layout under
    /// `url` (or `default_repository`) when the descriptor omits them.
    pub fn download(&self, default_repository: &str) -> LibraryDownload {
        let classifier = self.classifier();
        let coordinate = self.artifact.with_classifier(classifier.as_deref());

        let declared = self.downloads.as_ref().and_then(|downloads| {
            if self.is_native() {
                let classifier = classifier.as_deref()?;
                downloads.classifiers.as_ref()?.get(classifier)
            } else {
                downloads.artifact.as_ref()
            }
        });

        let path = declared
            .and_then(|info| non_empty(info.path.as_deref()))
            .map(ToString::to_string)
            .unwrap_or_else(|| coordinate.relative_url_path());

        let url = match declared.and_then(|info| non_empty(info.url.as_deref())) {
            Some(url) => url.to_string(),
            None => {
                let base = non_empty(self.url.as_deref()).unwrap_or(default_repository);
                format!("{}/{}", base.trim_end_matches('/'), path)
            }
        };

        LibraryDownload {
            path,
            url,
            sha1: declared.and_then(|info| info.sha1.clone()),
            size: declared.and_then(|info| info.size),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
