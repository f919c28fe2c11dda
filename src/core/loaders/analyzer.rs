// ─── Library Analyzer ───
// Detects which loaders a resolved version carries by matching its libraries
// against known coordinates, and removes a loader's libraries on request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{Library, VersionDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Game,
    Forge,
    NeoForge,
    Fabric,
    Quilt,
    LiteLoader,
    OptiFine,
    BootstrapLauncher,
}

/// Accepted `(group, artifact)` alternatives for one loader.
struct Signature {
    kind: LoaderKind,
    groups: &'static [&'static str],
    artifacts: &'static [&'static str],
}

/// First matching row wins.
const SIGNATURES: &[Signature] = &[
    Signature {
        kind: LoaderKind::Game,
        groups: &["com.mojang"],
        artifacts: &["minecraft"],
    },
    Signature {
        kind: LoaderKind::Forge,
        groups: &["net.minecraftforge"],
        artifacts: &["forge", "fmlloader"],
    },
    Signature {
        kind: LoaderKind::NeoForge,
        groups: &["net.neoforged.fancymodloader", "net.neoforged"],
        artifacts: &["loader", "core", "neoforge"],
    },
    Signature {
        kind: LoaderKind::Fabric,
        groups: &["net.fabricmc"],
        artifacts: &["fabric-loader"],
    },
    Signature {
        kind: LoaderKind::Quilt,
        groups: &["org.quiltmc"],
        artifacts: &["quilt-loader"],
    },
    Signature {
        kind: LoaderKind::LiteLoader,
        groups: &["com.mumfrey"],
        artifacts: &["liteloader"],
    },
    Signature {
        kind: LoaderKind::OptiFine,
        groups: &["optifine", "net.optifine"],
        artifacts: &["optifine", "OptiFine"],
    },
    Signature {
        kind: LoaderKind::BootstrapLauncher,
        groups: &["cpw.mods"],
        artifacts: &["bootstraplauncher"],
    },
];

impl LoaderKind {
    pub const ALL: [LoaderKind; 8] = [
        LoaderKind::Game,
        LoaderKind::Forge,
        LoaderKind::NeoForge,
        LoaderKind::Fabric,
        LoaderKind::Quilt,
        LoaderKind::LiteLoader,
        LoaderKind::OptiFine,
        LoaderKind::BootstrapLauncher,
    ];

    /// Id of the installer patch contributing this loader, if it ships as one.
    pub fn patch_id(self) -> Option<&'static str> {
        match self {
            LoaderKind::Game => Some("game"),
            LoaderKind::Forge => Some("forge"),
            LoaderKind::NeoForge => Some("neoforge"),
            LoaderKind::Fabric => Some("fabric"),
            LoaderKind::Quilt => Some("quilt"),
            LoaderKind::LiteLoader => Some("liteloader"),
            LoaderKind::OptiFine => Some("optifine"),
            LoaderKind::BootstrapLauncher => None,
        }
    }

    pub fn from_patch_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.patch_id() == Some(id))
    }

    /// Loader kind for a library, first signature row wins.
    pub fn classify(library: &Library) -> Option<Self> {
        let artifact = &library.artifact;
        SIGNATURES
            .iter()
            .find(|sig| {
                sig.groups.contains(&artifact.group_id.as_str())
                    && sig.artifacts.contains(&artifact.artifact_id.as_str())
            })
            .map(|sig| sig.kind)
    }

    pub fn matches(self, library: &Library) -> bool {
        Self::classify(library) == Some(self)
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch_id() {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "bootstraplauncher"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderMatch {
    pub library: Option<Library>,
    pub version: Option<String>,
}

pub struct LibraryAnalyzer {
    version: VersionDescriptor,
    matches: BTreeMap<LoaderKind, LoaderMatch>,
}

impl LibraryAnalyzer {
    /// Classify every library of an independent descriptor and its patches.
    pub fn analyze(version: &VersionDescriptor) -> LauncherResult<Self> {
        if !version.is_independent() {
            return Err(LauncherError::NotIndependent(version.id.clone()));
        }

        let mut matches: BTreeMap<LoaderKind, LoaderMatch> = BTreeMap::new();
        let libraries = version
            .libraries
            .iter()
            .chain(version.patches.iter().flat_map(|p| p.libraries.iter()));
        for library in libraries {
            if let Some(kind) = LoaderKind::classify(library) {
                // Later entries win, as on the classpath.
                matches.insert(
                    kind,
                    LoaderMatch {
                        library: Some(library.clone()),
                        version: Some(library.artifact.version.clone()),
                    },
                );
            }
        }

        for patch in &version.patches {
            let Some(kind) = LoaderKind::from_patch_id(&patch.id) else {
                continue;
            };
            let entry = matches.entry(kind).or_insert(LoaderMatch {
                library: None,
                version: None,
            });
            if patch.version.is_some() {
                entry.version = patch.version.clone();
            }
        }

        debug!(
            "Analyzed {}: {:?}",
            version.id,
            matches.keys().collect::<Vec<_>>()
        );
        Ok(Self {
            version: version.clone(),
            matches,
        })
    }

    pub fn has(&self, kind: LoaderKind) -> bool {
        self.matches.contains_key(&kind)
    }

    pub fn get(&self, kind: LoaderKind) -> Option<&LoaderMatch> {
        self.matches.get(&kind)
    }

    pub fn library(&self, kind: LoaderKind) -> Option<&Library> {
        self.matches.get(&kind)?.library.as_ref()
    }

    pub fn version(&self, kind: LoaderKind) -> Option<&str> {
        self.matches.get(&kind)?.version.as_deref()
    }

    pub fn kinds(&self) -> impl Iterator<Item = LoaderKind> + '_ {
        self.matches.keys().copied()
    }

    /// Whether any loader besides the game itself is present.
    pub fn is_modded(&self) -> bool {
        self.matches
            .keys()
            .any(|kind| !matches!(kind, LoaderKind::Game | LoaderKind::BootstrapLauncher))
    }

    /// Last library with these coordinates, base list first then patches.
    pub fn find(&self, group_id: &str, artifact_id: &str) -> Option<&Library> {
        self.version
            .libraries
            .iter()
            .chain(self.version.patches.iter().flat_map(|p| p.libraries.iter()))
            .filter(|lib| lib.is(group_id, artifact_id))
            .last()
    }

    /// Loader version with the `<game>-` prefix installers prepend removed,
    /// e.g. forge `1.17.1-37.0.50` → `37.0.50`.
    pub fn patch_version(&self, kind: LoaderKind) -> Option<String> {
        let version = self.version(kind)?;
        let stripped = self
            .version(LoaderKind::Game)
            .and_then(|game| version.strip_prefix(game))
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(version);
        Some(stripped.to_string())
    }

    /// Copy of the descriptor with every library of `kind` removed from the
    /// base list and from each patch; patches without a match are untouched.
    pub fn remove_library(&self, kind: LoaderKind) -> VersionDescriptor {
        let keep = |lib: &&Library| !kind.matches(lib);
        let patches = self
            .version
            .patches
            .iter()
            .map(|patch| patch.with_libraries(patch.libraries.iter().filter(keep).cloned().collect()))
            .collect();

        self.version
            .with_libraries(self.version.libraries.iter().filter(keep).cloned().collect())
            .with_patches(patches)
    }
}
