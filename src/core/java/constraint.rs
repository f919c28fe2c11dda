// ─── Java Version Constraints ───
// Which Java a game version needs (mandatory) or runs best on (suggested).
// Every applicable rule narrows the suggested range; mandatory rules also
// narrow the mandatory one.

use std::fmt;

use tracing::debug;

use crate::core::loaders::{LibraryAnalyzer, LoaderKind};
use crate::core::version::VersionDescriptor;

use super::range::Range;
use super::version_number::VersionNumber;

const LAUNCH_WRAPPER_MAIN: &str = "net.minecraft.launchwrapper.Launch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Mandatory,
    Suggested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaConstraint {
    /// Minecraft 1.17+ needs Java 16.
    VanillaJava16,
    /// Minecraft 1.18+ needs Java 17.
    VanillaJava17,
    /// 1.17.1 with Forge before 37.0.60 breaks on Java 17.
    ModdedJava16,
    /// Minecraft 1.13+ needs Java 8.
    VanillaJava8,
    /// 1.7.10+ runs well on Java 8.
    ModdedJava8,
    /// Forge on 1.7.2 and older wants Java 7.
    ModdedJava7,
    /// LaunchWrapper before 1.13 assumes the system class loader is a URLClassLoader.
    LaunchWrapper,
    /// 1.13+ may crash generating worlds before 1.8.0_51.
    VanillaJava8Update51,
    /// `javaVersion.majorVersion` recorded in the game JSON.
    GameJson,
    /// Minecraft 1.20.5+ needs Java 21.
    VanillaJava21,
}

impl JavaConstraint {
    pub const ALL: [JavaConstraint; 10] = [
        JavaConstraint::VanillaJava16,
        JavaConstraint::VanillaJava17,
        JavaConstraint::ModdedJava16,
        JavaConstraint::VanillaJava8,
        JavaConstraint::ModdedJava8,
        JavaConstraint::ModdedJava7,
        JavaConstraint::LaunchWrapper,
        JavaConstraint::VanillaJava8Update51,
        JavaConstraint::GameJson,
        JavaConstraint::VanillaJava21,
    ];

    pub fn kind(self) -> ConstraintKind {
        match self {
            JavaConstraint::ModdedJava16
            | JavaConstraint::ModdedJava8
            | JavaConstraint::ModdedJava7
            | JavaConstraint::VanillaJava8Update51 => ConstraintKind::Suggested,
            _ => ConstraintKind::Mandatory,
        }
    }

    pub fn game_range(self) -> Range<VersionNumber> {
        match self {
            JavaConstraint::VanillaJava16 => at_least("1.17"),
            JavaConstraint::VanillaJava17 => at_least("1.18"),
            JavaConstraint::ModdedJava16 => Range::is(v("1.17.1")),
            JavaConstraint::VanillaJava8 | JavaConstraint::VanillaJava8Update51 => at_least("1.13"),
            JavaConstraint::ModdedJava8 => at_least("1.7.10"),
            JavaConstraint::ModdedJava7 => Range::at_most(v("1.7.2")),
            JavaConstraint::LaunchWrapper => Range::at_most(v("1.12.999")),
            JavaConstraint::GameJson => Range::all(),
            JavaConstraint::VanillaJava21 => at_least("1.20.5"),
        }
    }

    /// Acceptable Java versions when this rule applies to `version`.
    pub fn java_range(self, version: Option<&VersionDescriptor>) -> Range<VersionNumber> {
        match self {
            JavaConstraint::VanillaJava16 => at_least("16"),
            JavaConstraint::VanillaJava17 => at_least("17"),
            JavaConstraint::ModdedJava16 => Range::between(v("16"), v("16.999")),
            JavaConstraint::VanillaJava8 | JavaConstraint::ModdedJava8 => at_least("1.8"),
            JavaConstraint::ModdedJava7 => Range::at_most(v("1.7.999")),
            JavaConstraint::LaunchWrapper => Range::at_most(v("1.8.999")),
            JavaConstraint::VanillaJava8Update51 => at_least("1.8.0_51"),
            JavaConstraint::GameJson => match version.and_then(|v| v.java_version.as_ref()) {
                // Java 8 and older report themselves as `1.<major>`.
                Some(java) if java.major_version >= 9 => at_least(&java.major_version.to_string()),
                Some(java) => at_least(&format!("1.{}", java.major_version)),
                None => Range::all(),
            },
            JavaConstraint::VanillaJava21 => at_least("21"),
        }
    }

    /// Game version in range and any extra condition on the descriptor holds.
    pub fn applies_to(self, game_version: &VersionNumber, version: Option<&VersionDescriptor>) -> bool {
        if !self.game_range().contains(game_version) {
            return false;
        }
        match self {
            JavaConstraint::ModdedJava16 => version
                .and_then(|version| forge_patch_version(version, game_version))
                .is_some_and(|forge| forge < v("37.0.60")),
            JavaConstraint::ModdedJava7 => version
                .and_then(|version| LibraryAnalyzer::analyze(version).ok())
                .is_some_and(|analyzer| analyzer.has(LoaderKind::Forge)),
            JavaConstraint::LaunchWrapper => version.is_some_and(|version| {
                version.main_class.as_deref() == Some(LAUNCH_WRAPPER_MAIN)
                    && version
                        .libraries
                        .iter()
                        .filter(|lib| lib.artifact.artifact_id == "launchwrapper")
                        .any(|lib| v(&lib.artifact.version) < v("1.13"))
            }),
            JavaConstraint::GameJson => version.is_some_and(|version| {
                *game_version >= v("1.7.10") && version.java_version.is_some()
            }),
            _ => true,
        }
    }
}

impl fmt::Display for JavaConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Accumulated Java ranges for one game version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRanges {
    pub mandatory: Range<VersionNumber>,
    pub suggested: Range<VersionNumber>,
}

/// Intersect every applicable rule of `rules` into the mandatory and suggested ranges.
pub fn find_suitable_java_ranges_with(
    rules: &[JavaConstraint],
    game_version: &VersionNumber,
    version: Option<&VersionDescriptor>,
) -> JavaRanges {
    let mut mandatory = Range::all();
    let mut suggested = Range::all();
    for rule in rules {
        if !rule.applies_to(game_version, version) {
            continue;
        }
        let java = rule.java_range(version);
        debug!("Java rule {} applies to {}: {}", rule, game_version, java);
        suggested = suggested.intersect(&java);
        if rule.kind() == ConstraintKind::Mandatory {
            mandatory = mandatory.intersect(&java);
        }
    }
    JavaRanges { mandatory, suggested }
}

pub fn find_suitable_java_ranges(game_version: &VersionNumber, version: Option<&VersionDescriptor>) -> JavaRanges {
    find_suitable_java_ranges_with(&JavaConstraint::ALL, game_version, version)
}

fn forge_patch_version(version: &VersionDescriptor, game_version: &VersionNumber) -> Option<VersionNumber> {
    let analyzer = LibraryAnalyzer::analyze(version).ok()?;
    let patch = analyzer.patch_version(LoaderKind::Forge)?;
    let prefix = format!("{}-", game_version);
    Some(v(patch.strip_prefix(&prefix).unwrap_or(&patch)))
}

fn v(s: &str) -> VersionNumber {
    VersionNumber::new(s)
}

fn at_least(s: &str) -> Range<VersionNumber> {
    Range::at_least(v(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::maven::MavenArtifact;
    use crate::core::version::{JavaVersionInfo, Library};

    fn game(s: &str) -> VersionNumber {
        VersionNumber::new(s)
    }

    fn with_libraries(id: &str, coords: &[&str]) -> VersionDescriptor {
        let mut version = VersionDescriptor::new(id);
        version.libraries = coords
            .iter()
            .map(|c| Library::new(MavenArtifact::parse(c).unwrap()))
            .collect();
        version
    }

    #[test]
    fn vanilla_1_18_needs_java_17() {
        let ranges = find_suitable_java_ranges(&game("1.18.2"), None);
        assert!(!ranges.mandatory.contains(&v("16.0.2")));
        assert!(ranges.mandatory.contains(&v("17.0.1")));
    }

    #[test]
    fn old_forge_on_1_17_1_suggests_java_16() {
        let version = with_libraries("1.17.1-forge", &["net.minecraftforge:forge:1.17.1-37.0.50"]);
        let ranges = find_suitable_java_ranges(&game("1.17.1"), Some(&version));
        assert!(ranges.suggested.contains(&v("16.0.2")));
        assert!(!ranges.suggested.contains(&v("17.0.1")));
        // Still allowed, just not preferred.
        assert!(ranges.mandatory.contains(&v("17.0.1")));

        let newer = with_libraries("1.17.1-forge", &["net.minecraftforge:forge:1.17.1-37.0.70"]);
        let ranges = find_suitable_java_ranges(&game("1.17.1"), Some(&newer));
        assert!(ranges.suggested.contains(&v("17.0.1")));
    }

    #[test]
    fn launch_wrapper_caps_java_at_8() {
        let mut version = with_libraries("1.12.2-forge", &["net.minecraft:launchwrapper:1.12"]);
        version.main_class = Some(LAUNCH_WRAPPER_MAIN.to_string());
        let ranges = find_suitable_java_ranges(&game("1.12.2"), Some(&version));
        assert!(ranges.mandatory.contains(&v("1.8.0_292")));
        assert!(!ranges.mandatory.contains(&v("9.0.4")));
    }

    #[test]
    fn game_json_major_version_is_mandatory() {
        let mut version = VersionDescriptor::new("1.16.5");
        version.java_version = Some(JavaVersionInfo {
            component: Some("jre-legacy".to_string()),
            major_version: 8,
        });
        let ranges = find_suitable_java_ranges(&game("1.16.5"), Some(&version));
        assert!(ranges.mandatory.contains(&v("1.8.0_51")));
        assert!(!ranges.mandatory.contains(&v("1.7.0_80")));
    }
}
