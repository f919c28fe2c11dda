use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::error::LauncherResult;
use crate::core::version::ResolvedVersion;

use super::constraint::{find_suitable_java_ranges, JavaRanges};
use super::range::Range;
use super::version_number::VersionNumber;

const APP_DIR_NAME: &str = "InterfaceOficial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaRuntime {
    pub path: PathBuf,
    pub version: VersionNumber,
    pub major: u32,
    pub is_64bit: bool,
    pub vendor: String,
}

impl JavaRuntime {
    pub fn new(path: impl Into<PathBuf>, version: &str) -> Self {
        Self {
            path: path.into(),
            version: VersionNumber::new(version),
            major: parse_major_version(version),
            is_64bit: true,
            vendor: "unknown".to_string(),
        }
    }
}

/// Source of the Java runtimes available on this machine.
pub trait InstalledRuntimes: Send + Sync {
    fn runtimes(&self) -> LauncherResult<Vec<JavaRuntime>>;
}

/// A fixed list, for callers that track runtimes themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticRuntimes(pub Vec<JavaRuntime>);

impl InstalledRuntimes for StaticRuntimes {
    fn runtimes(&self) -> LauncherResult<Vec<JavaRuntime>> {
        Ok(self.0.clone())
    }
}

/// Probes `JAVA_HOME`, every `java` on `PATH` and each runtime folder under
/// `runtimes_dir` by running it.
#[derive(Debug, Clone)]
pub struct DetectedRuntimes {
    runtimes_dir: PathBuf,
}

impl Default for DetectedRuntimes {
    fn default() -> Self {
        Self::new(default_runtimes_dir())
    }
}

impl DetectedRuntimes {
    pub fn new(runtimes_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtimes_dir: runtimes_dir.into(),
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(home) = std::env::var_os("JAVA_HOME") {
            candidates.push(PathBuf::from(home).join("bin").join(java_exe()));
        }
        if let Some(path) = std::env::var_os("PATH") {
            candidates.extend(
                std::env::split_paths(&path)
                    .map(|dir| dir.join(java_exe()))
                    .filter(|java| java.is_file()),
            );
        }
        if let Ok(entries) = std::fs::read_dir(&self.runtimes_dir) {
            candidates.extend(
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.is_dir())
                    .map(|root| locate_java_binary(&root)),
            );
        }
        candidates
    }
}

impl InstalledRuntimes for DetectedRuntimes {
    fn runtimes(&self) -> LauncherResult<Vec<JavaRuntime>> {
        let mut found: Vec<JavaRuntime> = Vec::new();
        for candidate in self.candidates() {
            let Some(runtime) = probe::probe_java(&candidate) else {
                continue;
            };
            if found.iter().any(|known| known.path == runtime.path) {
                continue;
            }
            found.push(runtime);
        }
        info!("Detected {} Java runtimes", found.len());
        Ok(found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaSelection {
    Found(JavaRuntime),
    /// Nothing installed satisfies even the mandatory range.
    NotFound { ranges: JavaRanges },
}

impl JavaSelection {
    pub fn runtime(&self) -> Option<&JavaRuntime> {
        match self {
            JavaSelection::Found(runtime) => Some(runtime),
            JavaSelection::NotFound { .. } => None,
        }
    }
}

/// Best installed runtime for `game_version`: the newest in the suggested
/// range, else the newest in the mandatory range. Between equal versions a
/// 64-bit runtime is preferred.
#[instrument(skip(version, installed), fields(version = %version.id))]
pub fn select_java_runtime(
    game_version: &str,
    version: &ResolvedVersion,
    installed: &dyn InstalledRuntimes,
) -> LauncherResult<JavaSelection> {
    let ranges = find_suitable_java_ranges(&VersionNumber::new(game_version), Some(&**version));
    let runtimes = installed.runtimes()?;
    Ok(select_from(&ranges, &runtimes))
}

pub fn select_from(ranges: &JavaRanges, runtimes: &[JavaRuntime]) -> JavaSelection {
    let best = |range: &Range<VersionNumber>| {
        runtimes
            .iter()
            .filter(|runtime| range.contains(&runtime.version))
            // Newest wins; 64-bit breaks ties between equal versions.
            .max_by(|a, b| (&a.version, a.is_64bit).cmp(&(&b.version, b.is_64bit)))
            .cloned()
    };

    if let Some(runtime) = best(&ranges.suggested) {
        debug!("Suggested Java {} at {:?}", runtime.version, runtime.path);
        return JavaSelection::Found(runtime);
    }
    if let Some(runtime) = best(&ranges.mandatory) {
        debug!("Falling back to Java {} at {:?}", runtime.version, runtime.path);
        return JavaSelection::Found(runtime);
    }
    debug!(
        "No Java runtime satisfies {} (suggested {})",
        ranges.mandatory, ranges.suggested
    );
    JavaSelection::NotFound {
        ranges: ranges.clone(),
    }
}

pub fn default_runtimes_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("runtimes")
}

/// `1.8.0_292` → 8, `17.0.2` → 17.
pub fn parse_major_version(version: &str) -> u32 {
    let mut parts = version.split(['.', '_', '-', '+']);
    let first: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    if first == 1 {
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(first)
    } else {
        first
    }
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

fn locate_java_binary(runtime_root: &Path) -> PathBuf {
    let primary = runtime_root.join("bin").join(java_exe());
    if primary.exists() {
        return primary;
    }

    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    if mac_layout.exists() {
        return mac_layout;
    }
    primary
}

mod probe {
    use super::*;

    pub fn probe_java(path: &Path) -> Option<JavaRuntime> {
        let output = Command::new(path)
            .args(["-XshowSettings:properties", "-version"])
            .output()
            .ok()?;

        let text = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        debug!("Probing {:?}: {}", path, text.lines().next().unwrap_or(""));
        parse_output(path, &text)
    }

    pub(super) fn parse_output(path: &Path, text: &str) -> Option<JavaRuntime> {
        let version = parse_version_string(text)?;
        let lower = text.to_ascii_lowercase();
        let is_64bit = lower.contains("sun.arch.data.model = 64")
            || lower.contains("os.arch = amd64")
            || lower.contains("os.arch = x86_64")
            || lower.contains("os.arch = aarch64");

        Some(JavaRuntime {
            path: std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            major: parse_major_version(&version),
            version: VersionNumber::new(&version),
            is_64bit,
            vendor: parse_vendor(text),
        })
    }

    /// First quoted token, e.g. `openjdk version "17.0.2" 2022-01-18`.
    fn parse_version_string(text: &str) -> Option<String> {
        text.lines().find_map(|line| {
            let start = line.find('"')?;
            let end = line[start + 1..].find('"')?;
            Some(line[start + 1..start + 1 + end].to_string())
        })
    }

    fn parse_vendor(text: &str) -> String {
        for vendor in ["Temurin", "Adoptium", "Zulu", "GraalVM", "OpenJDK"] {
            if text.contains(vendor) {
                return vendor.to_string();
            }
        }
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtimes(versions: &[&str]) -> Vec<JavaRuntime> {
        versions
            .iter()
            .map(|v| JavaRuntime::new(format!("/opt/java-{}/bin/java", v), v))
            .collect()
    }

    fn ranges(mandatory: (&str, &str), suggested: (&str, &str)) -> JavaRanges {
        JavaRanges {
            mandatory: Range::half_open(mandatory.0.into(), mandatory.1.into()),
            suggested: Range::half_open(suggested.0.into(), suggested.1.into()),
        }
    }

    #[test]
    fn picks_newest_suggested_runtime() {
        let ranges = ranges(("8", "16"), ("8", "11"));
        let selection = select_from(&ranges, &runtimes(&["8", "9", "11", "16"]));
        assert_eq!(selection.runtime().unwrap().version, VersionNumber::new("9"));
    }

    #[test]
    fn falls_back_to_mandatory_range() {
        let ranges = ranges(("8", "16"), ("9", "11"));
        let selection = select_from(&ranges, &runtimes(&["8", "16"]));
        assert_eq!(selection.runtime().unwrap().version, VersionNumber::new("8"));
    }

    #[test]
    fn reports_not_found() {
        let ranges = ranges(("17", "18"), ("17", "18"));
        assert!(matches!(
            select_from(&ranges, &runtimes(&["8", "11"])),
            JavaSelection::NotFound { .. }
        ));
    }

    #[test]
    fn newest_wins_and_64_bit_breaks_ties() {
        let ranges = ranges(("1.8", "9"), ("1.8", "9"));

        let mut installed = runtimes(&["1.8.0_292", "1.8.0_51"]);
        installed[0].is_64bit = false;
        let selection = select_from(&ranges, &installed);
        assert_eq!(selection.runtime().unwrap().version, VersionNumber::new("1.8.0_292"));

        let mut installed = runtimes(&["1.8.0_292", "1.8.0_292"]);
        installed[0].is_64bit = false;
        installed[1].path = PathBuf::from("/opt/java-8-x64/bin/java");
        let selection = select_from(&ranges, &installed);
        assert_eq!(selection.runtime().unwrap().path, PathBuf::from("/opt/java-8-x64/bin/java"));
    }

    #[test]
    fn major_versions() {
        assert_eq!(parse_major_version("1.8.0_292"), 8);
        assert_eq!(parse_major_version("17.0.2"), 17);
        assert_eq!(parse_major_version("21"), 21);
    }

    #[test]
    fn parses_java_settings_output() {
        let text = "openjdk version \"17.0.2\" 2022-01-18\n\
                    OpenJDK Runtime Environment Temurin-17.0.2+8 (build 17.0.2+8)\n\
                    sun.arch.data.model = 64\n";
        let runtime = probe::parse_output(Path::new("/nonexistent/java"), text).unwrap();
        assert_eq!(runtime.major, 17);
        assert!(runtime.is_64bit);
        assert_eq!(runtime.vendor, "Temurin");
    }
}
