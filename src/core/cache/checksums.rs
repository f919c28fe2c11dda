// ─── Checksum Lists ───
// Secondary integrity scheme for libraries that ship `checksums[]` instead of
// a single `sha1`: either the file itself hashes to a listed value, or (for
// jars) its embedded `checksums.sha1` manifest does and every entry matches.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

use super::digest::{digest_bytes, HashAlgorithm};

const MANIFEST_ENTRY: &str = "checksums.sha1";
/// Upper bound on buffer space reserved from an entry's declared size.
const MAX_ENTRY_PREALLOCATION: u64 = 64 * 1024;

/// An empty list accepts anything. The jar manifest is consulted for `.jar` paths.
pub fn checksums_valid(path: &Path, checksums: &[String]) -> LauncherResult<bool> {
    let is_jar = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("jar"))
        .unwrap_or(false);
    checksums_valid_as(path, checksums, is_jar)
}

/// Same as [`checksums_valid`] for files whose name says nothing about their
/// type, such as content-addressed blobs.
pub fn checksums_valid_as(path: &Path, checksums: &[String], is_jar: bool) -> LauncherResult<bool> {
    if checksums.is_empty() {
        return Ok(true);
    }

    let data = std::fs::read(path).map_err(|e| LauncherError::io(path, e))?;
    if contains_hash(checksums, &digest_bytes(HashAlgorithm::Sha1, &data)) {
        return Ok(true);
    }

    if !is_jar {
        return Ok(false);
    }

    match validate_jar(&data, checksums) {
        Ok(valid) => Ok(valid),
        Err(e) => {
            warn!("Unable to inspect {:?} as a jar: {}", path, e);
            Ok(false)
        }
    }
}

fn validate_jar(data: &[u8], checksums: &[String]) -> LauncherResult<bool> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut files: HashMap<String, String> = HashMap::new();
    let mut manifest: Option<String> = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let mut bytes = entry_buffer(entry.size());
        entry.read_to_end(&mut bytes)?;
        if entry.name() == MANIFEST_ENTRY {
            manifest = Some(String::from_utf8_lossy(&bytes).into_owned());
        }
        files.insert(entry.name().to_string(), digest_bytes(HashAlgorithm::Sha1, &bytes));
    }

    let Some(manifest) = manifest else {
        return Ok(false);
    };
    let manifest_valid = files
        .get(MANIFEST_ENTRY)
        .map(|hash| contains_hash(checksums, hash))
        .unwrap_or(false);
    if !manifest_valid {
        return Ok(false);
    }

    for line in manifest.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let Some((expected, target)) = line.split_once(' ') else {
            continue;
        };
        match files.get(target) {
            None => {
                warn!("Jar entry {} listed in {} is missing", target, MANIFEST_ENTRY);
                return Ok(false);
            }
            Some(actual) if !actual.eq_ignore_ascii_case(expected) => {
                warn!("Jar entry {} hashes to {}, expected {}", target, actual, expected);
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}

/// The declared size comes from the archive header and is not trusted.
fn entry_buffer(declared_size: u64) -> Vec<u8> {
    Vec::with_capacity(declared_size.min(MAX_ENTRY_PREALLOCATION) as usize)
}

fn contains_hash(checksums: &[String], hash: &str) -> bool {
    checksums.iter().any(|c| c.eq_ignore_ascii_case(hash))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Build a jar holding `entries` plus a `checksums.sha1` manifest for them.
    pub(crate) fn jar_with_manifest(entries: &[(&str, &[u8])], tamper: bool) -> (Vec<u8>, String) {
        let mut manifest = String::new();
        for (name, bytes) in entries {
            let hash = if tamper {
                "0".repeat(40)
            } else {
                digest_bytes(HashAlgorithm::Sha1, bytes)
            };
            manifest.push_str(&format!("{} {}\n", hash, name));
        }

        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, bytes) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            writer.start_file(MANIFEST_ENTRY, options).unwrap();
            writer.write_all(manifest.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        let manifest_hash = digest_bytes(HashAlgorithm::Sha1, manifest.as_bytes());
        (buf.into_inner(), manifest_hash)
    }

    #[test]
    fn declared_entry_size_only_bounds_preallocation() {
        assert!(entry_buffer(u64::MAX).capacity() < 1 << 20);
        assert!(entry_buffer(512).capacity() >= 512);
    }

    #[test]
    fn whole_file_hash_in_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.zip");
        std::fs::write(&path, b"payload").unwrap();

        let good = vec![digest_bytes(HashAlgorithm::Sha1, b"payload")];
        assert!(checksums_valid(&path, &good).unwrap());
        assert!(!checksums_valid(&path, &["0".repeat(40)]).unwrap());
        assert!(checksums_valid(&path, &[]).unwrap());
    }

    #[test]
    fn embedded_manifest_validates_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forge-universal.jar");
        let (jar, manifest_hash) =
            jar_with_manifest(&[("net/minecraftforge/Forge.class", &b"\xca\xfe\xba\xbe"[..])], false);
        std::fs::write(&path, jar).unwrap();

        assert!(checksums_valid(&path, &[manifest_hash]).unwrap());
        assert!(!checksums_valid(&path, &["f".repeat(40)]).unwrap());
    }

    #[test]
    fn tampered_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forge-universal.jar");
        let (jar, manifest_hash) =
            jar_with_manifest(&[("net/minecraftforge/Forge.class", &b"\xca\xfe\xba\xbe"[..])], true);
        std::fs::write(&path, jar).unwrap();

        assert!(!checksums_valid(&path, &[manifest_hash]).unwrap());
    }
}
