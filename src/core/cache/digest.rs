use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl HashAlgorithm {
    /// Directory name under the cache root.
    pub fn dir_name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        }
    }

    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Content identity independent of file name: `(hash, algorithm)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachedArtifact {
    pub hash: String,
    pub algorithm: HashAlgorithm,
}

impl CachedArtifact {
    pub fn sha1(hash: impl AsRef<str>) -> Self {
        Self::new(hash, HashAlgorithm::Sha1)
    }

    pub fn new(hash: impl AsRef<str>, algorithm: HashAlgorithm) -> Self {
        Self {
            hash: hash.as_ref().to_ascii_lowercase(),
            algorithm,
        }
    }

    /// A well-formed lowercase hex digest of the algorithm's length.
    pub fn is_well_formed(&self) -> bool {
        self.hash.len() == self.algorithm.hex_len()
            && self.hash.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

pub fn digest_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
    }
}

/// Stream `path` through the hasher.
pub fn digest_file(algorithm: HashAlgorithm, path: &Path) -> LauncherResult<String> {
    let file = std::fs::File::open(path).map_err(|e| LauncherError::io(path, e))?;
    match algorithm {
        HashAlgorithm::Sha1 => stream_digest::<Sha1>(file, path),
        HashAlgorithm::Sha256 => stream_digest::<Sha256>(file, path),
    }
}

fn stream_digest<D: Digest>(mut reader: impl Read, path: &Path) -> LauncherResult<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| LauncherError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
