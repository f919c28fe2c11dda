mod checksums;
mod digest;
mod index;
mod repository;

pub use checksums::{checksums_valid, checksums_valid_as};
pub use digest::{digest_bytes, digest_file, CachedArtifact, HashAlgorithm};
pub use index::{CacheIndex, IndexKind, LibraryIndexEntry};
pub use repository::{CacheLookup, CacheRepository};
