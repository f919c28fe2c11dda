// ─── Java Runtime Selection ───

mod constraint;
mod range;
mod runtime;
mod version_number;

pub use constraint::{
    find_suitable_java_ranges, find_suitable_java_ranges_with, ConstraintKind, JavaConstraint, JavaRanges,
};
pub use range::{Bound, Range};
pub use runtime::{
    default_runtimes_dir, parse_major_version, select_from, select_java_runtime, DetectedRuntimes,
    InstalledRuntimes, JavaRuntime, JavaSelection, StaticRuntimes,
};
pub use version_number::VersionNumber;
