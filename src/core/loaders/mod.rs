mod analyzer;

pub use analyzer::{LibraryAnalyzer, LoaderKind, LoaderMatch};
