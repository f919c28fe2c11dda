mod arguments;
mod descriptor;
mod library;
mod resolver;
pub mod rules;

pub use arguments::{default_jvm_arguments, Argument, ArgumentValue, Arguments};
pub use descriptor::{
    AssetIndexInfo, DownloadInfo, DownloadType, JavaVersionInfo, LoggingFile, LoggingInfo,
    VersionDescriptor,
};
pub use library::{ExtractRules, Library, LibraryDownload, LibraryDownloadInfo, LibraryDownloads};
pub use resolver::{resolve, ResolveOptions, ResolvedVersion, VersionProvider};
pub use rules::{CompatibilityRule, FeatureSet, OsRule, RuleAction};
