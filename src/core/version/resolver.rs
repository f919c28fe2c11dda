// ─── Version Resolver ───
// Flattens an `inheritsFrom` chain into one independent descriptor.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};

use super::descriptor::VersionDescriptor;

/// Source of raw (unresolved) descriptors by id.
pub trait VersionProvider: Send + Sync {
    /// Fails with [`LauncherError::VersionNotFound`] when `id` is unknown.
    fn get_version(&self, id: &str) -> LauncherResult<Arc<VersionDescriptor>>;
}

impl VersionProvider for HashMap<String, VersionDescriptor> {
    fn get_version(&self, id: &str) -> LauncherResult<Arc<VersionDescriptor>> {
        self.get(id)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Fail on a revisited id instead of truncating the chain.
    pub strict: bool,
}

/// A descriptor with its inheritance chain merged away.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVersion(VersionDescriptor);

impl ResolvedVersion {
    pub fn into_inner(self) -> VersionDescriptor {
        self.0
    }

    /// Wrap a descriptor that already carries no parent.
    pub fn from_independent(version: VersionDescriptor) -> LauncherResult<Self> {
        if !version.is_independent() {
            return Err(LauncherError::NotIndependent(version.id));
        }
        Ok(Self(version))
    }

    /// Merge installer patches on top in ascending priority, producing the
    /// descriptor used for launching and installing.
    pub fn flatten(&self) -> VersionDescriptor {
        let mut patches = self.0.patches.clone();
        patches.sort_by_key(|p| p.priority.unwrap_or(0));

        let mut flat = self.0.with_patches(Vec::new());
        for patch in patches {
            let patch = patch.with_jar(None).with_patches(Vec::new());
            let mut merged = VersionDescriptor::merge(&patch, &flat);
            merged.id = flat.id.clone();
            merged.version = flat.version.clone();
            merged.priority = flat.priority;
            flat = merged;
        }
        flat
    }
}

impl Deref for ResolvedVersion {
    type Target = VersionDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resolve `version` against `provider`, parents first.
#[instrument(skip_all, fields(version = %version.id))]
pub fn resolve(
    version: &VersionDescriptor,
    provider: &dyn VersionProvider,
    options: ResolveOptions,
) -> LauncherResult<ResolvedVersion> {
    let mut visited = Vec::new();
    let mut resolved = resolve_chain(version, provider, options, &mut visited)?;
    resolved.inherits_from = None;
    debug!("Resolved {} through {:?}", resolved.id, visited);
    Ok(ResolvedVersion(resolved))
}

fn resolve_chain(
    version: &VersionDescriptor,
    provider: &dyn VersionProvider,
    options: ResolveOptions,
    visited: &mut Vec<String>,
) -> LauncherResult<VersionDescriptor> {
    if visited.contains(&version.id) {
        let chain = format!("{} -> {}", visited.join(" -> "), version.id);
        if options.strict {
            return Err(LauncherError::CircularInheritance(chain));
        }
        warn!("Found circular inheritance, truncating: {}", chain);
        return Ok(root_of_chain(version));
    }
    visited.push(version.id.clone());

    let Some(parent_id) = version.inherits_from.as_deref() else {
        return Ok(root_of_chain(version));
    };

    let parent = provider.get_version(parent_id)?;
    let parent = resolve_chain(&parent, provider, options, visited)?;
    Ok(VersionDescriptor::merge(version, &parent))
}

/// Top of a chain: no parent, and `jar` defaults to its own id.
fn root_of_chain(version: &VersionDescriptor) -> VersionDescriptor {
    let mut root = version.clone();
    root.inherits_from = None;
    if root.jar.is_none() {
        root.jar = Some(root.id.clone());
    }
    root
}
