//! The resolver policy handed to the compiler.
//!
//! A compiler that finds a reference it cannot resolve asks a [`MetadataReferenceResolver`]
//! for help. References are computed up front by the [`crate::DependencyWalker`], so the
//! policy installed here refuses every such request: nothing is resolved by path, nothing is
//! resolved on demand.
//!
//! Compilers cache resolvers by equality. [`ResolverPolicy`] therefore compares by instance:
//! two policies are equal only if they are the same object.

use std::{
    hash::{Hash, Hasher},
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::metadata::{identity::ModuleIdentity, reference::MetadataReference};

static NEXT_POLICY_ID: AtomicU64 = AtomicU64::new(0);

/// Hooks a compiler invokes for references it could not resolve itself.
pub trait MetadataReferenceResolver: Send + Sync {
    /// Resolves a reference given by path or name, relative to `base_path`.
    fn resolve_reference(&self, reference: &str, base_path: Option<&Path>)
        -> Vec<MetadataReference>;

    /// Resolves `missing`, referenced from `definition` but absent from the compilation.
    fn resolve_missing_assembly(
        &self,
        definition: &MetadataReference,
        missing: &ModuleIdentity,
    ) -> Option<MetadataReference>;

    /// Whether the compiler should call
    /// [`resolve_missing_assembly`](MetadataReferenceResolver::resolve_missing_assembly) at all.
    fn resolve_missing_assemblies(&self) -> bool;
}

/// A resolver that refuses everything.
///
/// # Examples
///
/// ```rust
/// use metaref::{MetadataReferenceResolver, ResolverPolicy};
///
/// let policy = ResolverPolicy::new();
///
/// assert!(policy.resolve_reference("System.Xml.dll", None).is_empty());
/// assert!(!policy.resolve_missing_assemblies());
/// assert_ne!(policy, ResolverPolicy::new());
/// ```
#[derive(Debug)]
pub struct ResolverPolicy {
    id: u64,
}

impl ResolverPolicy {
    /// Missing assemblies are never resolved on demand.
    pub const RESOLVE_MISSING_ASSEMBLIES: bool = false;

    /// Creates a policy instance, distinct from every other one.
    #[must_use]
    pub fn new() -> Self {
        ResolverPolicy {
            id: NEXT_POLICY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReferenceResolver for ResolverPolicy {
    fn resolve_reference(
        &self,
        _reference: &str,
        _base_path: Option<&Path>,
    ) -> Vec<MetadataReference> {
        Vec::new()
    }

    fn resolve_missing_assembly(
        &self,
        _definition: &MetadataReference,
        _missing: &ModuleIdentity,
    ) -> Option<MetadataReference> {
        None
    }

    fn resolve_missing_assemblies(&self) -> bool {
        Self::RESOLVE_MISSING_ASSEMBLIES
    }
}

impl PartialEq for ResolverPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResolverPolicy {}

impl Hash for ResolverPolicy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
