//! Dependency resolution for a compilation unit.
//!
//! Given the modules a piece of code is compiled against, [`DependencyWalker`] collects them
//! together with the modules they declare as dependencies, loads each through the
//! [`crate::ModuleRegistry`], and resolves every loaded module through the
//! [`ReferenceCache`]. The result is the deduplicated set of references a compiler needs.
//!
//! Candidates that cannot be loaded are expected in practice (optional dependencies, platform
//! specific modules, version skew) and are dropped without failing the resolution. A module
//! that loads but has no metadata source is a different matter: its
//! [`crate::Error::Extraction`] is propagated.
//!
//! # Examples
//!
//! ```rust
//! use metaref::{DependencyWalker, MetadataBlob, ModuleRc, ReferenceCache, StaticRegistry};
//! use metaref::metadata::module::ModuleImage;
//! use std::sync::Arc;
//!
//! let a = ModuleImage::builder()
//!     .name("ModuleA")
//!     .raw_metadata(MetadataBlob::new(vec![0_u8; 4]))
//!     .dependencies(["ModuleB", "ModuleC"])
//!     .build()?
//!     .into_rc();
//! let b = ModuleImage::builder()
//!     .name("ModuleB")
//!     .raw_metadata(MetadataBlob::new(vec![0_u8; 4]))
//!     .build()?
//!     .into_rc();
//!
//! let registry = Arc::new(StaticRegistry::from_modules([a.clone(), b]));
//! let cache = ReferenceCache::new(registry);
//!
//! // ModuleC is unknown to the registry and silently left out
//! let references = DependencyWalker::new(&cache).resolve(&[a])?;
//! assert_eq!(references.len(), 2);
//! # Ok::<(), metaref::Error>(())
//! ```

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    metadata::{
        cache::ReferenceCache,
        identity::ModuleIdentity,
        module::ModuleRc,
        reference::MetadataReference,
    },
    Result,
};

/// How far the walker follows declared dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyDepth {
    /// The roots and the modules they declare directly.
    #[default]
    Direct,
    /// The roots and everything reachable from them through declared dependencies.
    Transitive,
}

/// Order of the references returned by [`DependencyWalker::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionOrder {
    /// Sorted by canonical identity.
    #[default]
    Lexicographic,
    /// First-seen order: each root followed by its dependencies in declaration order,
    /// breadth-first for transitive walks.
    Discovery,
}

/// Configuration for [`DependencyWalker`].
///
/// The default resolves direct dependencies sequentially and sorts the result by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    /// How far declared dependencies are followed
    pub depth: DependencyDepth,
    /// Order of the returned references
    pub order: ResolutionOrder,
    /// Load and resolve candidates on the rayon thread pool
    pub parallel: bool,
}

impl ResolverConfig {
    /// Roots and their direct dependencies, sequential, sorted.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// The full dependency closure, sequential, sorted.
    #[must_use]
    pub fn transitive() -> Self {
        Self {
            depth: DependencyDepth::Transitive,
            ..Self::default()
        }
    }

    /// Direct dependencies, loaded and resolved in parallel, sorted.
    ///
    /// Worth it when the registry does real I/O on load.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }
}

/// Computes the metadata references for a set of root modules.
pub struct DependencyWalker<'a> {
    cache: &'a ReferenceCache,
    config: ResolverConfig,
}

impl<'a> DependencyWalker<'a> {
    /// Creates a walker with the default [`ResolverConfig`].
    #[must_use]
    pub fn new(cache: &'a ReferenceCache) -> Self {
        Self::with_config(cache, ResolverConfig::default())
    }

    /// Creates a walker with an explicit configuration.
    #[must_use]
    pub fn with_config(cache: &'a ReferenceCache, config: ResolverConfig) -> Self {
        DependencyWalker { cache, config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Resolves `roots` and their dependencies to metadata references.
    ///
    /// Every root identity and every identity a root declares becomes a candidate (with
    /// [`DependencyDepth::Transitive`], so do the declared dependencies of every loaded
    /// candidate). Empty identities are skipped and each distinct identity is loaded once.
    /// Candidates the registry cannot load are dropped. If several candidates load the same
    /// module, its reference appears once.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extraction`] if a loaded module has no metadata source.
    pub fn resolve(&self, roots: &[ModuleRc]) -> Result<Vec<MetadataReference>> {
        let mut requested = HashSet::new();
        let mut pending = Vec::new();
        for root in roots {
            enqueue(&mut requested, &mut pending, root.identity());
            for dependency in root.dependencies() {
                enqueue(&mut requested, &mut pending, &dependency);
            }
        }

        let mut loaded: Vec<ModuleRc> = Vec::new();
        let mut loaded_identities = HashSet::new();
        while !pending.is_empty() {
            let mut next = Vec::new();
            for module in self.load_all(&pending).into_iter().flatten() {
                if !loaded_identities.insert(module.identity().clone()) {
                    continue;
                }

                if self.config.depth == DependencyDepth::Transitive {
                    for dependency in module.dependencies() {
                        enqueue(&mut requested, &mut next, &dependency);
                    }
                }
                loaded.push(module);
            }
            pending = next;
        }

        let mut references = if self.config.parallel {
            loaded
                .par_iter()
                .map(|module| self.cache.get(module.as_ref()))
                .collect::<Result<Vec<_>>>()?
        } else {
            loaded
                .iter()
                .map(|module| self.cache.get(module.as_ref()))
                .collect::<Result<Vec<_>>>()?
        };

        if self.config.order == ResolutionOrder::Lexicographic {
            references.sort_by(|a, b| a.identity().cmp(b.identity()));
        }

        Ok(references)
    }

    /// Loads every candidate, keeping the candidate order. Failed loads yield `None`.
    fn load_all(&self, candidates: &[ModuleIdentity]) -> Vec<Option<ModuleRc>> {
        if self.config.parallel {
            candidates
                .par_iter()
                .map(|identity| self.load(identity))
                .collect()
        } else {
            candidates.iter().map(|identity| self.load(identity)).collect()
        }
    }

    fn load(&self, identity: &ModuleIdentity) -> Option<ModuleRc> {
        match self.cache.registry().load(identity) {
            Ok(module) => Some(module),
            Err(error) => {
                debug!(%identity, %error, "dropping unresolvable dependency");
                None
            }
        }
    }
}

fn enqueue(
    requested: &mut HashSet<ModuleIdentity>,
    pending: &mut Vec<ModuleIdentity>,
    identity: &ModuleIdentity,
) {
    if identity.is_empty() {
        return;
    }

    if requested.insert(identity.clone()) {
        pending.push(identity.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        file::MetadataBlob,
        metadata::{
            identity::{AssemblyName, AssemblyVersion},
            module::ModuleImage,
            registry::StaticRegistry,
        },
        Error,
    };

    fn module(name: &str, dependencies: &[&str]) -> ModuleRc {
        ModuleImage::builder()
            .name(name)
            .raw_metadata(MetadataBlob::new(vec![0_u8; 4]))
            .dependencies(dependencies.iter().copied())
            .build()
            .unwrap()
            .into_rc()
    }

    fn names(references: &[MetadataReference]) -> Vec<&str> {
        references.iter().map(|r| r.identity().as_str()).collect()
    }

    #[test]
    fn unloadable_dependency_is_dropped() {
        let a = module("A", &["B", "C"]);
        let registry = StaticRegistry::from_modules([a.clone(), module("B", &[])]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let references = DependencyWalker::new(&cache).resolve(&[a]).unwrap();

        assert_eq!(names(&references), vec!["A", "B"]);
    }

    #[test]
    fn shared_dependency_appears_once() {
        let a = module("A", &["C"]);
        let b = module("B", &["C"]);
        let registry = StaticRegistry::from_modules([a.clone(), b.clone(), module("C", &[])]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let references = DependencyWalker::new(&cache).resolve(&[a, b]).unwrap();

        assert_eq!(names(&references), vec!["A", "B", "C"]);
        assert_eq!(cache.materializations(), 3);
    }

    #[test]
    fn empty_identities_are_skipped() {
        let a = module("A", &["", "   ", "B"]);
        let registry = StaticRegistry::from_modules([a.clone(), module("B", &[])]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let references = DependencyWalker::new(&cache).resolve(&[a]).unwrap();

        assert_eq!(names(&references), vec!["A", "B"]);
    }

    #[test]
    fn direct_stops_after_declared_dependencies() {
        let a = module("A", &["B"]);
        let registry =
            StaticRegistry::from_modules([a.clone(), module("B", &["C"]), module("C", &[])]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let direct = DependencyWalker::new(&cache).resolve(&[a.clone()]).unwrap();
        assert_eq!(names(&direct), vec!["A", "B"]);

        let transitive = DependencyWalker::with_config(&cache, ResolverConfig::transitive())
            .resolve(&[a])
            .unwrap();
        assert_eq!(names(&transitive), vec!["A", "B", "C"]);
    }

    #[test]
    fn transitive_handles_cycles() {
        let a = module("A", &["B"]);
        let registry = StaticRegistry::from_modules([a.clone(), module("B", &["A"])]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let references = DependencyWalker::with_config(&cache, ResolverConfig::transitive())
            .resolve(&[a])
            .unwrap();

        assert_eq!(names(&references), vec!["A", "B"]);
    }

    #[test]
    fn discovery_order() {
        let z = module("Z", &["M", "B"]);
        let registry = StaticRegistry::from_modules([
            z.clone(),
            module("M", &[]),
            module("B", &[]),
        ]);
        let cache = ReferenceCache::new(Arc::new(registry));
        let config = ResolverConfig {
            order: ResolutionOrder::Discovery,
            ..ResolverConfig::default()
        };

        let references = DependencyWalker::with_config(&cache, config)
            .resolve(&[z.clone()])
            .unwrap();
        assert_eq!(names(&references), vec!["Z", "M", "B"]);

        let sorted = DependencyWalker::new(&cache).resolve(&[z]).unwrap();
        assert_eq!(names(&sorted), vec!["B", "M", "Z"]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let dependencies: Vec<String> = (0..32).map(|i| format!("Dep{i:02}")).collect();
        let dependency_names: Vec<&str> = dependencies.iter().map(String::as_str).collect();
        let root = module("Root", &dependency_names);

        let registry = StaticRegistry::new();
        registry.register(root.clone());
        for name in &dependency_names {
            registry.register(module(name, &[]));
        }
        let cache = ReferenceCache::new(Arc::new(registry));

        let sequential = DependencyWalker::new(&cache).resolve(&[root.clone()]).unwrap();
        let parallel = DependencyWalker::with_config(&cache, ResolverConfig::parallel())
            .resolve(&[root])
            .unwrap();

        assert_eq!(sequential.len(), 33);
        assert!(sequential.iter().zip(&parallel).all(|(s, p)| s.ptr_eq(p)));
        assert_eq!(cache.materializations(), 33);
    }

    #[test]
    fn identities_binding_to_one_module_yield_one_reference() {
        let lib = AssemblyName::new("Lib", AssemblyVersion::new(1, 4, 0, 0));
        let lib_module = ModuleImage::builder()
            .assembly_name(&lib)
            .raw_metadata(MetadataBlob::new(vec![0_u8; 4]))
            .build()
            .unwrap()
            .into_rc();

        let older = AssemblyName::new("Lib", AssemblyVersion::new(1, 0, 0, 0)).identity();
        let app = module("App", &[older.as_str(), lib.identity().as_str()]);

        let registry = StaticRegistry::from_modules([app.clone(), lib_module]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let references = DependencyWalker::new(&cache).resolve(&[app]).unwrap();

        assert_eq!(references.len(), 2);
        assert_eq!(references[1].identity(), &lib.identity());
    }

    #[test]
    fn extraction_failure_propagates() {
        let broken = ModuleImage::builder().name("Broken").build().unwrap().into_rc();
        let registry = StaticRegistry::from_modules([broken.clone()]);
        let cache = ReferenceCache::new(Arc::new(registry));

        let result = DependencyWalker::new(&cache).resolve(&[broken]);

        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn presets() {
        assert_eq!(ResolverConfig::direct(), ResolverConfig::default());
        assert_eq!(ResolverConfig::default().depth, DependencyDepth::Direct);
        assert_eq!(ResolverConfig::default().order, ResolutionOrder::Lexicographic);
        assert!(!ResolverConfig::default().parallel);

        assert_eq!(ResolverConfig::transitive().depth, DependencyDepth::Transitive);
        assert!(ResolverConfig::parallel().parallel);
        assert_eq!(ResolverConfig::parallel().depth, DependencyDepth::Direct);
    }
}
