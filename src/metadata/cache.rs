//! The process-wide store of metadata references.
//!
//! [`ReferenceCache`] maps module identities to the [`MetadataReference`] materialized for
//! them. Entries are created lazily on first request, exactly once per identity, and are never
//! evicted or replaced: modules are immutable and stay loaded for the lifetime of the process,
//! so the cache grows monotonically.
//!
//! Instead of ambient global state, the cache is an ordinary value. A host creates one per
//! process (or per isolated test) and passes it by reference to every component that resolves
//! references.
//!
//! # Thread Safety
//!
//! Every identity owns a slot, created atomically through a [`DashMap`] entry. The map lock
//! is released before the slot is filled, so materialization (host callbacks, file mapping)
//! never runs under it. Concurrent requests for the same identity serialize on the slot: the
//! first caller materializes, all others observe its result. Requests for other identities,
//! including ones made from inside a host callback, are never blocked by a materialization
//! in progress.
//!
//! # Examples
//!
//! ```rust,no_run
//! use metaref::{ReferenceCache, StaticRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(StaticRegistry::new());
//! let cache = ReferenceCache::new(registry);
//!
//! // Everything currently loaded, e.g. for a script compiled against the host itself
//! let references = cache.get_all_for_process()?;
//! println!("{} references", references.len());
//! # Ok::<(), metaref::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::trace;

use crate::{
    metadata::{
        extractor::MetadataExtractor,
        identity::ModuleIdentity,
        module::LoadedModule,
        reference::MetadataReference,
        registry::ModuleRegistry,
    },
    Result,
};

type Slot = Arc<OnceCell<MetadataReference>>;

/// Concurrency-safe identity → [`MetadataReference`] store.
pub struct ReferenceCache {
    registry: Arc<dyn ModuleRegistry>,
    extractor: MetadataExtractor,
    entries: DashMap<ModuleIdentity, Slot>,
    materializations: AtomicUsize,
}

impl ReferenceCache {
    /// Creates an empty cache over `registry`.
    pub fn new(registry: Arc<dyn ModuleRegistry>) -> Self {
        ReferenceCache {
            registry,
            extractor: MetadataExtractor,
            entries: DashMap::new(),
            materializations: AtomicUsize::new(0),
        }
    }

    /// Returns the reference for `module`, materializing it on first request.
    ///
    /// Cache hits perform no I/O. On a miss the module's metadata is materialized once, so
    /// every concurrent caller for the same identity receives the same handle
    /// ([`MetadataReference::ptr_eq`]). The module's callbacks may use this cache for other
    /// identities, but must not request their own identity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extraction`] if the module has no metadata source. Nothing is
    /// cached in that case.
    pub fn get(&self, module: &dyn LoadedModule) -> Result<MetadataReference> {
        let identity = module.identity();

        if let Some(existing) = self.lookup(identity) {
            trace!(%identity, "reference cache hit");
            return Ok(existing);
        }

        let slot: Slot = self.entries.entry(identity.clone()).or_default().value().clone();

        let result = slot.get_or_try_init(|| -> Result<MetadataReference> {
            let reference = self.extractor.materialize(module)?;
            self.materializations.fetch_add(1, Ordering::Relaxed);
            Ok(reference)
        });

        match result {
            Ok(reference) => Ok(reference.clone()),
            Err(error) => {
                self.entries.remove_if(identity, |_, current| {
                    Arc::ptr_eq(current, &slot) && current.get().is_none()
                });
                Err(error)
            }
        }
    }

    /// Returns one reference for every module the registry currently reports, in registry
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extraction`] if any reported module has no metadata source.
    pub fn get_all_for_process(&self) -> Result<Vec<MetadataReference>> {
        self.registry
            .modules()
            .iter()
            .map(|module| self.get(module.as_ref()))
            .collect()
    }

    /// Returns the cached reference for `identity` without materializing anything.
    #[must_use]
    pub fn lookup(&self, identity: &ModuleIdentity) -> Option<MetadataReference> {
        self.entries
            .get(identity)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Returns `true` if a reference for `identity` has been materialized.
    #[must_use]
    pub fn contains(&self, identity: &ModuleIdentity) -> bool {
        self.lookup(identity).is_some()
    }

    /// Number of cached references.
    ///
    /// Materializations still in progress are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    /// Returns `true` if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful materializations since the cache was created.
    ///
    /// Equals [`len`](ReferenceCache::len); a larger value would mean a reference was
    /// materialized twice.
    #[must_use]
    pub fn materializations(&self) -> usize {
        self.materializations.load(Ordering::Relaxed)
    }

    /// The registry this cache enumerates and loads modules from.
    #[must_use]
    pub fn registry(&self) -> &dyn ModuleRegistry {
        self.registry.as_ref()
    }
}
