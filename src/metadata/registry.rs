//! Access to the modules loaded in the host process.
//!
//! The [`ModuleRegistry`] trait is the only way the reference cache and the dependency walker
//! learn about modules. Hosts implement it on top of whatever loader they run; tests and
//! embedders that know their module set up front use [`StaticRegistry`].

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    error::LoadFailureReason,
    metadata::{
        identity::{AssemblyName, ModuleIdentity},
        module::ModuleRc,
    },
    Error, Result,
};

/// Enumerates loaded modules and loads modules by identity.
///
/// Implementations must be thread-safe; the walker may call [`load`](ModuleRegistry::load)
/// from several worker threads at once.
pub trait ModuleRegistry: Send + Sync {
    /// All modules currently loaded, in a stable order.
    fn modules(&self) -> Vec<ModuleRc>;

    /// Loads the module for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LoadFailure`] if the module cannot be provided, whatever the
    /// reason.
    fn load(&self, identity: &ModuleIdentity) -> Result<ModuleRc>;
}

/// A registry over an explicitly registered set of modules.
///
/// [`load`](ModuleRegistry::load) first looks for an exact identity match. Failing that, it
/// binds the request to the registered module with the highest version that
/// [satisfies](AssemblyName::satisfies) the parsed request, which mirrors how a runtime binds
/// an assembly reference to a newer compatible assembly.
///
/// # Examples
///
/// ```rust
/// use metaref::{ModuleRegistry, StaticRegistry};
/// use metaref::metadata::{identity::ModuleIdentity, module::ModuleImage};
///
/// let registry = StaticRegistry::new();
/// registry.register(
///     ModuleImage::builder()
///         .name("Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null")
///         .location("/opt/app/Lib.dll")
///         .build()?
///         .into_rc(),
/// );
///
/// let module = registry.load(&ModuleIdentity::new("Lib, Version=1.0.0.0"))?;
/// assert_eq!(module.identity().simple_name(), "Lib");
/// assert!(registry.load(&ModuleIdentity::new("Lib, Version=2.0.0.0")).is_err());
/// # Ok::<(), metaref::Error>(())
/// ```
pub struct StaticRegistry {
    modules: boxcar::Vec<ModuleRc>,
    by_identity: DashMap<ModuleIdentity, ModuleRc>,
    refused: DashMap<ModuleIdentity, String>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        StaticRegistry {
            modules: boxcar::Vec::new(),
            by_identity: DashMap::new(),
            refused: DashMap::new(),
        }
    }

    /// Creates a registry holding `modules`, in order.
    pub fn from_modules(modules: impl IntoIterator<Item = ModuleRc>) -> Self {
        let registry = Self::new();
        for module in modules {
            registry.register(module);
        }
        registry
    }

    /// Registers a module.
    ///
    /// Returns `false` and leaves the registry unchanged if a module with the same identity is
    /// already registered.
    pub fn register(&self, module: ModuleRc) -> bool {
        match self.by_identity.entry(module.identity().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                // Enumerable before loadable, so `modules()` never misses a loadable module
                self.modules.push(module.clone());
                entry.insert(module);
                true
            }
        }
    }

    /// Makes every future load of `identity` fail with [`LoadFailureReason::Refused`].
    ///
    /// The module stays enumerable through [`modules`](ModuleRegistry::modules); only loading
    /// it is refused, the way a security policy blocks binding to an assembly. Requests that
    /// would bind to it by version are refused too, unless another registered module
    /// satisfies them.
    pub fn refuse(&self, identity: impl Into<ModuleIdentity>, reason: impl Into<String>) {
        self.refused.insert(identity.into(), reason.into());
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.count()
    }

    /// Returns `true` if no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bind(&self, identity: &ModuleIdentity) -> Result<ModuleRc> {
        let not_found = || Error::LoadFailure {
            identity: identity.clone(),
            reason: LoadFailureReason::NotFound,
        };

        let Ok(required) = identity.parse() else {
            return Err(not_found());
        };

        let mut best: Option<(AssemblyName, &ModuleRc)> = None;
        let mut closest: Option<(AssemblyName, &ModuleRc)> = None;
        let mut refused: Option<String> = None;

        for (_, module) in self.modules.iter() {
            let Ok(candidate) = module.identity().parse() else {
                continue;
            };

            if !candidate.name.eq_ignore_ascii_case(&required.name) {
                continue;
            }

            let satisfies = candidate.satisfies(&required);
            if let Some(reason) = self.refused.get(module.identity()) {
                if satisfies && refused.is_none() {
                    refused = Some(reason.value().clone());
                }
                continue;
            }

            let slot = if satisfies { &mut best } else { &mut closest };
            if slot
                .as_ref()
                .is_none_or(|(current, _)| candidate.version > current.version)
            {
                *slot = Some((candidate, module));
            }
        }

        match (best, refused, closest) {
            (Some((_, module)), _, _) => Ok(module.clone()),
            (None, Some(reason), _) => Err(Error::LoadFailure {
                identity: identity.clone(),
                reason: LoadFailureReason::Refused(reason),
            }),
            (None, None, Some((_, module))) => Err(Error::LoadFailure {
                identity: identity.clone(),
                reason: LoadFailureReason::VersionMismatch {
                    found: module.identity().clone(),
                },
            }),
            (None, None, None) => Err(not_found()),
        }
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry for StaticRegistry {
    fn modules(&self) -> Vec<ModuleRc> {
        self.modules
            .iter()
            .map(|(_, module)| module.clone())
            .collect()
    }

    fn load(&self, identity: &ModuleIdentity) -> Result<ModuleRc> {
        if let Some(reason) = self.refused.get(identity) {
            return Err(Error::LoadFailure {
                identity: identity.clone(),
                reason: LoadFailureReason::Refused(reason.value().clone()),
            });
        }

        if let Some(module) = self.by_identity.get(identity) {
            return Ok(module.value().clone());
        }

        self.bind(identity)
    }
}
