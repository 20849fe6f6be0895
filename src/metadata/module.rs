//! Modules resident in the host process.
//!
//! The reference cache never loads or unloads modules on its own. It works on handles to
//! modules the host already holds, described by the [`LoadedModule`] trait: an identity, an
//! optional backing file, optional raw metadata bytes, and the identities the module declares
//! as dependencies.
//!
//! [`ModuleImage`] is a plain implementation for hosts that describe their modules
//! explicitly, built through [`ModuleImage::builder`].
//!
//! # Examples
//!
//! ```rust
//! use metaref::metadata::module::{LoadedModule, ModuleImage};
//!
//! let module = ModuleImage::builder()
//!     .name("App, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null")
//!     .location("/opt/app/App.dll")
//!     .dependency("System.Runtime, Version=8.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a")
//!     .build()?;
//!
//! assert_eq!(module.identity().simple_name(), "App");
//! assert_eq!(module.dependencies().len(), 1);
//! # Ok::<(), metaref::Error>(())
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    file::MetadataBlob,
    metadata::identity::{AssemblyName, ModuleIdentity},
    Error, Result,
};

/// A reference-counted handle to a loaded module.
pub type ModuleRc = Arc<dyn LoadedModule>;

/// A module already resident in the host process.
///
/// Implementations are owned by the host or its [`crate::ModuleRegistry`]. Every module a
/// registry hands out must expose an existing [`location`](LoadedModule::location), or
/// [`raw_metadata`](LoadedModule::raw_metadata), or both.
pub trait LoadedModule: Send + Sync {
    /// The canonical identity of the module.
    fn identity(&self) -> &ModuleIdentity;

    /// Path of the file the module was loaded from, if it has one.
    fn location(&self) -> Option<&Path>;

    /// The raw metadata of the module, for modules that live in memory only.
    ///
    /// The returned blob shares storage with the module; it must not copy.
    fn raw_metadata(&self) -> Option<MetadataBlob>;

    /// Identities of the modules this module declares as dependencies.
    fn dependencies(&self) -> Vec<ModuleIdentity>;
}

/// A loaded module described explicitly by the host.
#[derive(Clone)]
pub struct ModuleImage {
    identity: ModuleIdentity,
    location: Option<PathBuf>,
    raw_metadata: Option<MetadataBlob>,
    dependencies: Vec<ModuleIdentity>,
}

impl ModuleImage {
    /// Starts building a module.
    #[must_use]
    pub fn builder() -> ModuleImageBuilder {
        ModuleImageBuilder::default()
    }

    /// Wraps the image in a [`ModuleRc`].
    #[must_use]
    pub fn into_rc(self) -> ModuleRc {
        Arc::new(self)
    }
}

impl LoadedModule for ModuleImage {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn raw_metadata(&self) -> Option<MetadataBlob> {
        self.raw_metadata.clone()
    }

    fn dependencies(&self) -> Vec<ModuleIdentity> {
        self.dependencies.clone()
    }
}

impl fmt::Debug for ModuleImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleImage")
            .field("identity", &self.identity)
            .field("location", &self.location)
            .field("raw_metadata", &self.raw_metadata.as_ref().map(MetadataBlob::len))
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Builder for [`ModuleImage`].
#[derive(Default)]
pub struct ModuleImageBuilder {
    identity: Option<ModuleIdentity>,
    location: Option<PathBuf>,
    raw_metadata: Option<MetadataBlob>,
    dependencies: Vec<ModuleIdentity>,
}

impl ModuleImageBuilder {
    /// Sets the identity from a full name, verbatim.
    #[must_use]
    pub fn name(mut self, full_name: impl AsRef<str>) -> Self {
        self.identity = Some(ModuleIdentity::new(full_name));
        self
    }

    /// Sets the identity from parsed components, in canonical form.
    #[must_use]
    pub fn assembly_name(mut self, name: &AssemblyName) -> Self {
        self.identity = Some(name.identity());
        self
    }

    /// Sets the identity.
    #[must_use]
    pub fn identity(mut self, identity: ModuleIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the backing file.
    #[must_use]
    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Sets the in-memory metadata.
    #[must_use]
    pub fn raw_metadata(mut self, blob: MetadataBlob) -> Self {
        self.raw_metadata = Some(blob);
        self
    }

    /// Adds a declared dependency.
    #[must_use]
    pub fn dependency(mut self, identity: impl Into<ModuleIdentity>) -> Self {
        self.dependencies.push(identity.into());
        self
    }

    /// Adds several declared dependencies.
    #[must_use]
    pub fn dependencies<I, T>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ModuleIdentity>,
    {
        self.dependencies
            .extend(identities.into_iter().map(Into::into));
        self
    }

    /// Builds the module.
    ///
    /// A module without any metadata source can be built; materializing it later fails with
    /// [`crate::Error::Extraction`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if no identity was set or it is empty.
    pub fn build(self) -> Result<ModuleImage> {
        let identity = match self.identity {
            Some(identity) if !identity.is_empty() => identity,
            _ => {
                return Err(Error::Configuration(
                    "Module identity is missing or empty".to_string(),
                ))
            }
        };

        Ok(ModuleImage {
            identity,
            location: self.location,
            raw_metadata: self.raw_metadata,
            dependencies: self.dependencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::identity::AssemblyVersion;

    #[test]
    fn build_file_module() {
        let module = ModuleImage::builder()
            .name("A")
            .location("/tmp/A.dll")
            .dependencies(["B", "C"])
            .build()
            .unwrap();

        assert_eq!(module.identity().as_str(), "A");
        assert_eq!(module.location(), Some(Path::new("/tmp/A.dll")));
        assert!(module.raw_metadata().is_none());
        assert_eq!(
            module.dependencies(),
            vec![ModuleIdentity::new("B"), ModuleIdentity::new("C")]
        );
    }

    #[test]
    fn build_memory_module_shares_blob() {
        let blob = MetadataBlob::new(vec![1_u8, 2, 3]);
        let module = ModuleImage::builder()
            .assembly_name(&AssemblyName::new("Dynamic", AssemblyVersion::new(0, 0, 0, 0)))
            .raw_metadata(blob.clone())
            .build()
            .unwrap();

        assert_eq!(
            module.identity().as_str(),
            "Dynamic, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null"
        );
        assert!(module.location().is_none());
        assert!(module.raw_metadata().unwrap().shares_storage(&blob));
    }

    #[test]
    fn build_requires_identity() {
        assert!(matches!(
            ModuleImage::builder().build(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            ModuleImage::builder().name("  ").build(),
            Err(Error::Configuration(_))
        ));
    }
}
