//! Module identities and their parsed components.
//!
//! A [`ModuleIdentity`] is the canonical full name of a binary module, e.g.
//! `System.Runtime, Version=8.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a`. It is the
//! key of the reference cache and the unit of deduplication in the dependency walker, and it
//! compares by exact, case-sensitive string equality.
//!
//! [`AssemblyName`] holds the parsed components of such a name (simple name, version, culture,
//! strong name, processor architecture) and renders the canonical full name from them.
//!
//! # Module Structure
//!
//! - [`assembly`] - [`AssemblyName`], [`AssemblyVersion`], [`ProcessorArchitecture`]
//! - [`strongname`] - [`StrongName`] and public key token computation
//!
//! # Examples
//!
//! ```rust
//! use metaref::metadata::identity::{AssemblyName, AssemblyVersion, ModuleIdentity};
//!
//! let name = AssemblyName::new("MyLibrary", AssemblyVersion::new(1, 2, 0, 0));
//! let identity = name.identity();
//!
//! assert_eq!(
//!     identity.as_str(),
//!     "MyLibrary, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
//! );
//! assert_eq!(identity.simple_name(), "MyLibrary");
//! assert_eq!(identity, ModuleIdentity::new(identity.as_str()));
//! ```

pub mod assembly;
pub mod strongname;

pub use assembly::{AssemblyName, AssemblyVersion, ProcessorArchitecture};
pub use strongname::StrongName;

use std::{borrow::Borrow, fmt, sync::Arc};

use crate::Result;

/// The canonical full name of a binary module.
///
/// Immutable and cheap to clone. Equality, hashing, and ordering all operate on the exact
/// string, so two identities that differ only in letter case are distinct. No normalization
/// is applied to strings handed in by a host; identities built from an [`AssemblyName`] are
/// always rendered in the canonical form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdentity(Arc<str>);

impl ModuleIdentity {
    /// Creates an identity from a full name, verbatim.
    pub fn new(full_name: impl AsRef<str>) -> Self {
        ModuleIdentity(Arc::from(full_name.as_ref()))
    }

    /// Returns the unspecified identity.
    #[must_use]
    pub fn empty() -> Self {
        ModuleIdentity(Arc::from(""))
    }

    /// Returns the full name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identity is empty or consists of whitespace only.
    ///
    /// Such identities name nothing and are skipped during dependency resolution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the simple name, i.e. everything before the first comma.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.split(',').next().unwrap_or_default().trim()
    }

    /// Parses the full name into its components.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the full name is not a valid display name.
    pub fn parse(&self) -> Result<AssemblyName> {
        AssemblyName::parse(&self.0)
    }
}

impl Default for ModuleIdentity {
    fn default() -> Self {
        ModuleIdentity::empty()
    }
}

impl From<&str> for ModuleIdentity {
    fn from(full_name: &str) -> Self {
        ModuleIdentity::new(full_name)
    }
}

impl From<String> for ModuleIdentity {
    fn from(full_name: String) -> Self {
        ModuleIdentity(Arc::from(full_name))
    }
}

impl From<&AssemblyName> for ModuleIdentity {
    fn from(name: &AssemblyName) -> Self {
        ModuleIdentity::from(name.full_name())
    }
}

impl Borrow<str> for ModuleIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleIdentity").field(&&*self.0).finish()
    }
}
