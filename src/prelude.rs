//! # metaref Prelude
//!
//! The types needed to build a cache, resolve a compilation unit's references, and hand the
//! resolver policy to a compiler.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all metaref operations
pub use crate::Error;

/// The result type used throughout metaref
pub use crate::Result;

// ================================================================================================
// Resolution
// ================================================================================================

/// The process-wide reference cache
pub use crate::ReferenceCache;

/// Dependency resolution and its configuration
pub use crate::{DependencyDepth, DependencyWalker, ResolutionOrder, ResolverConfig};

/// The resolver handed to the compiler
pub use crate::{MetadataReferenceResolver, ResolverPolicy};

// ================================================================================================
// Modules and References
// ================================================================================================

/// Module registries
pub use crate::{ModuleRegistry, StaticRegistry};

/// Loaded modules
pub use crate::{LoadedModule, ModuleRc};

/// Metadata references and their byte sources
pub use crate::{MetadataBlob, MetadataReference, ReferenceKind};

/// Module identities
pub use crate::{AssemblyName, AssemblyVersion, ModuleIdentity};
