//! Module identities, metadata references, and their resolution.
//!
//! This module contains everything between a host's loaded modules and the set of metadata
//! references a compiler consumes: the identity model, the registry seam, the shared reference
//! cache, and the dependency walker built on top of it.
//!
//! # Key Components
//!
//! - [`identity`] - Canonical module identities and parsed assembly names
//! - [`module`] - The [`module::LoadedModule`] abstraction over resident modules
//! - [`registry`] - The [`registry::ModuleRegistry`] seam and an in-memory implementation
//! - [`cache`] - The process-wide identity → reference store
//! - [`walker`] - Dependency resolution for a compilation unit
//! - [`policy`] - The refusing resolver handed to the compiler
//!
//! # Examples
//!
//! ```rust
//! use metaref::metadata::{cache::ReferenceCache, module::ModuleImage, registry::StaticRegistry};
//! use metaref::MetadataBlob;
//! use std::sync::Arc;
//!
//! let module = ModuleImage::builder()
//!     .name("Dynamic")
//!     .raw_metadata(MetadataBlob::new(vec![0_u8; 16]))
//!     .build()?;
//!
//! let cache = ReferenceCache::new(Arc::new(StaticRegistry::new()));
//! let first = cache.get(&module)?;
//! let second = cache.get(&module)?;
//! assert!(first.ptr_eq(&second));
//! # Ok::<(), metaref::Error>(())
//! ```

/// Implementation of the process-wide reference cache
pub mod cache;
/// Implementation of the Header of CIL
pub mod cor20header;
/// Materialization of references from loaded modules
pub mod extractor;
/// Implementation of module identities and assembly names
pub mod identity;
/// Loaded modules as seen by the cache
pub mod module;
/// The refusing resolver policy
pub mod policy;
/// Metadata reference handles
pub mod reference;
/// The module registry seam
pub mod registry;
/// Implementation of the root metadata structure
pub mod root;
/// Dependency resolution
pub mod walker;
