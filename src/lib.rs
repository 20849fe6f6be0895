// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # metaref
//!
//! Metadata references for compiling code against modules that are already loaded.
//!
//! A compiler that builds a script or plugin inside a running host needs one metadata
//! reference per module the code may touch. `metaref` computes that set from a few root
//! modules and their declared dependencies, and keeps exactly one reference per module
//! identity for the lifetime of the host, whether the metadata comes from a file on disk or
//! from bytes a runtime holds in memory.
//!
//! ## Features
//!
//! - **Shared cache** - Each module identity is materialized at most once, even under
//!   concurrent requests
//! - **Zero-copy sources** - Backing files are memory-mapped; in-memory metadata is shared,
//!   never copied
//! - **Tolerant resolution** - Dependencies that cannot be loaded are dropped, not fatal
//! - **Injectable registry** - The loader is a trait, so hosts and tests plug in their own
//!
//! ## Quick Start
//!
//! ```rust
//! use metaref::prelude::*;
//! use metaref::metadata::module::ModuleImage;
//! use std::sync::Arc;
//!
//! let app = ModuleImage::builder()
//!     .name("App")
//!     .raw_metadata(MetadataBlob::new(vec![0_u8; 16]))
//!     .dependency("Lib")
//!     .build()?
//!     .into_rc();
//! let lib = ModuleImage::builder()
//!     .name("Lib")
//!     .raw_metadata(MetadataBlob::new(vec![0_u8; 16]))
//!     .build()?
//!     .into_rc();
//!
//! let cache = ReferenceCache::new(Arc::new(StaticRegistry::from_modules([app.clone(), lib])));
//! let references = DependencyWalker::new(&cache).resolve(&[app])?;
//!
//! assert_eq!(references.len(), 2);
//! assert_eq!(cache.len(), 2);
//! # Ok::<(), metaref::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::cache`] - [`ReferenceCache`], the identity → reference store
//! - [`metadata::walker`] - [`DependencyWalker`] and [`ResolverConfig`]
//! - [`metadata::registry`] - [`ModuleRegistry`] and [`StaticRegistry`]
//! - [`metadata::module`] - [`LoadedModule`] and [`metadata::module::ModuleImage`]
//! - [`metadata::reference`] - [`MetadataReference`], the shared handle
//! - [`metadata::policy`] - [`ResolverPolicy`], the resolver handed to the compiler
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Diagnostics are emitted through [`tracing`]. The library never installs a subscriber.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use metaref::prelude::*;
/// use std::sync::Arc;
///
/// let cache = ReferenceCache::new(Arc::new(StaticRegistry::new()));
/// assert!(cache.is_empty());
/// ```
pub mod prelude;

/// Module identities, loaded modules, metadata references, and their resolution.
pub mod metadata;

/// `metaref` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `metaref` Error type
///
/// The error type for all fallible operations, and the reason attached to load failures.
pub use error::{Error, LoadFailureReason};

/// Byte sources behind references.
pub use file::{Backend, MetadataBlob};

/// The process-wide reference cache.
pub use metadata::cache::ReferenceCache;

/// Dependency resolution for a compilation unit.
pub use metadata::walker::{DependencyDepth, DependencyWalker, ResolutionOrder, ResolverConfig};

/// Module registries.
pub use metadata::registry::{ModuleRegistry, StaticRegistry};

/// Loaded modules.
pub use metadata::module::{LoadedModule, ModuleRc};

/// Metadata reference handles.
pub use metadata::reference::{MetadataReference, ReferenceKind};

/// The resolver handed to the compiler.
pub use metadata::policy::{MetadataReferenceResolver, ResolverPolicy};

/// Module identities.
pub use metadata::identity::{AssemblyName, AssemblyVersion, ModuleIdentity};
