use thiserror::Error;

use crate::metadata::identity::ModuleIdentity;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! extraction_error {
    ($identity:expr) => {
        crate::Error::Extraction {
            identity: $identity.clone(),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only a small subset of these errors ever leaves the reference cache or the dependency walker.
/// Load failures of individual dependencies are absorbed by the walker, and the policy hooks
/// never fail at all. What remains visible to a caller of
/// [`crate::DependencyWalker::resolve`] or [`crate::ReferenceCache::get`] is
/// [`Error::Extraction`], which signals that the module registry handed out a module that has
/// no metadata source whatsoever.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::Extraction`] - A loaded module exposes neither a backing file nor raw metadata
/// - [`Error::LoadFailure`] - A module identity could not be loaded by the registry
///
/// ## Parsing Errors
/// - [`Error::Malformed`] - Corrupted display name or metadata header
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
///
/// ## I/O and Configuration Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Configuration`] - Invalid builder input
///
/// # Examples
///
/// ```rust,no_run
/// use metaref::{Error, ReferenceCache, StaticRegistry};
/// use metaref::metadata::module::ModuleImage;
/// use std::sync::Arc;
///
/// let registry = Arc::new(StaticRegistry::new());
/// let cache = ReferenceCache::new(registry);
/// let module = ModuleImage::builder().name("Orphan").build()?;
///
/// match cache.get(&module) {
///     Ok(reference) => println!("{}", reference.identity()),
///     Err(Error::Extraction { identity, file, line }) => {
///         eprintln!("{} has no metadata source ({}:{})", identity, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok::<(), metaref::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A loaded module has neither an existing backing file nor retrievable raw metadata.
    ///
    /// Modules handed out by a [`crate::ModuleRegistry`] always carry at least one of the two,
    /// so this error marks an inconsistent registry rather than a condition to recover from.
    /// It is logged when raised and always propagated to the caller.
    ///
    /// # Fields
    ///
    /// * `identity` - The module that could not be materialized
    /// * `file` - Source file where the error was raised
    /// * `line` - Source line where the error was raised
    #[error("Failed to create a metadata reference for {identity} - {file}:{line}")]
    Extraction {
        /// The identity of the module without a metadata source
        identity: ModuleIdentity,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A module identity could not be loaded by the registry.
    ///
    /// Raised by [`crate::ModuleRegistry::load`]. The dependency walker drops the affected
    /// candidate and carries on with the remaining ones, so this error never escapes
    /// [`crate::DependencyWalker::resolve`].
    #[error("Failed to load {identity} - {reason}")]
    LoadFailure {
        /// The identity that was requested
        identity: ModuleIdentity,
        /// Why the registry could not provide the module
        reason: LoadFailureReason,
    },

    /// The input is damaged and could not be parsed.
    ///
    /// Used for invalid display names, version strings, and metadata headers. The error
    /// includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Invalid input was passed to a builder or constructor.
    #[error("{0}")]
    Configuration(String),
}

/// The reason a [`crate::ModuleRegistry`] could not provide a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailureReason {
    /// No module with a matching name is known to the registry.
    NotFound,
    /// Modules with the requested name exist, but none has a compatible version.
    VersionMismatch {
        /// The closest identity the registry does know about
        found: ModuleIdentity,
    },
    /// The registry refused to hand out the module, e.g. for security reasons.
    Refused(String),
}

impl std::fmt::Display for LoadFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailureReason::NotFound => write!(f, "module not found"),
            LoadFailureReason::VersionMismatch { found } => {
                write!(f, "version mismatch, found {found}")
            }
            LoadFailureReason::Refused(message) => write!(f, "refused: {message}"),
        }
    }
}
