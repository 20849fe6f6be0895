//! Parsed assembly names.
//!
//! [`AssemblyName`] is the structured form of a [`crate::ModuleIdentity`]. Hosts that only know
//! the components of a module (for instance from its manifest) build an `AssemblyName` and call
//! [`AssemblyName::identity`] to obtain the canonical key; registries use
//! [`AssemblyName::satisfies`] to bind a requested identity to a loaded module with a
//! compatible version.
//!
//! # Canonical form
//!
//! The canonical full name always contains four parts, in this order:
//!
//! ```text
//! Name, Version=major.minor.build.revision, Culture=<culture|neutral>, PublicKeyToken=<hex|null>
//! ```
//!
//! The processor architecture is parsed and kept, but not part of the full name, so two modules
//! that differ only in architecture share one identity.

use std::{fmt, str::FromStr};

use strum::{Display, EnumString};

use crate::{
    metadata::identity::{ModuleIdentity, StrongName},
    Result,
};

/// The components of a module's full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyName {
    /// Simple name, e.g. `System.Runtime`
    pub name: String,
    /// Four-part version
    pub version: AssemblyVersion,
    /// Culture, `None` for culture-neutral modules
    pub culture: Option<String>,
    /// Public key or public key token, `None` for modules without a strong name
    pub strong_name: Option<StrongName>,
    /// Target processor architecture, if declared
    pub processor_architecture: Option<ProcessorArchitecture>,
}

/// A four-part module version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version number
    pub major: u16,
    /// Minor version number
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

/// Processor architecture a module was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ProcessorArchitecture {
    /// Architecture-neutral IL
    #[strum(to_string = "MSIL")]
    MSIL,
    /// 32-bit x86
    #[strum(to_string = "X86")]
    X86,
    /// Itanium
    #[strum(to_string = "IA64")]
    IA64,
    /// 64-bit x86
    #[strum(to_string = "AMD64", serialize = "x64")]
    AMD64,
    /// 32-bit ARM
    #[strum(to_string = "Arm")]
    ARM,
    /// 64-bit ARM
    #[strum(to_string = "Arm64")]
    ARM64,
}

impl AssemblyName {
    /// Creates a culture-neutral name without strong name or architecture.
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        AssemblyName {
            name: name.into(),
            version,
            culture: None,
            strong_name: None,
            processor_architecture: None,
        }
    }

    /// Sets the culture; `neutral` and the empty string both mean culture-neutral.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        let culture = culture.into();
        self.culture = if culture.is_empty() || culture.eq_ignore_ascii_case("neutral") {
            None
        } else {
            Some(culture)
        };
        self
    }

    /// Sets the strong name.
    #[must_use]
    pub fn with_strong_name(mut self, strong_name: StrongName) -> Self {
        self.strong_name = Some(strong_name);
        self
    }

    /// Sets the processor architecture.
    #[must_use]
    pub fn with_processor_architecture(mut self, architecture: ProcessorArchitecture) -> Self {
        self.processor_architecture = Some(architecture);
        self
    }

    /// Parses a display name such as
    /// `mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089`.
    ///
    /// Missing components take their defaults (version `0.0.0.0`, neutral culture, no strong
    /// name). Both `PublicKeyToken=` and `PublicKey=` are understood; unknown components are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the name is empty or a component is invalid.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut result = AssemblyName::new(name, AssemblyVersion::default());
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(malformed_error!("Invalid display name component - {}", part));
            };
            let value = value.trim();

            match key.trim() {
                "Version" => result.version = AssemblyVersion::parse(value)?,
                "Culture" => result = result.with_culture(value),
                "PublicKeyToken" => {
                    if !value.is_empty() && !value.eq_ignore_ascii_case("null") {
                        result.strong_name = Some(StrongName::parse_token(value)?);
                    }
                }
                "PublicKey" => {
                    if !value.is_empty() && !value.eq_ignore_ascii_case("null") {
                        let key = hex::decode(value).map_err(|e| {
                            malformed_error!("Invalid hex in PublicKey '{}': {}", value, e)
                        })?;
                        result.strong_name = Some(StrongName::PublicKey(key));
                    }
                }
                "ProcessorArchitecture" => {
                    result.processor_architecture = Some(ProcessorArchitecture::parse(value)?);
                }
                _ => {}
            }
        }

        Ok(result)
    }

    /// Renders the canonical full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        let token = self
            .strong_name
            .as_ref()
            .map_or_else(|| "null".to_string(), StrongName::token_hex);

        format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            token
        )
    }

    /// Returns the canonical identity of this name.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        ModuleIdentity::from(self)
    }

    /// Returns `true` if a module named `self` can stand in for a reference to `required`.
    ///
    /// Names compare case-insensitively, cultures exactly, and the version must be compatible
    /// (see [`AssemblyVersion::is_compatible_with`]). If `required` carries a strong name,
    /// `self` must carry the same public key token.
    #[must_use]
    pub fn satisfies(&self, required: &AssemblyName) -> bool {
        if !self.name.eq_ignore_ascii_case(&required.name) {
            return false;
        }

        if self.culture != required.culture {
            return false;
        }

        if let Some(required_key) = &required.strong_name {
            match &self.strong_name {
                Some(key) if key.token() == required_key.token() => {}
                _ => return false,
            }
        }

        self.version.is_compatible_with(&required.version)
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl FromStr for AssemblyName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        AssemblyName::parse(s)
    }
}

impl AssemblyVersion {
    /// Creates a version from its four parts.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Returns `true` for `0.0.0.0`, which a reference uses to accept any version.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.build == 0 && self.revision == 0
    }

    /// Returns `true` if this version can satisfy a reference to `required`.
    ///
    /// An unknown requirement accepts anything; otherwise the major versions must match and
    /// this version must be at least `required`.
    #[must_use]
    pub fn is_compatible_with(&self, required: &AssemblyVersion) -> bool {
        if required.is_unknown() {
            return true;
        }

        self.major == required.major && *self >= *required
    }

    /// Parses one to four dot-separated components; missing components are zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for empty input, more than four components, or a
    /// component that is not a `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: '{}'", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for AssemblyVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        AssemblyVersion::parse(s)
    }
}

impl ProcessorArchitecture {
    /// Parses an architecture name, case-insensitively; `x64` is accepted for `AMD64`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for unknown names.
    pub fn parse(arch_str: &str) -> Result<Self> {
        ProcessorArchitecture::from_str(arch_str.trim()).map_err(|_| {
            malformed_error!("Unknown processor architecture: '{}'", arch_str.trim())
        })
    }
}
