//! Strong-name signing keys and public key tokens.
//!
//! A strong-named module carries either its full public key or the 8-byte token derived from
//! it. The token is what appears in a display name (`PublicKeyToken=b77a5c561934e089`) and is
//! computed as the last 8 bytes of the SHA-1 hash of the public key, in reverse order.

use sha1::{Digest, Sha1};

use crate::Result;

/// The signing-key fingerprint of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StrongName {
    /// The full public key blob.
    PublicKey(Vec<u8>),
    /// The 8-byte public key token.
    Token([u8; 8]),
}

impl StrongName {
    /// Creates a strong name from a public key token in display order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `token` is not exactly 8 bytes long.
    pub fn from_token(token: &[u8]) -> Result<Self> {
        let token: [u8; 8] = token.try_into().map_err(|_| {
            malformed_error!(
                "PublicKeyToken must be exactly 8 bytes, got {} bytes",
                token.len()
            )
        })?;

        Ok(StrongName::Token(token))
    }

    /// Parses a public key token from its 16-character hex form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for invalid hex or a wrong length.
    pub fn parse_token(hex_token: &str) -> Result<Self> {
        let bytes = hex::decode(hex_token)
            .map_err(|e| malformed_error!("Invalid hex in PublicKeyToken '{}': {}", hex_token, e))?;

        Self::from_token(&bytes)
    }

    /// Returns the public key token, computing it for full public keys.
    #[must_use]
    pub fn token(&self) -> [u8; 8] {
        match self {
            StrongName::PublicKey(key) => {
                let digest = Sha1::digest(key);

                let mut token = [0_u8; 8];
                token.copy_from_slice(&digest[digest.len() - 8..]);
                token.reverse();
                token
            }
            StrongName::Token(token) => *token,
        }
    }

    /// Returns the public key token as lowercase hex, as used in display names.
    #[must_use]
    pub fn token_hex(&self) -> String {
        hex::encode(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The ECMA standard key, used by the core framework assemblies.
    const ECMA_KEY: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];

    #[test]
    fn token_from_public_key() {
        let strong_name = StrongName::PublicKey(ECMA_KEY.to_vec());
        assert_eq!(strong_name.token_hex(), "b77a5c561934e089");
    }

    #[test]
    fn token_from_token() {
        let strong_name = StrongName::parse_token("b03f5f7f11d50a3a").unwrap();

        assert_eq!(
            strong_name,
            StrongName::Token([0xb0, 0x3f, 0x5f, 0x7f, 0x11, 0xd5, 0x0a, 0x3a])
        );
        assert_eq!(strong_name.token_hex(), "b03f5f7f11d50a3a");
    }

    #[test]
    fn public_key_token_matches_manual_sha1() {
        let key: Vec<u8> = (1..=16).collect();
        let digest = Sha1::digest(&key);
        let expected: Vec<u8> = digest[digest.len() - 8..].iter().rev().copied().collect();

        assert_eq!(StrongName::PublicKey(key).token().to_vec(), expected);
    }

    #[test]
    fn invalid_tokens() {
        assert!(StrongName::parse_token("b03f5f7f").is_err());
        assert!(StrongName::parse_token("zz3f5f7f11d50a3a").is_err());
        assert!(StrongName::from_token(&[1, 2, 3]).is_err());
    }
}
