//! Ethereum address representation and EIP-55 checksum casing.

use std::fmt;

use serde::{Serialize, Serializer};
use tiny_keccak::{Hasher, Keccak};

/// Length of an address body in hex characters (without `0x`).
pub const ADDRESS_HEX_LEN: usize = 40;

/// A 20-byte Ethereum address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives an address from the last 20 bytes of a Keccak-256 digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex body, no `0x`.
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 checksum-cased body, no `0x`.
    pub fn checksum_body(&self) -> String {
        apply_checksum(&self.to_hex())
    }

    /// EIP-55 checksum-cased address with `0x` prefix.
    pub fn to_checksum(&self) -> String {
        format!("0x{}", self.checksum_body())
    }
}

/// Applies EIP-55 casing to a 40-character lowercase hex body.
fn apply_checksum(lower: &str) -> String {
    let mut hasher = Keccak::v256();
    hasher.update(lower.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Returns true if `text` is a `0x`-prefixed address whose casing is a
/// valid EIP-55 checksum.
pub fn is_checksum_address(text: &str) -> bool {
    let Some(body) = text.strip_prefix("0x") else {
        return false;
    };
    if body.len() != ADDRESS_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    apply_checksum(&body.to_ascii_lowercase()) == body
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}
