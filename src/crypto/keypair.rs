//! Ethereum keypair derivation.

use std::fmt;

use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use tiny_keccak::{Hasher, Keccak};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::Address;

/// Failure to produce a candidate keypair.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The operating system entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(#[from] rand::Error),

    /// The 32 bytes are not a valid secp256k1 scalar (zero or >= group order).
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(#[from] secp256k1::Error),
}

/// A private key and the address derived from it.
///
/// The secret bytes are wiped when the keypair is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Keypair {
    secret_key: [u8; 32],
    #[zeroize(skip)]
    address: Address,
}

impl Keypair {
    /// Derives a keypair from 32 secret bytes.
    pub fn from_secret_bytes(secret_bytes: [u8; 32]) -> Result<Self, KeyError> {
        Self::with_context(&Secp256k1::signing_only(), secret_bytes)
    }

    /// Same as [`Keypair::from_secret_bytes`] but reuses a signing context,
    /// which is expensive to build.
    pub fn with_context<C: Signing>(
        secp: &Secp256k1<C>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: derive_address(&public_key),
        })
    }

    /// Private key as 64 lowercase hex characters, no `0x`.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Keccak-256 of the uncompressed public key without its `0x04` tag,
/// truncated to the last 20 bytes.
#[inline]
fn derive_address(public_key: &PublicKey) -> Address {
    let serialized = public_key.serialize_uncompressed();

    let mut hasher = Keccak::v256();
    hasher.update(&serialized[1..]);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    Address::from_digest(&hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(last: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        bytes
    }

    #[test]
    fn test_known_vectors() {
        let one = Keypair::from_secret_bytes(scalar(1)).unwrap();
        assert_eq!(one.address().to_hex(), "7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(
            one.address().to_checksum(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );

        let two = Keypair::from_secret_bytes(scalar(2)).unwrap();
        assert_eq!(two.address().to_hex(), "2b5ad5c4795c026514f8317c7a215e218dccd6cf");
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let err = Keypair::from_secret_bytes([0u8; 32]).unwrap_err();
        assert!(matches!(err, KeyError::InvalidSecretKey(_)));
    }

    #[test]
    fn test_scalar_above_order_rejected() {
        assert!(Keypair::from_secret_bytes([0xff; 32]).is_err());
    }

    #[test]
    fn test_private_key_hex() {
        let kp = Keypair::from_secret_bytes(scalar(1)).unwrap();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert!(kp.private_key_hex().ends_with("01"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = Keypair::from_secret_bytes(scalar(1)).unwrap();
        let dbg = format!("{:?}", kp);
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains(&kp.private_key_hex()));
    }
}
