//! Sources of candidate keypairs.

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{Secp256k1, SignOnly};
use zeroize::Zeroize;

use super::{KeyError, Keypair};

/// Produces one candidate keypair per call.
///
/// Implementations must draw secrets from a cryptographically secure
/// source. A returned error skips the attempt; it never aborts a search.
pub trait KeySource {
    fn next_keypair(&mut self) -> Result<Keypair, KeyError>;
}

/// Draws 32 bytes per candidate from the operating system CSPRNG.
pub struct OsKeySource {
    secp: Secp256k1<SignOnly>,
}

impl OsKeySource {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }
}

impl Default for OsKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for OsKeySource {
    fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
        let mut secret = [0u8; 32];
        let result = OsRng
            .try_fill_bytes(&mut secret)
            .map_err(KeyError::from)
            .and_then(|()| Keypair::with_context(&self.secp, secret));
        secret.zeroize();
        result
    }
}

impl<F> KeySource for F
where
    F: FnMut() -> Result<Keypair, KeyError>,
{
    fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
        self()
    }
}
