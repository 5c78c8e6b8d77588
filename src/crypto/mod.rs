//! Cryptographic operations for Ethereum key and address generation.
//!
//! - Secret keys drawn from the OS CSPRNG
//! - secp256k1 public key derivation and Keccak-256 address hashing
//! - EIP-55 checksum casing

mod address;
mod keypair;
mod source;

pub use address::{is_checksum_address, Address, ADDRESS_HEX_LEN};
pub use keypair::{KeyError, Keypair};
pub use source::{KeySource, OsKeySource};
