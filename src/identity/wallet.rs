//! EVM wallet derived from a configured private key.
//!
//! Parses a secp256k1 private key, derives the Ethereum address, and signs
//! 32-byte prehashes for payment authorizations. The key lives only in
//! memory: it is never written to disk and never appears in `Debug` output.

use k256::ecdsa::{SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Errors raised while turning a private key string into a wallet.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("private key is not valid hex")]
    InvalidHex,

    #[error("private key must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signing(String),
}

/// An in-memory wallet handle.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    /// Ethereum address (EIP-55 checksummed).
    pub address: String,
}

impl Wallet {
    /// Build a wallet from a hex-encoded private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self, WalletError> {
        let trimmed = key.trim();
        let key_hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let key_bytes = hex::decode(key_hex).map_err(|_| WalletError::InvalidHex)?;
        if key_bytes.len() != 32 {
            return Err(WalletError::InvalidLength(key_bytes.len()));
        }

        let signing_key =
            SigningKey::from_slice(&key_bytes).map_err(|_| WalletError::InvalidKey)?;
        let address = address_of(signing_key.verifying_key());

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Sign a 32-byte prehash, returning `r || s || v` with `v = 27 + recovery id`.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<[u8; 65], WalletError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte() + 27;
        Ok(out)
    }

    /// Raw 20-byte address, for ABI encoding.
    pub fn address_bytes(&self) -> [u8; 20] {
        address_bytes_of(self.signing_key.verifying_key())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn address_bytes_of(key: &VerifyingKey) -> [u8; 20] {
    // Uncompressed public key is 0x04 || x || y; hash skips the prefix byte.
    let encoded = key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Derive the checksummed Ethereum address for a public key.
pub fn address_of(key: &VerifyingKey) -> String {
    checksum_address(&hex::encode(address_bytes_of(key)))
}

/// EIP-55 checksum an Ethereum address.
fn checksum_address(address: &str) -> String {
    let addr = address.strip_prefix("0x").unwrap_or(address).to_lowercase();
    let hash_hex = hex::encode(Keccak256::digest(addr.as_bytes()));

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (c, h) in addr.chars().zip(hash_hex.chars()) {
        if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    checksummed
}
