//! Server-side signing account derived from a secp256k1 private key.

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("private key must start with 0x")]
    MissingPrefix,

    #[error("private key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("private key is not a valid secp256k1 scalar: {0}")]
    InvalidKey(#[from] secp256k1::Error),
}

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Signing account: the secret key plus its lower-cased EVM address.
pub struct Signer {
    secret: SecretKey,
    address: String,
}

impl Signer {
    /// Parse a `0x`-prefixed 32-byte hex private key.
    pub fn from_private_key(private_key: &str) -> Result<Self, SignerError> {
        let hex_key = private_key
            .trim()
            .strip_prefix("0x")
            .ok_or(SignerError::MissingPrefix)?;
        let bytes = hex::decode(hex_key)?;
        let secret = SecretKey::from_slice(&bytes)?;

        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        let uncompressed = public.serialize_uncompressed();
        let digest = keccak256(&uncompressed[1..]);
        let address = format!("0x{}", hex::encode(&digest[12..]));

        Ok(Self { secret, address })
    }

    /// Lower-cased `0x` address of this account.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Recoverable signature over a 32-byte digest, as `0x` + r || s || v.
    pub fn sign_digest(&self, digest: [u8; 32]) -> String {
        let secp = Secp256k1::new();
        let message = Message::from_digest(digest);
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(&compact);
        bytes.push(27 + recovery_id.to_i32() as u8);
        format!("0x{}", hex::encode(bytes))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
