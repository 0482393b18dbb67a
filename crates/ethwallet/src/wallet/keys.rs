//! secp256k1 key types.
//!
//! Private keys are validated as curve scalars on construction, so every
//! [`PrivateKey`] has a public key. Private keys are zeroized on drop.

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{WalletError, WalletResult};
use crate::wallet::address::Address;

/// Private key length in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Public key length in bytes (uncompressed, without the `0x04` tag).
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// secp256k1 private key (32 bytes) with automatic zeroization.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LENGTH]);

impl PrivateKey {
    /// Validate and wrap raw key bytes.
    ///
    /// Fails with `InvalidInput` unless `bytes` is 32 bytes long and a valid
    /// non-zero scalar below the curve order.
    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(WalletError::InvalidInput(format!(
                "Invalid private key length: expected {}, got {}",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            )));
        }
        SigningKey::from_slice(bytes)
            .map_err(|_| WalletError::InvalidInput("Private key is not a valid secp256k1 scalar".into()))?;

        let mut key = [0u8; PRIVATE_KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Get the raw bytes of the private key.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LENGTH] {
        &self.0
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> WalletResult<PublicKey> {
        let signing = SigningKey::from_slice(&self.0)
            .map_err(|_| WalletError::InvalidInput("Private key is not a valid secp256k1 scalar".into()))?;
        Ok(PublicKey::from_verifying_key(&VerifyingKey::from(&signing)))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// secp256k1 public key: the 64-byte `x ‖ y` encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Uncompressed SEC1: 0x04 ‖ x ‖ y
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(&point.as_bytes()[1..]);
        Self(bytes)
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Account address: last 20 bytes of Keccak-256 of the public key.
    pub fn to_address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = 1;
        k
    }

    #[test]
    fn test_private_key_rejects_wrong_length() {
        let result = PrivateKey::from_slice(&[1u8; 31]);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_private_key_rejects_zero() {
        let result = PrivateKey::from_slice(&[0u8; 32]);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_private_key_rejects_above_order() {
        let result = PrivateKey::from_slice(&[0xFFu8; 32]);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_public_key_of_one_is_generator() {
        let key = PrivateKey::from_slice(&key_one()).unwrap();
        let public = key.public_key().unwrap();
        assert_eq!(
            hex::encode(&public.as_bytes()[..32]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let key = PrivateKey::from_slice(&key_one()).unwrap();
        let debug_str = format!("{:?}", key);
        assert!(debug_str.contains("REDACTED"));
    }
}
