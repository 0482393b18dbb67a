//! Account addresses and their EIP-55 checksum rendering.

use std::fmt;
use std::str::FromStr;

use crate::error::{WalletError, WalletResult};
use crate::hash::keccak256;
use crate::wallet::keys::PublicKey;

/// Length of an account address.
pub const ADDRESS_LENGTH: usize = 20;

/// 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Last 20 bytes of Keccak-256 of the 64-byte public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let hash = keccak256(public_key.as_bytes());
        let mut address = [0u8; ADDRESS_LENGTH];
        address.copy_from_slice(&hash[32 - ADDRESS_LENGTH..]);
        Self(address)
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// True for ICAP-direct compatible addresses (first byte zero).
    pub fn is_icap_direct(&self) -> bool {
        self.0[0] == 0
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 mixed-case rendering with `0x` prefix.
    pub fn to_checksum(&self) -> String {
        let lower = self.to_hex();
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = WalletError;

    /// Parse hex, with or without `0x`, in any case.
    fn from_str(s: &str) -> WalletResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| WalletError::InvalidInput(format!("Invalid address: {}", e)))?;
        let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            WalletError::InvalidInput(format!(
                "Invalid address length: expected {}, got {}",
                ADDRESS_LENGTH,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}
