//! Ethereum pre-sale wallets (pyethsaletool exports).
//!
//! JSON fields: `encseed`, `ethaddr`, `btcaddr`, `email`. The seed is
//! AES-128-CBC encrypted under `pbkdf2(passphrase, passphrase, 2000)[0..16]`
//! with the IV stored as the first 16 bytes of `encseed`; the private key is
//! `keccak256(seed)`. There is no MAC, so the recovered address is the only
//! authenticity check.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cipher::{self, CipherKind, BLOCK_SIZE};
use crate::error::{WalletError, WalletResult};
use crate::format::{addresses_match, hex_decode};
use crate::hash::keccak256;
use crate::legacy::password_as_salt_pbkdf2;
use crate::wallet::keys::PrivateKey;

/// PBKDF2 iterations used by the pre-sale tool.
pub const PRESALE_PBKDF2_ITERATIONS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSaleContainer {
    pub encseed: String,
    pub ethaddr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btcaddr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl EthSaleContainer {
    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Decrypt a pre-sale wallet and check the recovered address.
pub fn decrypt_eth_sale(container: &EthSaleContainer, passphrase: &str) -> WalletResult<PrivateKey> {
    let encseed = hex_decode("encseed", &container.encseed)?;
    if encseed.len() < 2 * BLOCK_SIZE {
        return Err(WalletError::InvalidInput(format!(
            "encseed too short: {} bytes",
            encseed.len()
        )));
    }
    let (iv, ciphertext) = encseed.split_at(BLOCK_SIZE);

    debug!(subsystem = "wallet", op = "decode", format = "ethsale", "Decrypting pre-sale wallet");

    let derived = password_as_salt_pbkdf2(passphrase.as_bytes(), PRESALE_PBKDF2_ITERATIONS, 32)?;
    let seed = match cipher::decrypt(
        CipherKind::Aes128Cbc,
        derived.slice(0..16)?,
        Some(iv),
        ciphertext,
    ) {
        Ok(seed) => seed,
        Err(WalletError::InvalidPadding) => {
            warn!(subsystem = "wallet", format = "ethsale", "Invalid padding after decryption");
            return Err(WalletError::auth("Decoded key mismatch"));
        }
        Err(e) => return Err(e),
    };

    let key = PrivateKey::from_slice(&keccak256(&seed))?;
    let address = key.public_key()?.to_address();
    if !addresses_match(&address.to_hex(), &container.ethaddr) {
        warn!(subsystem = "wallet", format = "ethsale", "Recovered address mismatch");
        return Err(WalletError::auth("Decoded key mismatch"));
    }
    Ok(key)
}
