//! Version 1 passphrase-protected key store containers.
//!
//! Same MAC as V3, but the cipher key is `keccak256(derived[0..16])[0..16]`
//! and the cipher is always AES-128-CBC.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cipher::{self, CipherKind};
use crate::error::{WalletError, WalletResult};
use crate::format::{hex_decode, hex_decode_exact};
use crate::hash::{ct_eq, keccak256, keccak256_concat};
use crate::kdf::{derive_key, KdfAlgorithm, KdfParams, MAX_DKLEN};
use crate::wallet::config::DEFAULT_DKLEN;
use crate::wallet::keys::PrivateKey;

/// Version marker of V1 containers.
pub const V1_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct V1Container {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub crypto: V1Crypto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1Crypto {
    #[serde(rename = "KeyHeader")]
    pub key_header: V1KeyHeader,
    #[serde(rename = "Salt")]
    pub salt: String,
    #[serde(rename = "CipherText")]
    pub cipher_text: String,
    #[serde(rename = "IV")]
    pub iv: String,
    #[serde(rename = "MAC")]
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct V1KeyHeader {
    pub kdf: String,
    pub kdf_params: V1KdfParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1KdfParams {
    #[serde(rename = "N")]
    pub n: u32,
    #[serde(rename = "R")]
    pub r: u32,
    #[serde(rename = "P")]
    pub p: u32,
    #[serde(rename = "DkLen")]
    pub dk_len: usize,
    #[serde(rename = "SaltLen", default, skip_serializing_if = "Option::is_none")]
    pub salt_len: Option<usize>,
}

impl V1Container {
    /// Parse container JSON.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let container: V1Container = serde_json::from_str(json)?;
        container.check_version()?;
        Ok(container)
    }

    fn check_version(&self) -> WalletResult<()> {
        if self.version != V1_VERSION {
            return Err(WalletError::UnsupportedFormat(format!(
                "Not a V1 wallet (version {:?})",
                self.version
            )));
        }
        Ok(())
    }
}

/// Decrypt a V1 container, verifying the MAC before decrypting.
pub fn decrypt_v1(container: &V1Container, passphrase: &str) -> WalletResult<PrivateKey> {
    container.check_version()?;
    let crypto = &container.crypto;

    let kdf: KdfAlgorithm = crypto.key_header.kdf.parse()?;
    if kdf != KdfAlgorithm::Scrypt {
        return Err(WalletError::UnsupportedAlgorithm(format!(
            "key derivation scheme '{}' in V1 container",
            kdf
        )));
    }
    let kp = &crypto.key_header.kdf_params;
    if !(DEFAULT_DKLEN..=MAX_DKLEN).contains(&kp.dk_len) {
        return Err(WalletError::InvalidInput(format!(
            "DkLen must be between {} and {}, got {}",
            DEFAULT_DKLEN, MAX_DKLEN, kp.dk_len
        )));
    }

    let salt = hex_decode("Salt", &crypto.salt)?;
    let ciphertext = hex_decode("CipherText", &crypto.cipher_text)?;
    let iv: [u8; 16] = hex_decode_exact("IV", &crypto.iv)?;
    let stored_mac = hex_decode("MAC", &crypto.mac)?;

    debug!(subsystem = "wallet", op = "decode", format = "v1", kdf = %kdf, "Decrypting V1 container");

    let params = KdfParams::Scrypt {
        n: kp.n,
        r: kp.r,
        p: kp.p,
        dklen: kp.dk_len,
    };
    let derived = derive_key(passphrase.as_bytes(), &salt, &params)?;

    let mac = keccak256_concat(&[derived.slice(16..32)?, &ciphertext]);
    if !ct_eq(&mac, &stored_mac) {
        warn!(subsystem = "wallet", format = "v1", "MAC mismatch");
        return Err(WalletError::auth("Key derivation failed"));
    }

    let cipher_key = keccak256(derived.slice(0..16)?);
    let seed = cipher::decrypt(
        CipherKind::Aes128Cbc,
        &cipher_key[..16],
        Some(&iv),
        &ciphertext,
    )?;
    PrivateKey::from_slice(&seed)
}
