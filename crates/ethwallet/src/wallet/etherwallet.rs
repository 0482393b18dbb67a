//! MyEtherWallet JSON exports.
//!
//! Unlocked exports carry the private key as 64 hex characters. Locked
//! exports carry a CryptoJS "Salted__" base64 blob whose plaintext is the
//! hex private key, encrypted with AES-256-CBC under `EVP_BytesToKey(md5)`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cipher::{self, CipherKind};
use crate::error::{WalletError, WalletResult};
use crate::format::{addresses_match, hex_decode};
use crate::kdf::{evp_bytes_to_key, EvpDigest, EvpParams};
use crate::legacy::{decode_double_utf8, decode_salted_base64};
use crate::wallet::keys::PrivateKey;

/// Minimum passphrase length for locked exports.
pub const ETHERWALLET_MIN_PASSPHRASE: usize = 7;

/// Length of the salted blob inside `private` when `encrypted` is set.
/// The remainder is a short address hash.
const ENCRYPTED_BLOB_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherWalletContainer {
    pub address: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub locked: bool,
    pub private: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
}

impl EtherWalletContainer {
    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn evp_params() -> EvpParams {
    EvpParams {
        digest: EvpDigest::Md5,
        count: 1,
        key_size: 32,
        iv_size: 16,
    }
}

/// Recover the private key from a MyEtherWallet export.
///
/// `passphrase` is only needed for locked exports.
pub fn decrypt_ether_wallet(
    container: &EtherWalletContainer,
    passphrase: Option<&str>,
) -> WalletResult<PrivateKey> {
    debug!(
        subsystem = "wallet",
        op = "decode",
        format = "etherwallet",
        locked = container.locked,
        "Decoding MyEtherWallet export"
    );

    let key = if container.locked {
        let passphrase = passphrase
            .ok_or_else(|| WalletError::InvalidInput("Password required".into()))?;
        unlock(container, passphrase)?
    } else {
        if container.private.chars().count() != 64 {
            return Err(WalletError::InvalidInput(
                "Invalid private key length".into(),
            ));
        }
        PrivateKey::from_slice(&hex_decode("private", &container.private)?)?
    };

    let address = key.public_key()?.to_address();
    if !addresses_match(&address.to_hex(), &container.address) {
        warn!(subsystem = "wallet", format = "etherwallet", "Recovered address mismatch");
        return Err(WalletError::auth("Invalid private key or address"));
    }
    Ok(key)
}

fn unlock(container: &EtherWalletContainer, passphrase: &str) -> WalletResult<PrivateKey> {
    if passphrase.chars().count() < ETHERWALLET_MIN_PASSPHRASE {
        return Err(WalletError::PassphraseTooShort(ETHERWALLET_MIN_PASSPHRASE));
    }

    let blob: String = if container.encrypted {
        container.private.chars().take(ENCRYPTED_BLOB_CHARS).collect()
    } else {
        container.private.clone()
    };
    let salted = decode_salted_base64(&blob)?;
    let salt = salted.salt.map(|s| s.to_vec()).unwrap_or_default();

    let evp = evp_bytes_to_key(passphrase.as_bytes(), &salt, &evp_params())?;
    let plaintext = match cipher::decrypt(
        CipherKind::Aes256Cbc,
        evp.key.as_bytes(),
        Some(&evp.iv),
        &salted.ciphertext,
    ) {
        Ok(plaintext) => plaintext,
        Err(WalletError::InvalidPadding) => {
            warn!(subsystem = "wallet", format = "etherwallet", "Invalid padding after decryption");
            return Err(WalletError::auth("Invalid private key or address"));
        }
        Err(e) => return Err(e),
    };

    // Garbage plaintext with valid padding is still a wrong passphrase.
    decode_double_utf8(&plaintext)
        .and_then(|hex_key| hex_decode("private", &hex_key))
        .and_then(|bytes| PrivateKey::from_slice(&bytes))
        .map_err(|_| {
            warn!(subsystem = "wallet", format = "etherwallet", "Decrypted data is not a key");
            WalletError::auth("Invalid private key or address")
        })
}
