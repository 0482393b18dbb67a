//! KryptoKit entropy strings.
//!
//! Entropy is `[#]<type><payload>`. Type `d` hashes the payload directly;
//! type `q` holds a passphrase-protected seed in its first 30 characters,
//! optionally followed by a 16 hex character checksum.

use tracing::{debug, warn};

use crate::cipher::{self, CipherKind, BLOCK_SIZE};
use crate::error::{WalletError, WalletResult};
use crate::hash::sha256;
use crate::kdf::scrypt;
use crate::legacy::broken_utf8_roundtrip;
use crate::wallet::keys::PrivateKey;

/// scrypt parameters used by KryptoKit.
pub const KRYPTOKIT_SCRYPT_N: u32 = 16_384;
pub const KRYPTOKIT_SCRYPT_R: u32 = 8;
pub const KRYPTOKIT_SCRYPT_P: u32 = 1;

const SEED_CHARS: usize = 30;
const CHECKSUM_CHARS: usize = 16;

/// Entropy type marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyKind {
    /// `d`: unencrypted.
    Direct,
    /// `q`: passphrase protected.
    Encrypted,
}

impl EntropyKind {
    fn from_char(c: char) -> WalletResult<Self> {
        match c {
            'd' => Ok(Self::Direct),
            'q' => Ok(Self::Encrypted),
            other => Err(WalletError::UnsupportedFormat(format!(
                "Unsupported or invalid entropy type '{}'",
                other
            ))),
        }
    }
}

/// Split entropy into its type and payload, dropping an optional leading `#`.
pub fn parse_entropy(entropy: &str) -> WalletResult<(EntropyKind, &str)> {
    let entropy = entropy.strip_prefix('#').unwrap_or(entropy);
    let mut chars = entropy.chars();
    let kind = chars
        .next()
        .ok_or_else(|| WalletError::UnsupportedFormat("Empty entropy".into()))?;
    Ok((EntropyKind::from_char(kind)?, chars.as_str()))
}

/// Recover the private key from KryptoKit entropy.
pub fn decrypt_kryptokit(entropy: &str, passphrase: Option<&str>) -> WalletResult<PrivateKey> {
    let (kind, payload) = parse_entropy(entropy)?;
    debug!(subsystem = "wallet", op = "decode", format = "kryptokit", kind = ?kind, "Decoding KryptoKit entropy");

    match kind {
        EntropyKind::Direct => PrivateKey::from_slice(&sha256(payload.as_bytes())),
        EntropyKind::Encrypted => {
            let passphrase = passphrase
                .ok_or_else(|| WalletError::InvalidInput("Password required".into()))?;
            decrypt_encrypted_seed(payload, passphrase)
        }
    }
}

fn decrypt_encrypted_seed(payload: &str, passphrase: &str) -> WalletResult<PrivateKey> {
    let seed_part: String = payload.chars().take(SEED_CHARS).collect();
    let checksum: String = payload
        .chars()
        .skip(SEED_CHARS)
        .take(CHECKSUM_CHARS)
        .collect();

    let encrypted_seed = sha256(seed_part.as_bytes());
    let salt = broken_utf8_roundtrip(&encrypted_seed);
    let aes_key = scrypt(
        passphrase.as_bytes(),
        &salt,
        KRYPTOKIT_SCRYPT_N,
        KRYPTOKIT_SCRYPT_R,
        KRYPTOKIT_SCRYPT_P,
        32,
    )?;

    let mut key = Vec::with_capacity(32);
    for block in encrypted_seed.chunks(BLOCK_SIZE) {
        key.extend(cipher::decrypt(
            CipherKind::Aes256Ecb,
            aes_key.as_bytes(),
            None,
            block,
        )?);
    }

    if !checksum.is_empty() {
        let expected = hex::encode(&sha256(&sha256(&key))[..8]);
        if !checksum.eq_ignore_ascii_case(&expected) {
            warn!(subsystem = "wallet", format = "kryptokit", "Checksum mismatch");
            return Err(WalletError::auth("Failed to decrypt input"));
        }
    }
    PrivateKey::from_slice(&key)
}
