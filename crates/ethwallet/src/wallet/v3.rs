//! Web3 Secret Storage (version 3) containers.
//!
//! ```text
//! derived = KDF(passphrase, salt)            scrypt or pbkdf2
//! ciphertext = AES(derived[0..16], iv, key)  cipher named in the container
//! mac = keccak256(derived[16..32] ‖ ciphertext)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cipher::{self, random_bytes, random_iv, CipherKind};
use crate::error::{WalletError, WalletResult};
use crate::format::{hex_bytes, hex_decode};
use crate::hash::{ct_eq, keccak256_concat};
use crate::kdf::{derive_key, DerivedKey, KdfAlgorithm, KdfParams, MAX_DKLEN};
use crate::wallet::address::Address;
use crate::wallet::config::{V3Options, DEFAULT_DKLEN};
use crate::wallet::keys::PrivateKey;

/// Container version written and accepted by this module.
pub const V3_VERSION: u32 = 3;

/// The only PBKDF2 PRF defined for V3.
pub const PBKDF2_PRF: &str = "hmac-sha256";

/// KDF salt length for newly written containers.
pub const SALT_LENGTH: usize = 32;

/// Canonical encrypted key container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3Container {
    pub version: u32,
    pub id: String,
    /// Informational; never trusted for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "Crypto", alias = "crypto")]
    pub crypto: V3Crypto,
}

/// The `Crypto` sub-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3Crypto {
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    /// Cipher name; parsed on decode so unknown names fail as unsupported.
    pub cipher: String,
    /// KDF name; parsed on decode so unknown names fail as unsupported.
    pub kdf: String,
    pub kdfparams: V3KdfParams,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

/// KDF parameters for either scrypt (`n`, `r`, `p`) or pbkdf2 (`c`, `prf`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3KdfParams {
    pub dklen: usize,
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prf: Option<String>,
}

impl V3KdfParams {
    fn to_params(&self, kdf: KdfAlgorithm) -> WalletResult<KdfParams> {
        if !(DEFAULT_DKLEN..=MAX_DKLEN).contains(&self.dklen) {
            return Err(WalletError::InvalidInput(format!(
                "dklen must be between {} and {}, got {}",
                DEFAULT_DKLEN, MAX_DKLEN, self.dklen
            )));
        }
        match kdf {
            KdfAlgorithm::Scrypt => Ok(KdfParams::Scrypt {
                n: required(self.n, "n")?,
                r: required(self.r, "r")?,
                p: required(self.p, "p")?,
                dklen: self.dklen,
            }),
            KdfAlgorithm::Pbkdf2 => {
                if self.prf.as_deref() != Some(PBKDF2_PRF) {
                    return Err(WalletError::UnsupportedAlgorithm(format!(
                        "PBKDF2 prf '{}'",
                        self.prf.as_deref().unwrap_or("<missing>")
                    )));
                }
                Ok(KdfParams::Pbkdf2 {
                    c: required(self.c, "c")?,
                    dklen: self.dklen,
                })
            }
            KdfAlgorithm::LegacyEvp => Err(WalletError::UnsupportedAlgorithm(
                "key derivation scheme 'evp' in V3 container".into(),
            )),
        }
    }
}

fn required(value: Option<u32>, name: &str) -> WalletResult<u32> {
    value.ok_or_else(|| WalletError::InvalidInput(format!("Missing kdfparams.{}", name)))
}

impl V3Container {
    /// Parse container JSON.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let container: V3Container = serde_json::from_str(json)?;
        container.check_version()?;
        Ok(container)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> WalletResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn check_version(&self) -> WalletResult<()> {
        if self.version != V3_VERSION {
            return Err(WalletError::UnsupportedFormat(format!(
                "Not a V3 wallet (version {})",
                self.version
            )));
        }
        Ok(())
    }
}

fn mac_for(derived: &DerivedKey, ciphertext: &[u8]) -> WalletResult<[u8; 32]> {
    Ok(keccak256_concat(&[derived.slice(16..32)?, ciphertext]))
}

/// Encrypt a private key into a V3 container.
pub fn encrypt_v3(
    key: &PrivateKey,
    address: &Address,
    passphrase: &str,
    opts: &V3Options,
) -> WalletResult<V3Container> {
    let params = opts.kdf_params()?;

    let salt = match &opts.salt {
        Some(salt) if salt.is_empty() => {
            return Err(WalletError::InvalidInput("Salt must not be empty".into()))
        }
        Some(salt) => salt.clone(),
        None => random_bytes::<SALT_LENGTH>().to_vec(),
    };
    let iv = match &opts.iv {
        Some(iv) => iv.clone(),
        None => random_iv().to_vec(),
    };
    let uuid_bytes: [u8; 16] = match &opts.uuid {
        Some(bytes) => bytes.as_slice().try_into().map_err(|_| {
            WalletError::InvalidInput(format!(
                "uuid must be 16 random bytes, got {}",
                bytes.len()
            ))
        })?,
        None => random_bytes(),
    };

    debug!(
        subsystem = "wallet",
        op = "encode",
        format = "v3",
        kdf = %opts.kdf,
        cipher = %opts.cipher,
        "Encrypting V3 container"
    );

    let derived = derive_key(passphrase.as_bytes(), &salt, &params)?;
    let ciphertext = cipher::encrypt(
        opts.cipher,
        derived.slice(0..16)?,
        Some(&iv),
        key.as_bytes(),
    )?;
    let mac = mac_for(&derived, &ciphertext)?;

    let kdfparams = match params {
        KdfParams::Scrypt { n, r, p, dklen } => V3KdfParams {
            dklen,
            salt,
            n: Some(n),
            r: Some(r),
            p: Some(p),
            c: None,
            prf: None,
        },
        KdfParams::Pbkdf2 { c, dklen } => V3KdfParams {
            dklen,
            salt,
            n: None,
            r: None,
            p: None,
            c: Some(c),
            prf: Some(PBKDF2_PRF.to_string()),
        },
        KdfParams::LegacyEvp(_) => {
            return Err(WalletError::UnsupportedAlgorithm(
                "key derivation scheme 'evp' in V3 container".into(),
            ))
        }
    };

    Ok(V3Container {
        version: V3_VERSION,
        id: uuid::Builder::from_random_bytes(uuid_bytes)
            .into_uuid()
            .to_string(),
        address: Some(address.to_hex()),
        crypto: V3Crypto {
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams {
                iv: hex::encode(&iv),
            },
            cipher: opts.cipher.to_string(),
            kdf: opts.kdf.to_string(),
            kdfparams,
            mac: hex::encode(mac),
        },
    })
}

/// Decrypt a V3 container, verifying the MAC before decrypting.
pub fn decrypt_v3(container: &V3Container, passphrase: &str) -> WalletResult<PrivateKey> {
    container.check_version()?;
    let crypto = &container.crypto;

    let cipher: CipherKind = crypto.cipher.parse()?;
    let kdf: KdfAlgorithm = crypto.kdf.parse()?;
    let params = crypto.kdfparams.to_params(kdf)?;

    let ciphertext = hex_decode("ciphertext", &crypto.ciphertext)?;
    let stored_mac = hex_decode("mac", &crypto.mac)?;
    let iv = hex_decode("iv", &crypto.cipherparams.iv)?;

    debug!(
        subsystem = "wallet",
        op = "decode",
        format = "v3",
        kdf = %kdf,
        cipher = %cipher,
        "Decrypting V3 container"
    );

    let derived = derive_key(passphrase.as_bytes(), &crypto.kdfparams.salt, &params)?;
    let mac = mac_for(&derived, &ciphertext)?;
    if !ct_eq(&mac, &stored_mac) {
        warn!(subsystem = "wallet", format = "v3", "MAC mismatch");
        return Err(WalletError::auth("Key derivation failed"));
    }

    let seed = cipher::decrypt(cipher, derived.slice(0..16)?, Some(&iv), &ciphertext)?;
    PrivateKey::from_slice(&seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> (PrivateKey, Address) {
        let key = PrivateKey::from_slice(&[0x11u8; 32]).unwrap();
        let address = key.public_key().unwrap().to_address();
        (key, address)
    }

    fn fast_opts() -> V3Options {
        V3Options {
            n: 1024,
            salt: Some(vec![0x42; 32]),
            iv: Some(vec![0x24; 16]),
            uuid: Some(vec![0x01; 16]),
            ..V3Options::default()
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (key, address) = test_key();
        let container = encrypt_v3(&key, &address, "testpassword", &fast_opts()).unwrap();

        assert_eq!(container.version, 3);
        assert_eq!(container.crypto.kdf, "scrypt");
        assert_eq!(container.crypto.cipher, "aes-128-ctr");
        assert_eq!(container.crypto.kdfparams.n, Some(1024));
        assert_eq!(container.address.as_deref(), Some(address.to_hex().as_str()));

        let decrypted = decrypt_v3(&container, "testpassword").unwrap();
        assert_eq!(decrypted.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_deterministic_with_fixed_options() {
        let (key, address) = test_key();
        let a = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        let b = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_uuid_is_version_4() {
        let (key, address) = test_key();
        let container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        let id = uuid::Uuid::parse_str(&container.id).unwrap();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn test_pbkdf2_roundtrip() {
        let (key, address) = test_key();
        let opts = V3Options {
            kdf: KdfAlgorithm::Pbkdf2,
            c: 1000,
            ..fast_opts()
        };
        let container = encrypt_v3(&key, &address, "pw", &opts).unwrap();
        assert_eq!(container.crypto.kdfparams.prf.as_deref(), Some("hmac-sha256"));
        assert_eq!(container.crypto.kdfparams.n, None);

        let decrypted = decrypt_v3(&container, "pw").unwrap();
        assert_eq!(decrypted.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_cbc_roundtrip() {
        let (key, address) = test_key();
        let opts = V3Options {
            cipher: CipherKind::Aes128Cbc,
            ..fast_opts()
        };
        let container = encrypt_v3(&key, &address, "pw", &opts).unwrap();
        // 32 bytes of key plus a full block of padding.
        assert_eq!(container.crypto.ciphertext.len(), 96);
        let decrypted = decrypt_v3(&container, "pw").unwrap();
        assert_eq!(decrypted.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_aes256_cipher_rejected_for_v3() {
        let (key, address) = test_key();
        let opts = V3Options {
            cipher: CipherKind::Aes256Ctr,
            ..fast_opts()
        };
        let result = encrypt_v3(&key, &address, "pw", &opts);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_wrong_passphrase() {
        let (key, address) = test_key();
        let container = encrypt_v3(&key, &address, "right", &fast_opts()).unwrap();
        let result = decrypt_v3(&container, "wrong");
        assert!(matches!(result, Err(WalletError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_unknown_cipher_is_unsupported() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.crypto.cipher = "aes-128-gcm".into();
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_unknown_kdf_is_unsupported() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.crypto.kdf = "argon2id".into();
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_unsupported_prf() {
        let (key, address) = test_key();
        let opts = V3Options {
            kdf: KdfAlgorithm::Pbkdf2,
            c: 10,
            ..fast_opts()
        };
        let mut container = encrypt_v3(&key, &address, "pw", &opts).unwrap();
        container.crypto.kdfparams.prf = Some("hmac-sha512".into());
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_missing_scrypt_param() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.crypto.kdfparams.r = None;
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_oversized_dklen_is_invalid_input() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.crypto.kdfparams.dklen = usize::MAX;
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        container.crypto.kdfparams.dklen = MAX_DKLEN + 1;
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_excessive_scrypt_cost_is_invalid_input() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.crypto.kdfparams.n = Some(1 << 31);
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        container.crypto.kdfparams.n = Some(1024);
        container.crypto.kdfparams.r = Some(u32::MAX);
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_fresh_containers_draw_new_salt_iv_and_id() {
        let (key, address) = test_key();
        let a = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        let b = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();

        assert_eq!(a.crypto.kdfparams.salt.len(), SALT_LENGTH);
        assert_eq!(a.crypto.cipherparams.iv.len(), 32);
        assert_ne!(a.crypto.kdfparams.salt, b.crypto.kdfparams.salt);
        assert_ne!(a.crypto.cipherparams.iv, b.crypto.cipherparams.iv);
        assert_ne!(a.id, b.id);
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
    }

    #[test]
    fn test_wrong_version() {
        let (key, address) = test_key();
        let mut container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        container.version = 2;
        let result = decrypt_v3(&container, "pw");
        assert!(matches!(result, Err(WalletError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_bad_uuid_length() {
        let (key, address) = test_key();
        let opts = V3Options {
            uuid: Some(vec![1, 2, 3]),
            ..fast_opts()
        };
        let result = encrypt_v3(&key, &address, "pw", &opts);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_json_uses_capitalised_crypto_and_accepts_lowercase() {
        let (key, address) = test_key();
        let container = encrypt_v3(&key, &address, "pw", &fast_opts()).unwrap();
        let json = container.to_json().unwrap();
        assert!(json.contains("\"Crypto\""));

        let lower = json.replace("\"Crypto\"", "\"crypto\"");
        let parsed = V3Container::from_json(&lower).unwrap();
        assert_eq!(parsed, container);
    }
}
