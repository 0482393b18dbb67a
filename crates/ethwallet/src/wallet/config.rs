//! Encoding and generation options.

use serde::{Deserialize, Serialize};

use crate::cipher::CipherKind;
use crate::error::{WalletError, WalletResult};
use crate::format::hex_bytes_opt;
use crate::kdf::{KdfAlgorithm, KdfParams, MAX_DKLEN};

/// Default scrypt N (2^18).
pub const DEFAULT_SCRYPT_N: u32 = 262_144;
/// Default scrypt r.
pub const DEFAULT_SCRYPT_R: u32 = 8;
/// Default scrypt p.
pub const DEFAULT_SCRYPT_P: u32 = 1;
/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_C: u32 = 262_144;
/// Default derived key length.
pub const DEFAULT_DKLEN: usize = 32;
/// Default cap on ICAP-direct rejection sampling.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1 << 20;

/// Options for encoding a V3 container.
///
/// Every field has a default; `None` for `salt`, `iv` or `uuid` means
/// "draw fresh random bytes".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct V3Options {
    /// KDF salt (default: 32 random bytes).
    #[serde(with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub salt: Option<Vec<u8>>,
    /// Cipher IV (default: 16 random bytes).
    #[serde(with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub iv: Option<Vec<u8>>,
    /// Key derivation function (default: scrypt).
    pub kdf: KdfAlgorithm,
    /// Derived key length (default: 32, minimum 32).
    pub dklen: usize,
    /// scrypt CPU/memory cost.
    pub n: u32,
    /// scrypt block size.
    pub r: u32,
    /// scrypt parallelization.
    pub p: u32,
    /// PBKDF2 iteration count.
    pub c: u32,
    /// Cipher (default: aes-128-ctr).
    pub cipher: CipherKind,
    /// Random bytes for the container UUID (default: 16 random bytes).
    #[serde(with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Vec<u8>>,
}

impl Default for V3Options {
    fn default() -> Self {
        Self {
            salt: None,
            iv: None,
            kdf: KdfAlgorithm::Scrypt,
            dklen: DEFAULT_DKLEN,
            n: DEFAULT_SCRYPT_N,
            r: DEFAULT_SCRYPT_R,
            p: DEFAULT_SCRYPT_P,
            c: DEFAULT_PBKDF2_C,
            cipher: CipherKind::Aes128Ctr,
            uuid: None,
        }
    }
}

impl V3Options {
    /// Low-memory scrypt parameters (N = 4096, p = 6).
    pub fn light() -> Self {
        Self {
            n: 4096,
            p: 6,
            ..Self::default()
        }
    }

    /// PBKDF2 with the default iteration count.
    pub fn pbkdf2() -> Self {
        Self {
            kdf: KdfAlgorithm::Pbkdf2,
            ..Self::default()
        }
    }

    /// KDF parameters selected by these options.
    pub fn kdf_params(&self) -> WalletResult<KdfParams> {
        if !(DEFAULT_DKLEN..=MAX_DKLEN).contains(&self.dklen) {
            return Err(WalletError::InvalidInput(format!(
                "dklen must be between {} and {}, got {}",
                DEFAULT_DKLEN, MAX_DKLEN, self.dklen
            )));
        }
        match self.kdf {
            KdfAlgorithm::Scrypt => Ok(KdfParams::Scrypt {
                n: self.n,
                r: self.r,
                p: self.p,
                dklen: self.dklen,
            }),
            KdfAlgorithm::Pbkdf2 => Ok(KdfParams::Pbkdf2 {
                c: self.c,
                dklen: self.dklen,
            }),
            KdfAlgorithm::LegacyEvp => Err(WalletError::UnsupportedAlgorithm(
                "evp is not a V3 key derivation scheme".into(),
            )),
        }
    }
}

/// Options for key generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Only accept keys whose address starts with a zero byte.
    pub icap_direct: bool,
    /// Upper bound on candidate draws before giving up.
    pub max_attempts: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            icap_direct: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GenerateOptions {
    pub fn icap_direct() -> Self {
        Self {
            icap_direct: true,
            ..Self::default()
        }
    }
}
