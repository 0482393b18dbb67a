//! AES in CTR, CBC and ECB modes, plus the random-byte source.
//!
//! CBC applies PKCS#7 padding on encrypt and validates/strips it on decrypt.
//! CTR and ECB are unpadded; ECB input must be a whole number of blocks.

use std::fmt;
use std::str::FromStr;

use aes::cipher::{
    block_padding::Pkcs7, Block, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut,
    KeyInit, KeyIvInit, StreamCipher,
};
use aes::{Aes128, Aes256};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Fill a fixed-size array from the thread-local CSPRNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// One block of fresh randomness, for CTR and CBC initial vectors.
pub fn random_iv() -> [u8; BLOCK_SIZE] {
    random_bytes()
}

/// Block-cipher chaining mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Ctr,
    Cbc,
    Ecb,
}

/// AES key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySize {
    Aes128,
    Aes256,
}

impl KeySize {
    pub fn bytes(&self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes256 => 32,
        }
    }
}

/// A named cipher as it appears in containers, e.g. `aes-128-ctr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CipherKind {
    #[default]
    Aes128Ctr,
    Aes256Ctr,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Ecb,
    Aes256Ecb,
}

impl CipherKind {
    /// Wire name used in containers.
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherKind::Aes128Ctr => "aes-128-ctr",
            CipherKind::Aes256Ctr => "aes-256-ctr",
            CipherKind::Aes128Cbc => "aes-128-cbc",
            CipherKind::Aes256Cbc => "aes-256-cbc",
            CipherKind::Aes128Ecb => "aes-128-ecb",
            CipherKind::Aes256Ecb => "aes-256-ecb",
        }
    }

    pub fn mode(&self) -> CipherMode {
        match self {
            CipherKind::Aes128Ctr | CipherKind::Aes256Ctr => CipherMode::Ctr,
            CipherKind::Aes128Cbc | CipherKind::Aes256Cbc => CipherMode::Cbc,
            CipherKind::Aes128Ecb | CipherKind::Aes256Ecb => CipherMode::Ecb,
        }
    }

    pub fn key_size(&self) -> KeySize {
        match self {
            CipherKind::Aes128Ctr | CipherKind::Aes128Cbc | CipherKind::Aes128Ecb => {
                KeySize::Aes128
            }
            CipherKind::Aes256Ctr | CipherKind::Aes256Cbc | CipherKind::Aes256Ecb => {
                KeySize::Aes256
            }
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-128-ctr" => Ok(CipherKind::Aes128Ctr),
            "aes-256-ctr" => Ok(CipherKind::Aes256Ctr),
            "aes-128-cbc" => Ok(CipherKind::Aes128Cbc),
            "aes-256-cbc" => Ok(CipherKind::Aes256Cbc),
            "aes-128-ecb" => Ok(CipherKind::Aes128Ecb),
            "aes-256-ecb" => Ok(CipherKind::Aes256Ecb),
            other => Err(WalletError::UnsupportedAlgorithm(format!(
                "cipher '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for CipherKind {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CipherKind> for String {
    fn from(value: CipherKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Encrypt `plaintext` with the named cipher.
///
/// `iv` is required for CTR and CBC and ignored for ECB.
pub fn encrypt(
    cipher: CipherKind,
    key: &[u8],
    iv: Option<&[u8]>,
    plaintext: &[u8],
) -> WalletResult<Vec<u8>> {
    transform(cipher, key, iv, plaintext, Direction::Encrypt)
}

/// Decrypt `ciphertext` with the named cipher.
///
/// `iv` is required for CTR and CBC and ignored for ECB.
pub fn decrypt(
    cipher: CipherKind,
    key: &[u8],
    iv: Option<&[u8]>,
    ciphertext: &[u8],
) -> WalletResult<Vec<u8>> {
    transform(cipher, key, iv, ciphertext, Direction::Decrypt)
}

/// Decrypt with a cipher given by its container name.
///
/// Unknown names fail with `UnsupportedAlgorithm`.
pub fn decrypt_named(
    cipher: &str,
    key: &[u8],
    iv: Option<&[u8]>,
    ciphertext: &[u8],
) -> WalletResult<Vec<u8>> {
    decrypt(cipher.parse()?, key, iv, ciphertext)
}

fn transform(
    cipher: CipherKind,
    key: &[u8],
    iv: Option<&[u8]>,
    data: &[u8],
    direction: Direction,
) -> WalletResult<Vec<u8>> {
    let size = cipher.key_size();
    if key.len() != size.bytes() {
        return Err(WalletError::InvalidInput(format!(
            "Invalid key length for {}: expected {}, got {}",
            cipher,
            size.bytes(),
            key.len()
        )));
    }

    match cipher.mode() {
        CipherMode::Ctr => {
            let iv = require_iv(cipher, iv)?;
            let mut buf = data.to_vec();
            match size {
                KeySize::Aes128 => ctr::Ctr128BE::<Aes128>::new_from_slices(key, iv)
                    .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                    .apply_keystream(&mut buf),
                KeySize::Aes256 => ctr::Ctr128BE::<Aes256>::new_from_slices(key, iv)
                    .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                    .apply_keystream(&mut buf),
            }
            Ok(buf)
        }
        CipherMode::Cbc => {
            let iv = require_iv(cipher, iv)?;
            match direction {
                Direction::Encrypt => Ok(match size {
                    KeySize::Aes128 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
                        .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                        .encrypt_padded_vec_mut::<Pkcs7>(data),
                    KeySize::Aes256 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
                        .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                        .encrypt_padded_vec_mut::<Pkcs7>(data),
                }),
                Direction::Decrypt => {
                    require_whole_blocks(cipher, data)?;
                    let plaintext = match size {
                        KeySize::Aes128 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
                            .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                            .decrypt_padded_vec_mut::<Pkcs7>(data),
                        KeySize::Aes256 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
                            .map_err(|e| WalletError::InvalidInput(e.to_string()))?
                            .decrypt_padded_vec_mut::<Pkcs7>(data),
                    };
                    plaintext.map_err(|_| WalletError::InvalidPadding)
                }
            }
        }
        CipherMode::Ecb => {
            require_whole_blocks(cipher, data)?;
            let out = match size {
                KeySize::Aes128 => ecb_blocks(
                    Aes128::new_from_slice(key)
                        .map_err(|e| WalletError::InvalidInput(e.to_string()))?,
                    data,
                    direction,
                ),
                KeySize::Aes256 => ecb_blocks(
                    Aes256::new_from_slice(key)
                        .map_err(|e| WalletError::InvalidInput(e.to_string()))?,
                    data,
                    direction,
                ),
            };
            Ok(out)
        }
    }
}

fn require_iv<'a>(cipher: CipherKind, iv: Option<&'a [u8]>) -> WalletResult<&'a [u8]> {
    match iv {
        Some(iv) if iv.len() == BLOCK_SIZE => Ok(iv),
        Some(iv) => Err(WalletError::InvalidInput(format!(
            "Invalid IV length for {}: expected {}, got {}",
            cipher,
            BLOCK_SIZE,
            iv.len()
        ))),
        None => Err(WalletError::InvalidInput(format!("{} requires an IV", cipher))),
    }
}

fn require_whole_blocks(cipher: CipherKind, data: &[u8]) -> WalletResult<()> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(WalletError::InvalidInput(format!(
            "{} input must be a multiple of {} bytes, got {}",
            cipher,
            BLOCK_SIZE,
            data.len()
        )));
    }
    Ok(())
}

fn ecb_blocks<C: BlockEncrypt + BlockDecrypt>(cipher: C, data: &[u8], direction: Direction) -> Vec<u8> {
    let mut out = data.to_vec();
    for chunk in out.chunks_exact_mut(BLOCK_SIZE) {
        let block = Block::<C>::from_mut_slice(chunk);
        match direction {
            Direction::Encrypt => cipher.encrypt_block(block),
            Direction::Decrypt => cipher.decrypt_block(block),
        }
    }
    out
}
