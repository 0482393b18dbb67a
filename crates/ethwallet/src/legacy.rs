//! Historical encoding quirks of third-party wallet formats.
//!
//! Each helper matches the vendor encoder byte for byte; exported
//! containers only decrypt if the quirk is reproduced exactly.

use crate::error::{WalletError, WalletResult};
use crate::format::base64_decode;
use crate::kdf::{pbkdf2_sha256, DerivedKey};

/// Marker at the start of OpenSSL/CryptoJS salted ciphertext.
pub const SALTED_MAGIC: &[u8; 8] = b"Salted__";

/// Length of the salt following [`SALTED_MAGIC`].
pub const SALTED_SALT_LEN: usize = 8;

/// Ciphertext split from an OpenSSL-style salted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedCiphertext {
    /// Salt, when the `Salted__` marker was present.
    pub salt: Option<[u8; SALTED_SALT_LEN]>,
    pub ciphertext: Vec<u8>,
}

/// Split a raw salted blob: `"Salted__" ‖ salt[8] ‖ ciphertext`.
///
/// Without the marker the whole input is ciphertext and there is no salt.
pub fn split_salted(raw: &[u8]) -> WalletResult<SaltedCiphertext> {
    if raw.len() >= SALTED_MAGIC.len() && &raw[..SALTED_MAGIC.len()] == SALTED_MAGIC {
        let body = &raw[SALTED_MAGIC.len()..];
        if body.len() < SALTED_SALT_LEN {
            return Err(WalletError::InvalidInput(
                "Salted ciphertext truncated before end of salt".into(),
            ));
        }
        let mut salt = [0u8; SALTED_SALT_LEN];
        salt.copy_from_slice(&body[..SALTED_SALT_LEN]);
        Ok(SaltedCiphertext {
            salt: Some(salt),
            ciphertext: body[SALTED_SALT_LEN..].to_vec(),
        })
    } else {
        Ok(SaltedCiphertext {
            salt: None,
            ciphertext: raw.to_vec(),
        })
    }
}

/// Base64-decode and split a salted blob, as CryptoJS writes them.
pub fn decode_salted_base64(input: &str) -> WalletResult<SaltedCiphertext> {
    split_salted(&base64_decode(input)?)
}

/// PBKDF2-HMAC-SHA256 using the passphrase as its own salt.
pub fn password_as_salt_pbkdf2(passphrase: &[u8], c: u32, dklen: usize) -> WalletResult<DerivedKey> {
    pbkdf2_sha256(passphrase, passphrase, c, dklen)
}

/// Replay a lossy binary → string → UTF-8 conversion.
///
/// Bytes `<= 0x7F` pass through. Each maximal run of bytes `> 0x7F` is
/// decoded as UTF-8 as a whole; if the run is not valid UTF-8 it collapses
/// into a single U+FFFD. The result is the UTF-8 encoding of that string.
pub fn broken_utf8_roundtrip(input: &[u8]) -> Vec<u8> {
    let mut out = String::with_capacity(input.len());
    let mut run: Vec<u8> = Vec::new();

    for &byte in input {
        if byte <= 0x7F {
            flush_high_run(&mut run, &mut out);
            out.push(char::from(byte));
        } else {
            run.push(byte);
        }
    }
    flush_high_run(&mut run, &mut out);

    out.into_bytes()
}

fn flush_high_run(run: &mut Vec<u8>, out: &mut String) {
    if run.is_empty() {
        return;
    }
    match std::str::from_utf8(run) {
        Ok(s) => out.push_str(s),
        Err(_) => out.push(char::REPLACEMENT_CHARACTER),
    }
    run.clear();
}

/// Undo a string that went through UTF-8 encoding twice.
///
/// The input is decoded as UTF-8; every resulting code point must fit in a
/// byte, and those bytes are decoded as UTF-8 again. For ASCII input this is
/// the identity.
pub fn decode_double_utf8(input: &[u8]) -> WalletResult<String> {
    let once = std::str::from_utf8(input)
        .map_err(|e| WalletError::InvalidInput(format!("Decrypted data is not UTF-8: {}", e)))?;

    let mut bytes = Vec::with_capacity(once.len());
    for c in once.chars() {
        let code = u32::from(c);
        if code > 0xFF {
            return Err(WalletError::InvalidInput(format!(
                "Code point U+{:04X} is not a byte",
                code
            )));
        }
        bytes.push(code as u8);
    }

    String::from_utf8(bytes)
        .map_err(|e| WalletError::InvalidInput(format!("Inner data is not UTF-8: {}", e)))
}
