//! Shared encoding utilities for container fields.

use std::fmt;

use base64::Engine;

use crate::error::{WalletError, WalletResult};

/// JSON wallet container layouts recognised by [`crate::detect_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Web3 Secret Storage, version 3.
    V3,
    /// Version 1 key store.
    V1,
    /// Ethereum pre-sale wallet.
    EthSale,
    /// MyEtherWallet export.
    EtherWallet,
}

impl ContainerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::V3 => "v3",
            ContainerFormat::V1 => "v1",
            ContainerFormat::EthSale => "ethsale",
            ContainerFormat::EtherWallet => "etherwallet",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a hex field, tolerating an optional `0x` prefix.
///
/// `field` names the container field in the error message.
pub fn hex_decode(field: &str, data: &str) -> WalletResult<Vec<u8>> {
    let data = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(data).map_err(|e| WalletError::InvalidInput(format!("Invalid hex in {}: {}", field, e)))
}

/// Decode a hex field that must have an exact byte length.
pub fn hex_decode_exact<const N: usize>(field: &str, data: &str) -> WalletResult<[u8; N]> {
    let bytes = hex_decode(field, data)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        WalletError::InvalidInput(format!(
            "Invalid {} length: expected {} bytes, got {}",
            field,
            N,
            v.len()
        ))
    })
}

/// Encode bytes as base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(data: &str) -> WalletResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| WalletError::InvalidInput(format!("Invalid base64: {}", e)))
}

/// Compare two hex addresses ignoring case and `0x` prefixes.
pub fn addresses_match(a: &str, b: &str) -> bool {
    let a = a.strip_prefix("0x").unwrap_or(a);
    let b = b.strip_prefix("0x").unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}

/// Serde adapter storing `Vec<u8>` as a lowercase hex string.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional hex byte strings.
pub(crate) mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => serializer.serialize_some(&hex::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| {
            let s = s.strip_prefix("0x").unwrap_or(&s).to_string();
            hex::decode(s).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_format_display() {
        assert_eq!(ContainerFormat::V3.to_string(), "v3");
        assert_eq!(format!("{:?}", ContainerFormat::EthSale), "EthSale");
    }

    #[test]
    fn test_hex_decode_with_prefix() {
        assert_eq!(hex_decode("iv", "0x0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(hex_decode("iv", "0aff").unwrap(), vec![0x0a, 0xff]);
    }

    #[test]
    fn test_hex_decode_invalid() {
        let result = hex_decode("ciphertext", "zz");
        match result {
            Err(WalletError::InvalidInput(msg)) => assert!(msg.contains("ciphertext")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_hex_decode_exact_length() {
        let iv: [u8; 2] = hex_decode_exact("iv", "0102").unwrap();
        assert_eq!(iv, [1, 2]);

        let result = hex_decode_exact::<16>("iv", "0102");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_base64_decodes_salted_header() {
        // Opening of a CryptoJS export: "Salted__" then the first salt bytes.
        let decoded = base64_decode("U2FsdGVkX1/hGPYl").unwrap();
        assert_eq!(&decoded[..8], b"Salted__");
        assert_eq!(decoded.len(), 12);
        assert_eq!(base64_encode(&decoded), "U2FsdGVkX1/hGPYl");
    }

    #[test]
    fn test_base64_decode_invalid() {
        let result = base64_decode("not valid base64!!!");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_addresses_match() {
        assert!(addresses_match(
            "0x008AEEDA4D805471DF9B2A5B0F38A0C3BCBA786B",
            "008aeeda4d805471df9b2a5b0f38a0c3bcba786b"
        ));
        assert!(!addresses_match(
            "0x008aeeda4d805471df9b2a5b0f38a0c3bcba786b",
            "0x108aeeda4d805471df9b2a5b0f38a0c3bcba786b"
        ));
    }
}
