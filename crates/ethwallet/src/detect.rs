//! Format detection for JSON wallet containers.
//!
//! Probes top-level fields only; no decryption is attempted.

use serde_json::Value;
use tracing::debug;

use crate::error::{WalletError, WalletResult};
use crate::format::ContainerFormat;

/// Detect the container layout of a JSON wallet.
///
/// - `"version": 3` → V3
/// - `"Version": "1"` → V1
/// - `encseed` present → EthSale
/// - `private` and `address` present → EtherWallet
///
/// Anything else, including other version numbers, is `UnsupportedFormat`.
pub fn detect_format(json: &str) -> WalletResult<ContainerFormat> {
    let value: Value = serde_json::from_str(json)?;
    let object = value
        .as_object()
        .ok_or_else(|| WalletError::UnsupportedFormat("Wallet JSON is not an object".into()))?;

    let format = if let Some(version) = object.get("version") {
        match version.as_u64() {
            Some(3) => ContainerFormat::V3,
            _ => {
                return Err(WalletError::UnsupportedFormat(format!(
                    "Unsupported key store version {}",
                    version
                )))
            }
        }
    } else if let Some(version) = object.get("Version") {
        match version.as_str() {
            Some("1") => ContainerFormat::V1,
            _ => {
                return Err(WalletError::UnsupportedFormat(format!(
                    "Unsupported key store version {}",
                    version
                )))
            }
        }
    } else if object.contains_key("encseed") {
        ContainerFormat::EthSale
    } else if object.contains_key("private") && object.contains_key("address") {
        ContainerFormat::EtherWallet
    } else {
        return Err(WalletError::UnsupportedFormat(
            "Unrecognised wallet container".into(),
        ));
    };

    debug!(subsystem = "wallet", op = "detect", format = %format, "Detected container format");
    Ok(format)
}

/// Check if the JSON is a key store (V3 or V1) container.
pub fn is_keystore(json: &str) -> bool {
    matches!(
        detect_format(json),
        Ok(ContainerFormat::V3) | Ok(ContainerFormat::V1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_v3() {
        let json = r#"{"version":3,"id":"x","crypto":{}}"#;
        assert_eq!(detect_format(json).unwrap(), ContainerFormat::V3);
        assert!(is_keystore(json));
    }

    #[test]
    fn test_detect_v1() {
        let json = r#"{"Version":"1","Crypto":{}}"#;
        assert_eq!(detect_format(json).unwrap(), ContainerFormat::V1);
        assert!(is_keystore(json));
    }

    #[test]
    fn test_detect_eth_sale() {
        let json = r#"{"encseed":"00","ethaddr":"00","email":"","btcaddr":""}"#;
        assert_eq!(detect_format(json).unwrap(), ContainerFormat::EthSale);
        assert!(!is_keystore(json));
    }

    #[test]
    fn test_detect_ether_wallet() {
        let json = r#"{"address":"0x00","private":"00","locked":false}"#;
        assert_eq!(detect_format(json).unwrap(), ContainerFormat::EtherWallet);
    }

    #[test]
    fn test_detect_unknown_version() {
        let result = detect_format(r#"{"version":2}"#);
        assert!(matches!(result, Err(WalletError::UnsupportedFormat(_))));
        let result = detect_format(r#"{"Version":"2"}"#);
        assert!(matches!(result, Err(WalletError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_detect_unrecognised() {
        let result = detect_format(r#"{"foo":"bar"}"#);
        assert!(matches!(result, Err(WalletError::UnsupportedFormat(_))));
        let result = detect_format("[1,2,3]");
        assert!(matches!(result, Err(WalletError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_detect_invalid_json() {
        let result = detect_format("{not json");
        assert!(matches!(result, Err(WalletError::Json(_))));
        assert!(!is_keystore("{not json"));
    }
}
