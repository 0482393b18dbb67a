//! # ethwallet
//!
//! Encrypted private-key containers for Ethereum wallets.
//!
//! This crate generates secp256k1 private keys, writes them to Web3 Secret
//! Storage (V3) containers and reads them back from V3 and from the older
//! formats still found in the wild: V1 key stores, pre-sale wallets,
//! MyEtherWallet exports, KryptoKit entropy, and the EtherCamp and
//! QuorumWallet brain wallets.
//!
//! ## Cryptographic Primitives
//!
//! - **Key derivation**: scrypt, PBKDF2-HMAC-SHA256, OpenSSL `EVP_BytesToKey`
//! - **Ciphers**: AES-128/256 in CTR, CBC (PKCS#7) and ECB modes
//! - **MAC**: Keccak-256 over the second half of the derived key and the ciphertext
//! - **Addresses**: last 20 bytes of Keccak-256 of the public key, EIP-55 checksums
//!
//! ## V3 Container
//!
//! ```text
//! {
//!   "version": 3,
//!   "id": "<uuid v4>",
//!   "address": "<hex>",
//!   "Crypto": {
//!     "ciphertext": "<hex>",
//!     "cipherparams": { "iv": "<hex>" },
//!     "cipher": "aes-128-ctr",
//!     "kdf": "scrypt" | "pbkdf2",
//!     "kdfparams": { "dklen", "salt", "n", "r", "p" | "c", "prf" },
//!     "mac": "<hex>"
//!   }
//! }
//! ```
//!
//! ## Examples
//!
//! ### Generate and Encrypt
//!
//! ```rust
//! use ethwallet::{V3Options, Wallet};
//!
//! let wallet = Wallet::generate().unwrap();
//! println!("Address: {}", wallet.checksum_address_string());
//!
//! # let opts = V3Options { n: 1024, ..V3Options::default() };
//! let json = wallet.to_v3_string("my-passphrase", &opts).unwrap();
//! let restored = Wallet::from_v3(&json, "my-passphrase").unwrap();
//! assert_eq!(restored.address(), wallet.address());
//! ```
//!
//! ### Decode Any Supported JSON Container
//!
//! ```rust,no_run
//! use ethwallet::Container;
//!
//! let json = std::fs::read_to_string("wallet.json").unwrap();
//! let wallet = Container::from_json(&json)
//!     .and_then(|c| c.decrypt("my-passphrase"))
//!     .unwrap();
//! println!("{}", wallet.address_string());
//! ```
//!
//! ### Format Detection
//!
//! ```rust
//! use ethwallet::{detect_format, ContainerFormat};
//!
//! let json = r#"{"encseed":"00","ethaddr":"00"}"#;
//! assert_eq!(detect_format(json).unwrap(), ContainerFormat::EthSale);
//! ```

pub mod cipher;
pub mod detect;
pub mod error;
pub mod format;
pub mod hash;
pub mod kdf;
pub mod legacy;
pub mod wallet;

// Re-export commonly used types
pub use cipher::CipherKind;
pub use detect::{detect_format, is_keystore};
pub use error::{WalletError, WalletResult};
pub use format::ContainerFormat;
pub use kdf::{derive_key, DerivedKey, KdfAlgorithm, KdfParams};
pub use wallet::{
    Address, Container, EthSaleContainer, EtherWalletContainer, GenerateOptions, PrivateKey,
    PublicKey, V1Container, V3Container, V3Options, Wallet,
};

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn fast_opts() -> V3Options {
        V3Options {
            n: 1024,
            ..V3Options::default()
        }
    }

    /// Generate -> encode -> detect -> decode.
    #[test]
    fn test_full_v3_workflow() {
        let wallet = Wallet::generate().unwrap();
        let json = wallet.to_v3_string("correct horse", &fast_opts()).unwrap();

        assert_eq!(detect_format(&json).unwrap(), ContainerFormat::V3);
        assert!(is_keystore(&json));

        let restored = Container::from_json(&json)
            .unwrap()
            .decrypt("correct horse")
            .unwrap();
        assert_eq!(restored.private_key_string(), wallet.private_key_string());
        assert_eq!(restored.address_string(), wallet.address_string());

        // Wrong passphrase is an authentication failure, not a format error
        let err = Wallet::from_v3(&json, "battery staple").unwrap_err();
        assert!(err.is_authentication_failure());
        assert!(err.to_string().contains("possibly wrong passphrase"));
    }

    /// Decoded containers report the address stored in them.
    #[test]
    fn test_container_address_field() {
        let wallet = Wallet::from_private_key(&[0x42u8; 32]).unwrap();
        let container = wallet.to_v3("pw", &fast_opts()).unwrap();
        let stored: Address = container.address.as_deref().unwrap().parse().unwrap();
        assert_eq!(&stored, wallet.address());
    }

    /// ICAP-direct generation.
    #[test]
    fn test_icap_direct_generation() {
        let wallet = Wallet::generate_icap_direct().unwrap();
        assert!(wallet.address().is_icap_direct());
        assert!(wallet.address_string().starts_with("0x00"));
    }
}
