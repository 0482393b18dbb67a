//! Wallet value object and its container codecs.
//!
//! A [`Wallet`] is a validated secp256k1 private key together with its
//! public key and address. Wallets are created by generation, from raw key
//! bytes, or by decoding one of the supported containers:
//!
//! | Format | Entry point | Protection |
//! |--------|-------------|------------|
//! | Web3 Secret Storage V3 | [`Wallet::from_v3`] | scrypt / pbkdf2, AES-128-CTR, keccak MAC |
//! | V1 key store | [`Wallet::from_v1`] | scrypt, AES-128-CBC, keccak MAC |
//! | Pre-sale | [`Wallet::from_eth_sale`] | pbkdf2, AES-128-CBC, address check |
//! | MyEtherWallet | [`Wallet::from_ether_wallet`] | EVP_BytesToKey, AES-256-CBC, address check |
//! | EtherCamp | [`Wallet::from_ether_camp`] | keccak256 of the passphrase |
//! | KryptoKit | [`Wallet::from_kryptokit`] | scrypt, AES-256-ECB, optional checksum |
//! | QuorumWallet | [`Wallet::from_quorum_wallet`] | pbkdf2 of passphrase and user id |
//!
//! Only V3 can be written.

pub mod address;
pub mod config;
pub mod container;
pub mod etherwallet;
pub mod keys;
pub mod kryptokit;
pub mod presale;
pub mod quorum;
pub mod v1;
pub mod v3;

use rand::RngCore;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{WalletError, WalletResult};

pub use address::{Address, ADDRESS_LENGTH};
pub use config::{GenerateOptions, V3Options};
pub use container::Container;
pub use etherwallet::EtherWalletContainer;
pub use keys::{PrivateKey, PublicKey, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
pub use presale::EthSaleContainer;
pub use v1::V1Container;
pub use v3::V3Container;

/// A private key with its derived public key and address.
///
/// Immutable once constructed. The private key is zeroized on drop.
#[derive(Clone)]
pub struct Wallet {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: Address,
}

impl Wallet {
    /// Wrap an already validated private key.
    pub fn from_key(private_key: PrivateKey) -> WalletResult<Self> {
        let public_key = private_key.public_key()?;
        let address = public_key.to_address();
        Ok(Self {
            private_key,
            public_key,
            address,
        })
    }

    /// Create a wallet from 32 raw private key bytes.
    pub fn from_private_key(bytes: &[u8]) -> WalletResult<Self> {
        Self::from_key(PrivateKey::from_slice(bytes)?)
    }

    /// Generate a new random wallet.
    pub fn generate() -> WalletResult<Self> {
        Self::generate_with(&GenerateOptions::default())
    }

    /// Generate a wallet whose address starts with a zero byte.
    pub fn generate_icap_direct() -> WalletResult<Self> {
        Self::generate_with(&GenerateOptions::icap_direct())
    }

    /// Generate a new wallet using the thread-local CSPRNG.
    pub fn generate_with(opts: &GenerateOptions) -> WalletResult<Self> {
        Self::generate_with_rng(&mut rand::thread_rng(), opts)
    }

    /// Generate a new wallet from the given random source.
    ///
    /// Candidates that are not valid curve scalars, or that miss the
    /// ICAP-direct requirement when requested, are redrawn. Gives up with
    /// `GenerationExhausted` after `opts.max_attempts` draws.
    pub fn generate_with_rng<R: RngCore + ?Sized>(
        rng: &mut R,
        opts: &GenerateOptions,
    ) -> WalletResult<Self> {
        let mut candidate = [0u8; PRIVATE_KEY_LENGTH];

        for attempt in 1..=opts.max_attempts {
            rng.fill_bytes(&mut candidate);
            let key = match PrivateKey::from_slice(&candidate) {
                Ok(key) => key,
                Err(_) => continue,
            };
            let wallet = Self::from_key(key)?;
            if opts.icap_direct && !wallet.address.is_icap_direct() {
                continue;
            }

            candidate.zeroize();
            if attempt > 1 {
                debug!(subsystem = "wallet", op = "generate", attempts = attempt, "Accepted key after retries");
            }
            return Ok(wallet);
        }

        candidate.zeroize();
        debug!(subsystem = "wallet", op = "generate", attempts = opts.max_attempts, "Generation exhausted");
        Err(WalletError::GenerationExhausted(opts.max_attempts))
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Private key as `0x`-prefixed lowercase hex.
    pub fn private_key_string(&self) -> String {
        format!("0x{}", hex::encode(self.private_key.as_bytes()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Public key (64 bytes, `x ‖ y`) as `0x`-prefixed lowercase hex.
    pub fn public_key_string(&self) -> String {
        format!("0x{}", hex::encode(self.public_key.as_bytes()))
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Address as `0x`-prefixed lowercase hex.
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }

    /// Address with EIP-55 mixed-case checksum.
    pub fn checksum_address_string(&self) -> String {
        self.address.to_checksum()
    }

    /// Encrypt into a V3 container.
    pub fn to_v3(&self, passphrase: &str, opts: &V3Options) -> WalletResult<V3Container> {
        v3::encrypt_v3(&self.private_key, &self.address, passphrase, opts)
    }

    /// Encrypt into V3 container JSON.
    pub fn to_v3_string(&self, passphrase: &str, opts: &V3Options) -> WalletResult<String> {
        self.to_v3(passphrase, opts)?.to_json()
    }

    /// Decode V3 container JSON.
    pub fn from_v3(json: &str, passphrase: &str) -> WalletResult<Self> {
        let container = V3Container::from_json(json)?;
        Self::from_key(v3::decrypt_v3(&container, passphrase)?)
    }

    /// Decode V1 container JSON.
    pub fn from_v1(json: &str, passphrase: &str) -> WalletResult<Self> {
        let container = V1Container::from_json(json)?;
        Self::from_key(v1::decrypt_v1(&container, passphrase)?)
    }

    /// Decode a pre-sale wallet.
    pub fn from_eth_sale(json: &str, passphrase: &str) -> WalletResult<Self> {
        let container = EthSaleContainer::from_json(json)?;
        Self::from_key(presale::decrypt_eth_sale(&container, passphrase)?)
    }

    /// Decode a MyEtherWallet export. Unlocked exports need no passphrase.
    pub fn from_ether_wallet(json: &str, passphrase: Option<&str>) -> WalletResult<Self> {
        let container = EtherWalletContainer::from_json(json)?;
        Self::from_key(etherwallet::decrypt_ether_wallet(&container, passphrase)?)
    }

    /// EtherCamp brain wallet.
    pub fn from_ether_camp(passphrase: &str) -> WalletResult<Self> {
        Self::from_key(quorum::derive_ether_camp(passphrase)?)
    }

    /// KryptoKit entropy string. Encrypted (`q`) entropy needs a passphrase.
    pub fn from_kryptokit(entropy: &str, passphrase: Option<&str>) -> WalletResult<Self> {
        Self::from_key(kryptokit::decrypt_kryptokit(entropy, passphrase)?)
    }

    /// QuorumWallet brain wallet.
    pub fn from_quorum_wallet(passphrase: &str, userid: &str) -> WalletResult<Self> {
        Self::from_key(quorum::derive_quorum_wallet(passphrase, userid)?)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
