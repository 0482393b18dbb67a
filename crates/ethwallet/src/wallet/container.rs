//! Closed set of supported wallet containers.

use tracing::debug;

use crate::detect::detect_format;
use crate::error::WalletResult;
use crate::format::ContainerFormat;
use crate::wallet::etherwallet::{decrypt_ether_wallet, EtherWalletContainer};
use crate::wallet::kryptokit::decrypt_kryptokit;
use crate::wallet::presale::{decrypt_eth_sale, EthSaleContainer};
use crate::wallet::quorum::{derive_ether_camp, derive_quorum_wallet};
use crate::wallet::v1::{decrypt_v1, V1Container};
use crate::wallet::v3::{decrypt_v3, V3Container};
use crate::wallet::Wallet;

/// A wallet in one of the supported encodings, not yet decrypted.
///
/// The JSON layouts come from [`Container::from_json`]; the brain wallet
/// and entropy variants carry their non-secret input and take the secret
/// as the passphrase on [`Container::decrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    V3(V3Container),
    V1(V1Container),
    EthSale(EthSaleContainer),
    EtherWallet(EtherWalletContainer),
    /// Passphrase-only brain wallet.
    EtherCamp,
    KryptoKit { entropy: String },
    Quorum { userid: String },
}

impl Container {
    /// Detect the layout of `json` and parse it.
    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(match detect_format(json)? {
            ContainerFormat::V3 => Container::V3(V3Container::from_json(json)?),
            ContainerFormat::V1 => Container::V1(V1Container::from_json(json)?),
            ContainerFormat::EthSale => Container::EthSale(EthSaleContainer::from_json(json)?),
            ContainerFormat::EtherWallet => {
                Container::EtherWallet(EtherWalletContainer::from_json(json)?)
            }
        })
    }

    /// Short format name, as used in log fields.
    pub fn format_name(&self) -> &'static str {
        match self {
            Container::V3(_) => "v3",
            Container::V1(_) => "v1",
            Container::EthSale(_) => "ethsale",
            Container::EtherWallet(_) => "etherwallet",
            Container::EtherCamp => "ethercamp",
            Container::KryptoKit { .. } => "kryptokit",
            Container::Quorum { .. } => "quorum",
        }
    }

    /// Recover the wallet.
    pub fn decrypt(&self, passphrase: &str) -> WalletResult<Wallet> {
        debug!(subsystem = "wallet", op = "decode", format = self.format_name(), "Decoding container");
        let key = match self {
            Container::V3(c) => decrypt_v3(c, passphrase)?,
            Container::V1(c) => decrypt_v1(c, passphrase)?,
            Container::EthSale(c) => decrypt_eth_sale(c, passphrase)?,
            Container::EtherWallet(c) => decrypt_ether_wallet(c, Some(passphrase))?,
            Container::EtherCamp => derive_ether_camp(passphrase)?,
            Container::KryptoKit { entropy } => decrypt_kryptokit(entropy, Some(passphrase))?,
            Container::Quorum { userid } => derive_quorum_wallet(passphrase, userid)?,
        };
        Wallet::from_key(key)
    }
}
