//! Brain wallets: keys derived from memorised strings only.

use tracing::debug;

use crate::error::{WalletError, WalletResult};
use crate::hash::keccak256;
use crate::legacy::password_as_salt_pbkdf2;
use crate::wallet::keys::PrivateKey;

/// Minimum length of both the QuorumWallet passphrase and user id.
pub const QUORUM_MIN_LENGTH: usize = 10;

/// PBKDF2 iterations used by QuorumWallet.
pub const QUORUM_PBKDF2_ITERATIONS: u32 = 2000;

/// EtherCamp: the private key is `keccak256(passphrase)`.
pub fn derive_ether_camp(passphrase: &str) -> WalletResult<PrivateKey> {
    debug!(subsystem = "wallet", op = "decode", format = "ethercamp", "Deriving EtherCamp key");
    PrivateKey::from_slice(&keccak256(passphrase.as_bytes()))
}

/// QuorumWallet: `pbkdf2(passphrase ‖ userid, passphrase ‖ userid, 2000, 32)`.
///
/// Both inputs must be at least ten characters; the check runs before any
/// derivation.
pub fn derive_quorum_wallet(passphrase: &str, userid: &str) -> WalletResult<PrivateKey> {
    if passphrase.chars().count() < QUORUM_MIN_LENGTH || userid.chars().count() < QUORUM_MIN_LENGTH {
        return Err(WalletError::PassphraseTooShort(QUORUM_MIN_LENGTH));
    }
    debug!(subsystem = "wallet", op = "decode", format = "quorum", "Deriving QuorumWallet key");

    let seed = format!("{}{}", passphrase, userid);
    let derived = password_as_salt_pbkdf2(seed.as_bytes(), QUORUM_PBKDF2_ITERATIONS, 32)?;
    PrivateKey::from_slice(derived.as_bytes())
}
