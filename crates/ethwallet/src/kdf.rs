//! Key derivation: PBKDF2-HMAC-SHA256, scrypt and OpenSSL `EVP_BytesToKey`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{WalletError, WalletResult};

/// Largest derived key accepted from a container.
pub const MAX_DKLEN: usize = 64;

/// Largest scrypt `N` accepted from a container.
pub const MAX_SCRYPT_N: u32 = 1 << 20;

/// Largest scrypt working set, `128 * N * r` bytes.
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Largest scrypt `r * p`.
pub const MAX_SCRYPT_RP: u64 = 1 << 10;

/// Key derivation algorithm, by its container wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KdfAlgorithm {
    /// `pbkdf2` (PRF fixed to HMAC-SHA256).
    Pbkdf2,
    /// `scrypt`.
    Scrypt,
    /// `evp`, OpenSSL `EVP_BytesToKey` as implemented by CryptoJS.
    LegacyEvp,
}

impl KdfAlgorithm {
    /// Wire name used in containers.
    pub fn as_str(&self) -> &'static str {
        match self {
            KdfAlgorithm::Pbkdf2 => "pbkdf2",
            KdfAlgorithm::Scrypt => "scrypt",
            KdfAlgorithm::LegacyEvp => "evp",
        }
    }
}

impl fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KdfAlgorithm {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pbkdf2" => Ok(KdfAlgorithm::Pbkdf2),
            "scrypt" => Ok(KdfAlgorithm::Scrypt),
            "evp" => Ok(KdfAlgorithm::LegacyEvp),
            other => Err(WalletError::UnsupportedAlgorithm(format!(
                "key derivation scheme '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for KdfAlgorithm {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KdfAlgorithm> for String {
    fn from(value: KdfAlgorithm) -> Self {
        value.as_str().to_string()
    }
}

/// Digest used by each `EVP_BytesToKey` round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvpDigest {
    #[default]
    Md5,
    Sha256,
}

impl EvpDigest {
    fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            EvpDigest::Md5 => {
                let mut ctx = md5::Context::new();
                for part in parts {
                    ctx.consume(part);
                }
                ctx.compute().0.to_vec()
            }
            EvpDigest::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            }
        }
    }
}

/// `EVP_BytesToKey` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvpParams {
    /// Digest per round (default: MD5).
    pub digest: EvpDigest,
    /// Hash applications per block, including the first (default: 1).
    pub count: usize,
    /// Key bytes to produce (default: 16).
    pub key_size: usize,
    /// IV bytes to produce after the key (default: 16).
    pub iv_size: usize,
}

impl Default for EvpParams {
    fn default() -> Self {
        Self {
            digest: EvpDigest::Md5,
            count: 1,
            key_size: 16,
            iv_size: 16,
        }
    }
}

/// Algorithm together with its cost parameters and output length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    Pbkdf2 {
        /// Iteration count.
        c: u32,
        /// Derived key length in bytes.
        dklen: usize,
    },
    Scrypt {
        /// CPU/memory cost, a power of two.
        n: u32,
        /// Block size.
        r: u32,
        /// Parallelization.
        p: u32,
        /// Derived key length in bytes.
        dklen: usize,
    },
    LegacyEvp(EvpParams),
}

impl KdfParams {
    /// The algorithm these parameters belong to.
    pub fn algorithm(&self) -> KdfAlgorithm {
        match self {
            KdfParams::Pbkdf2 { .. } => KdfAlgorithm::Pbkdf2,
            KdfParams::Scrypt { .. } => KdfAlgorithm::Scrypt,
            KdfParams::LegacyEvp(_) => KdfAlgorithm::LegacyEvp,
        }
    }
}

/// Derived key material, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
}

impl DerivedKey {
    /// Wrap raw key material.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Sub-range of the key, or `InvalidInput` when the key is too short.
    pub fn slice(&self, range: std::ops::Range<usize>) -> WalletResult<&[u8]> {
        let len = self.key.len();
        self.key.get(range.clone()).ok_or_else(|| {
            WalletError::InvalidInput(format!(
                "Derived key too short: need bytes {}..{}, have {}",
                range.start, range.end, len
            ))
        })
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Key and IV produced by `EVP_BytesToKey`.
pub struct EvpKey {
    pub key: DerivedKey,
    pub iv: Vec<u8>,
}

impl Drop for EvpKey {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

impl fmt::Debug for EvpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvpKey")
            .field("key", &self.key)
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Reject output lengths a container cannot legitimately ask for.
pub fn check_dklen(dklen: usize) -> WalletResult<()> {
    if dklen > MAX_DKLEN {
        return Err(WalletError::InvalidInput(format!(
            "Derived key length {} exceeds {}",
            dklen, MAX_DKLEN
        )));
    }
    Ok(())
}

/// Derive key material from a passphrase and salt.
///
/// For [`KdfParams::LegacyEvp`] the result is `key ‖ iv`.
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> WalletResult<DerivedKey> {
    match params {
        KdfParams::Pbkdf2 { c, dklen } => pbkdf2_sha256(passphrase, salt, *c, *dklen),
        KdfParams::Scrypt { n, r, p, dklen } => scrypt(passphrase, salt, *n, *r, *p, *dklen),
        KdfParams::LegacyEvp(evp) => {
            let out = evp_bytes_to_key(passphrase, salt, evp)?;
            let mut material = Vec::with_capacity(out.key.len() + out.iv.len());
            material.extend_from_slice(out.key.as_bytes());
            material.extend_from_slice(&out.iv);
            Ok(DerivedKey::from_bytes(material))
        }
    }
}

/// PBKDF2 with HMAC-SHA256.
pub fn pbkdf2_sha256(
    passphrase: &[u8],
    salt: &[u8],
    c: u32,
    dklen: usize,
) -> WalletResult<DerivedKey> {
    if c == 0 {
        return Err(WalletError::KeyDerivation(
            "PBKDF2 iteration count must be positive".into(),
        ));
    }
    if dklen == 0 {
        return Err(WalletError::KeyDerivation(
            "PBKDF2 output length must be positive".into(),
        ));
    }
    check_dklen(dklen)?;

    let mut key = vec![0u8; dklen];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, c, &mut key);
    Ok(DerivedKey { key })
}

/// scrypt with reference (RFC 7914) semantics.
pub fn scrypt(
    passphrase: &[u8],
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> WalletResult<DerivedKey> {
    if n < 2 || !n.is_power_of_two() {
        return Err(WalletError::KeyDerivation(format!(
            "scrypt N must be a power of two greater than 1, got {}",
            n
        )));
    }
    if dklen == 0 {
        return Err(WalletError::KeyDerivation(
            "scrypt output length must be positive".into(),
        ));
    }
    check_dklen(dklen)?;
    if n > MAX_SCRYPT_N {
        return Err(WalletError::InvalidInput(format!(
            "scrypt N {} exceeds {}",
            n, MAX_SCRYPT_N
        )));
    }
    let memory = 128 * u64::from(n) * u64::from(r);
    if memory > MAX_SCRYPT_MEMORY {
        return Err(WalletError::InvalidInput(format!(
            "scrypt N={} r={} needs {} bytes, limit is {}",
            n, r, memory, MAX_SCRYPT_MEMORY
        )));
    }
    if u64::from(r) * u64::from(p) > MAX_SCRYPT_RP {
        return Err(WalletError::InvalidInput(format!(
            "scrypt r*p exceeds {} (r={}, p={})",
            MAX_SCRYPT_RP, r, p
        )));
    }

    let log_n = n.trailing_zeros() as u8;
    // The length recorded in Params is only used for PHC strings; the output
    // buffer decides how many bytes are produced.
    let params = scrypt::Params::new(log_n, r, p, scrypt::Params::RECOMMENDED_LEN)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

    let mut key = vec![0u8; dklen];
    scrypt::scrypt(passphrase, salt, &params, &mut key)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    Ok(DerivedKey { key })
}

/// OpenSSL `EVP_BytesToKey`.
///
/// `D_0 = H^count(passphrase ‖ salt)`, `D_i = H^count(D_{i-1} ‖ passphrase ‖ salt)`,
/// concatenated until `key_size + iv_size` bytes are available.
pub fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8], params: &EvpParams) -> WalletResult<EvpKey> {
    if params.count == 0 {
        return Err(WalletError::KeyDerivation(
            "EVP iteration count must be positive".into(),
        ));
    }

    let needed = params
        .key_size
        .checked_add(params.iv_size)
        .filter(|n| *n <= MAX_DKLEN)
        .ok_or_else(|| {
            WalletError::InvalidInput(format!("EVP output exceeds {} bytes", MAX_DKLEN))
        })?;
    let mut material: Vec<u8> = Vec::with_capacity(needed + 32);
    let mut block: Vec<u8> = Vec::new();

    while material.len() < needed {
        block = params.digest.digest(&[block.as_slice(), passphrase, salt]);
        for _ in 1..params.count {
            block = params.digest.digest(&[block.as_slice()]);
        }
        material.extend_from_slice(&block);
    }

    let iv = material[params.key_size..needed].to_vec();
    material.truncate(params.key_size);
    block.zeroize();

    Ok(EvpKey {
        key: DerivedKey { key: material },
        iv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdf_algorithm_parse() {
        assert_eq!("scrypt".parse::<KdfAlgorithm>().unwrap(), KdfAlgorithm::Scrypt);
        assert_eq!("pbkdf2".parse::<KdfAlgorithm>().unwrap(), KdfAlgorithm::Pbkdf2);
        assert_eq!("evp".parse::<KdfAlgorithm>().unwrap(), KdfAlgorithm::LegacyEvp);
        assert!(matches!(
            "argon2id".parse::<KdfAlgorithm>(),
            Err(WalletError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_kdf_algorithm_serde() {
        let json = serde_json::to_string(&KdfAlgorithm::Pbkdf2).unwrap();
        assert_eq!(json, "\"pbkdf2\"");
        assert!(serde_json::from_str::<KdfAlgorithm>("\"bcrypt\"").is_err());
    }

    #[test]
    fn test_pbkdf2_rfc7914_vector() {
        let key = pbkdf2_sha256(b"passwd", b"salt", 1, 64).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn test_pbkdf2_single_iteration_vector() {
        let key = pbkdf2_sha256(b"password", b"salt", 1, 32).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_scrypt_rfc7914_empty_vector() {
        let key = scrypt(b"", b"", 16, 1, 1, 64).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
    }

    #[test]
    fn test_scrypt_rfc7914_nacl_vector() {
        let key = scrypt(b"password", b"NaCl", 1024, 8, 16, 64).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    #[test]
    fn test_scrypt_deterministic() {
        let params = KdfParams::Scrypt {
            n: 1024,
            r: 8,
            p: 1,
            dklen: 32,
        };
        let key1 = derive_key(b"testpassword", &[7u8; 32], &params).unwrap();
        let key2 = derive_key(b"testpassword", &[7u8; 32], &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let key3 = derive_key(b"testpassword", &[8u8; 32], &params).unwrap();
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }

    #[test]
    fn test_scrypt_rejects_non_power_of_two() {
        let result = scrypt(b"pw", b"salt", 1000, 8, 1, 32);
        assert!(matches!(result, Err(WalletError::KeyDerivation(_))));

        let result = scrypt(b"pw", b"salt", 1, 8, 1, 32);
        assert!(matches!(result, Err(WalletError::KeyDerivation(_))));
    }

    #[test]
    fn test_evp_single_block_is_md5() {
        // One MD5 block, no salt: D_0 = MD5("abc").
        let params = EvpParams {
            key_size: 16,
            iv_size: 0,
            ..EvpParams::default()
        };
        let out = evp_bytes_to_key(b"abc", b"", &params).unwrap();
        assert_eq!(
            hex::encode(out.key.as_bytes()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert!(out.iv.is_empty());
    }

    #[test]
    fn test_evp_matches_openssl_md5() {
        // openssl enc -aes-256-cbc -md md5 -S 0102030405060708 -pass pass:testtest -P
        let salt = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let params = EvpParams {
            key_size: 32,
            iv_size: 16,
            ..EvpParams::default()
        };
        let out = evp_bytes_to_key(b"testtest", &salt, &params).unwrap();
        assert_eq!(
            hex::encode(out.key.as_bytes()),
            "487c2b2a129cd16dccfb2f25cac669454d5904dbe22d0157b15cdcc52667f2b9"
        );
        assert_eq!(hex::encode(&out.iv), "97cf67cb87f7d8cb9d877ef05ccbad7a");
    }

    #[test]
    fn test_evp_matches_openssl_sha256() {
        // openssl enc -aes-256-cbc -md sha256 -S 0102030405060708 -pass pass:testtest -P
        let salt = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let params = EvpParams {
            digest: EvpDigest::Sha256,
            count: 1,
            key_size: 32,
            iv_size: 16,
        };
        let out = evp_bytes_to_key(b"testtest", &salt, &params).unwrap();
        assert_eq!(
            hex::encode(out.key.as_bytes()),
            "9b852d66d176145162aecd8a6bc2ed38dd373b9cc809ce5949a6461081ad7640"
        );
        assert_eq!(hex::encode(&out.iv), "a80bf1baa27568da6b7164ff5f2a395d");
    }

    #[test]
    fn test_evp_rejects_oversized_output() {
        let params = EvpParams {
            key_size: usize::MAX,
            iv_size: 16,
            ..EvpParams::default()
        };
        let result = evp_bytes_to_key(b"x", b"", &params);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_evp_key_debug_redacts_iv() {
        let out = evp_bytes_to_key(b"testtest", b"", &EvpParams::default()).unwrap();
        let debug_str = format!("{:?}", out);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains(&hex::encode(&out.iv)));
        assert!(!debug_str.contains(&format!("{:?}", out.iv)));
    }

    #[test]
    fn test_oversized_dklen_rejected() {
        let result = pbkdf2_sha256(b"pw", b"salt", 1, usize::MAX);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        let result = scrypt(b"pw", b"salt", 16, 1, 1, MAX_DKLEN + 1);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        assert!(pbkdf2_sha256(b"pw", b"salt", 1, MAX_DKLEN).is_ok());
    }

    #[test]
    fn test_scrypt_cost_limits() {
        let result = scrypt(b"pw", b"salt", 1 << 21, 1, 1, 32);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        // N within range but 128 * N * r over the memory limit
        let result = scrypt(b"pw", b"salt", 1 << 20, 16, 1, 32);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));

        let result = scrypt(b"pw", b"salt", 16, 1, u32::MAX, 32);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_evp_extra_iterations() {
        let params = EvpParams {
            count: 3,
            key_size: 16,
            iv_size: 0,
            ..EvpParams::default()
        };
        let out = evp_bytes_to_key(b"x", b"saltsalt", &params).unwrap();

        let mut expected = md5::compute(b"xsaltsalt").0;
        for _ in 1..3 {
            expected = md5::compute(expected).0;
        }
        assert_eq!(out.key.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_evp_via_derive_key_concatenates_iv() {
        let params = KdfParams::LegacyEvp(EvpParams {
            key_size: 32,
            iv_size: 16,
            ..EvpParams::default()
        });
        let material = derive_key(b"x", b"saltsalt", &params).unwrap();
        let direct = evp_bytes_to_key(b"x", b"saltsalt", &EvpParams {
            key_size: 32,
            iv_size: 16,
            ..EvpParams::default()
        })
        .unwrap();
        assert_eq!(material.len(), 48);
        assert_eq!(&material.as_bytes()[..32], direct.key.as_bytes());
        assert_eq!(&material.as_bytes()[32..], direct.iv.as_slice());
    }

    #[test]
    fn test_evp_sha256_digest() {
        let params = EvpParams {
            digest: EvpDigest::Sha256,
            key_size: 32,
            iv_size: 0,
            count: 1,
        };
        let out = evp_bytes_to_key(b"abc", b"", &params).unwrap();
        assert_eq!(
            hex::encode(out.key.as_bytes()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_derived_key_slice_bounds() {
        let key = DerivedKey::from_bytes(vec![1u8; 16]);
        assert!(key.slice(0..16).is_ok());
        assert!(matches!(key.slice(16..32), Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_derived_key_debug_redacted() {
        let key = DerivedKey::from_bytes(vec![0u8; 32]);
        let debug_str = format!("{:?}", key);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("0"));
    }
}
