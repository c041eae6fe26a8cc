//! Key derivation and the HMAC signature chain
//!
//! ```text
//! root_key = HMAC-SHA256(KEY_GENERATOR, secret)
//! sig_0    = HMAC-SHA256(root_key, identifier)
//! sig_i    = HMAC-SHA256(sig_{i-1}, caveat_i)
//! ```
//!
//! Each signature becomes the key of the next step, so removing, reordering
//! or substituting a caveat changes every later signature. Only first-party
//! caveats can be chained; a third-party caveat is rejected with
//! [`MacaroonError::Unsupported`].

use crate::caveat::Caveat;
use crate::constants::{KEY_GENERATOR, MACAROON_HASH_BYTES, MACAROON_SUGGESTED_SECRET_LENGTH};
use crate::error::{MacaroonError, Result};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Root key derived from a secret, used as the first key of the chain
#[derive(Clone, PartialEq, Eq)]
pub struct RootKey([u8; MACAROON_HASH_BYTES]);

impl RootKey {
    /// Wrap raw key bytes that were derived elsewhere
    pub const fn from_bytes(bytes: [u8; MACAROON_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MACAROON_HASH_BYTES] {
        &self.0
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey([redacted])")
    }
}

/// Final output of the signature chain
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; MACAROON_HASH_BYTES]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; MACAROON_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parse a signature from hex (either case), requiring exactly 32 bytes
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let bytes: [u8; MACAROON_HASH_BYTES] = bytes.try_into().map_err(|b: Vec<u8>| {
            MacaroonError::deserialization(format!(
                "signature must be {MACAROON_HASH_BYTES} bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; MACAROON_HASH_BYTES] {
        &self.0
    }

    /// Lowercase hex encoding, as written on the wire
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to tell signatures apart in logs without leaking the chain key
        write!(f, "Signature({:02x}{:02x}...)", self.0[0], self.0[1])
    }
}

/// Generate a random secret of the suggested length from the OS RNG
pub fn generate_secret() -> [u8; MACAROON_SUGGESTED_SECRET_LENGTH] {
    let mut secret = [0u8; MACAROON_SUGGESTED_SECRET_LENGTH];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// Derive the fixed-size root key from an arbitrary-length secret
pub fn derive_root_key(secret: impl AsRef<[u8]>) -> Result<RootKey> {
    let mac = keyed_mac(&KEY_GENERATOR, secret.as_ref())?;
    Ok(RootKey(mac.finalize().into_bytes().into()))
}

/// Compute the signature over `identifier` followed by `caveats`, in order
pub fn compute_signature(root_key: &RootKey, identifier: &str, caveats: &[Caveat]) -> Result<Signature> {
    let mac = chain(root_key, identifier, caveats)?;
    Ok(Signature(mac.finalize().into_bytes().into()))
}

/// Recompute the chain and compare it to `expected` in constant time
pub fn verify_signature(
    root_key: &RootKey,
    identifier: &str,
    caveats: &[Caveat],
    expected: &Signature,
) -> Result<bool> {
    let mac = chain(root_key, identifier, caveats)?;
    Ok(mac.verify_slice(expected.as_bytes()).is_ok())
}

/// Run the chain up to, but not including, finalization of the last step
fn chain(root_key: &RootKey, identifier: &str, caveats: &[Caveat]) -> Result<HmacSha256> {
    let mut mac = keyed_mac(root_key.as_bytes(), identifier.as_bytes())?;
    for (index, caveat) in caveats.iter().enumerate() {
        let predicate = match caveat {
            Caveat::FirstParty { predicate } => predicate,
            Caveat::ThirdParty { identifier, .. } => {
                return Err(MacaroonError::Unsupported(format!(
                    "third-party caveat at index {index} ({identifier}) cannot be chained"
                )));
            }
        };
        let key: [u8; MACAROON_HASH_BYTES] = mac.finalize().into_bytes().into();
        mac = keyed_mac(&key, predicate.as_bytes())?;
    }
    Ok(mac)
}

fn keyed_mac(key: &[u8], message: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(message);
    Ok(mac)
}
