//! The macaroon value type
//!
//! A [`Macaroon`] is immutable once constructed. New macaroons come from
//! [`MacaroonBuilder`](crate::builder::MacaroonBuilder) or from decoding a
//! serialized string; both paths enforce the field length and caveat count
//! limits before a value exists.

use crate::caveat::{check_len, Caveat};
use crate::codec;
use crate::constants::{CID, CL, IDENTIFIER, LOCATION, MACAROON_MAX_CAVEATS, SIGNATURE, VID};
use crate::crypto::Signature;
use crate::error::{MacaroonError, Result};
use std::fmt::Write as _;
use std::str::FromStr;

/// A bearer credential: location hint, identifier, ordered caveats and the
/// chained HMAC signature binding them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Macaroon {
    location: String,
    identifier: String,
    caveats: Vec<Caveat>,
    signature: Signature,
}

impl Macaroon {
    /// Assemble a macaroon from parts, checking the wire-format limits.
    ///
    /// This does not check that `signature` matches the chain.
    pub(crate) fn from_parts(
        location: String,
        identifier: String,
        caveats: Vec<Caveat>,
        signature: Signature,
    ) -> Result<Self> {
        check_len(LOCATION, location.len())?;
        check_len(IDENTIFIER, identifier.len())?;
        if caveats.len() > MACAROON_MAX_CAVEATS {
            return Err(MacaroonError::TooManyCaveats {
                max: MACAROON_MAX_CAVEATS,
            });
        }
        for caveat in &caveats {
            caveat.validate()?;
        }
        Ok(Self {
            location,
            identifier,
            caveats,
            signature,
        })
    }

    /// Advisory hint of where the macaroon is meant to be used
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Iterate over first-party caveat predicates, in order
    pub fn first_party_predicates(&self) -> impl Iterator<Item = &str> {
        self.caveats.iter().filter_map(Caveat::predicate)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn signature_hex(&self) -> String {
        self.signature.to_hex()
    }

    /// Encode to the portable base64url packet form
    pub fn serialize(&self) -> String {
        codec::serialize(self)
    }

    /// Decode from the portable form. Structure only; the signature is not checked.
    pub fn deserialize(serialized: &str) -> Result<Self> {
        codec::deserialize(serialized)
    }

    /// Human-readable dump, one field per line, in wire order
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "{LOCATION} {}", self.location);
        let _ = writeln!(out, "{IDENTIFIER} {}", self.identifier);
        for caveat in &self.caveats {
            match caveat {
                Caveat::FirstParty { predicate } => {
                    let _ = writeln!(out, "{CID} {predicate}");
                }
                Caveat::ThirdParty {
                    identifier,
                    verification_key_ciphertext,
                    location,
                } => {
                    let _ = writeln!(out, "{CID} {identifier}");
                    let _ = writeln!(out, "{VID} {}", hex::encode(verification_key_ciphertext));
                    let _ = writeln!(out, "{CL} {location}");
                }
            }
        }
        let _ = write!(out, "{SIGNATURE} {}", self.signature.to_hex());
        out
    }
}

impl FromStr for Macaroon {
    type Err = MacaroonError;

    fn from_str(s: &str) -> Result<Self> {
        codec::deserialize(s)
    }
}
