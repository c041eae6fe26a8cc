//! Caveat types
//!
//! A caveat restricts the authority of a macaroon. First-party caveats are
//! predicate strings checked by the verifying service itself. Third-party
//! caveats name an external service that must vouch for a condition; they
//! are representable (so encoded macaroons carrying them can be decoded and
//! inspected) but the signature chain and verifier reject them.

use crate::constants::{CID, CL, MACAROON_MAX_STRLEN, VID};
use crate::error::{MacaroonError, Result};

/// A single restriction attached to a macaroon
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caveat {
    /// Predicate checked by the target service (`cid` only on the wire)
    FirstParty { predicate: String },

    /// Condition discharged by another service (`cid`, `vid`, `cl` on the wire)
    ThirdParty {
        identifier: String,
        verification_key_ciphertext: Vec<u8>,
        location: String,
    },
}

impl Caveat {
    /// Create a first-party caveat, enforcing the field length limit
    pub fn first_party(predicate: impl Into<String>) -> Result<Self> {
        let predicate = predicate.into();
        check_len(CID, predicate.len())?;
        Ok(Caveat::FirstParty { predicate })
    }

    /// The caveat identifier: the predicate for first-party caveats
    pub fn identifier(&self) -> &str {
        match self {
            Caveat::FirstParty { predicate } => predicate,
            Caveat::ThirdParty { identifier, .. } => identifier,
        }
    }

    /// The predicate of a first-party caveat
    pub fn predicate(&self) -> Option<&str> {
        match self {
            Caveat::FirstParty { predicate } => Some(predicate),
            Caveat::ThirdParty { .. } => None,
        }
    }

    pub fn is_first_party(&self) -> bool {
        matches!(self, Caveat::FirstParty { .. })
    }

    pub fn is_third_party(&self) -> bool {
        matches!(self, Caveat::ThirdParty { .. })
    }

    /// Check every field against the wire-format length limit
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Caveat::FirstParty { predicate } => check_len(CID, predicate.len()),
            Caveat::ThirdParty {
                identifier,
                verification_key_ciphertext,
                location,
            } => {
                check_len(CID, identifier.len())?;
                check_len(VID, verification_key_ciphertext.len())?;
                check_len(CL, location.len())
            }
        }
    }
}

/// Reject a field of `len` bytes if it reaches `MACAROON_MAX_STRLEN`
pub(crate) fn check_len(field: &'static str, len: usize) -> Result<()> {
    if len >= MACAROON_MAX_STRLEN {
        return Err(MacaroonError::StringTooLong {
            field,
            len,
            max: MACAROON_MAX_STRLEN,
        });
    }
    Ok(())
}
