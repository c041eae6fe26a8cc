//! Error types for macaroon construction, encoding and verification

use thiserror::Error;

/// Result type alias using MacaroonError
pub type Result<T> = std::result::Result<T, MacaroonError>;

/// Errors raised while building, encoding or decoding macaroons
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacaroonError {
    /// Adding a caveat would exceed the caveat limit
    #[error("Too many caveats: at most {max} caveats are allowed")]
    TooManyCaveats { max: usize },

    /// A field is longer than the wire format allows
    #[error("Field '{field}' is {len} bytes long, must be shorter than {max}")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The serialized form is malformed
    #[error("Failed to deserialize macaroon: {0}")]
    Deserialization(String),

    /// The operation needs third-party caveat support, which is not implemented
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The HMAC primitive rejected its input
    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl MacaroonError {
    /// Check if this error is a caveat count or field length violation
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            MacaroonError::TooManyCaveats { .. } | MacaroonError::StringTooLong { .. }
        )
    }

    /// Check if this error was raised while decoding
    pub fn is_deserialization_error(&self) -> bool {
        matches!(self, MacaroonError::Deserialization(_))
    }

    /// Check if this error marks a third-party caveat operation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MacaroonError::Unsupported(_))
    }

    pub(crate) fn deserialization(reason: impl Into<String>) -> Self {
        MacaroonError::Deserialization(reason.into())
    }
}

impl From<base64::DecodeError> for MacaroonError {
    fn from(err: base64::DecodeError) -> Self {
        MacaroonError::Deserialization(format!("invalid base64url: {err}"))
    }
}

impl From<hex::FromHexError> for MacaroonError {
    fn from(err: hex::FromHexError) -> Self {
        MacaroonError::Deserialization(format!("invalid signature hex: {err}"))
    }
}

impl From<hmac::digest::InvalidLength> for MacaroonError {
    fn from(err: hmac::digest::InvalidLength) -> Self {
        MacaroonError::Crypto(err.to_string())
    }
}

/// Reasons a macaroon fails verification
///
/// A verification failure is never a generic fault: callers can tell a
/// forged or wrongly keyed token apart from one whose caveats they cannot
/// satisfy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The recomputed signature chain does not match the macaroon's signature
    #[error("Signature mismatch: macaroon was not issued with this secret or has been tampered with")]
    SignatureMismatch,

    /// A first-party caveat predicate is not satisfied by the verification context
    #[error("Caveat not satisfied: {predicate}")]
    CaveatNotSatisfied { predicate: String },

    /// The macaroon carries a third-party caveat, which cannot be discharged here
    #[error("Unsupported third-party caveat at index {index}: {identifier}")]
    UnsupportedCaveat { index: usize, identifier: String },

    /// Key derivation or chain recomputation failed
    #[error("Verification could not run: {0}")]
    Internal(#[from] MacaroonError),
}

impl VerificationError {
    /// Check if this failure means the token itself is invalid
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, VerificationError::SignatureMismatch)
    }

    /// Get the offending predicate if a caveat was not satisfied
    pub fn unsatisfied_predicate(&self) -> Option<&str> {
        match self {
            VerificationError::CaveatNotSatisfied { predicate } => Some(predicate.as_str()),
            _ => None,
        }
    }
}
