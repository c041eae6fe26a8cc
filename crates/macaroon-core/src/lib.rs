//! # Macaroon Core
//!
//! Macaroons are bearer credentials that can be attenuated offline by
//! appending caveats. Every caveat is bound into the credential through an
//! HMAC-SHA256 chain, so no caveat can be removed or reordered without
//! invalidating the signature.
//!
//! ## Key Concepts
//!
//! - **Root key**: fixed 32-byte key derived from an arbitrary secret
//! - **Signature chain**: `sig_0 = HMAC(root_key, identifier)`, then
//!   `sig_i = HMAC(sig_{i-1}, caveat_i)`
//! - **Codec**: length-prefixed packets, exchanged as unpadded base64url
//! - **Verifier**: recomputes the chain, then checks caveat predicates
//!
//! ## Example
//!
//! ```
//! use macaroon_core::{Macaroon, MacaroonBuilder, Verifier};
//!
//! let mut builder = MacaroonBuilder::new("https://bank.example", "secret", "key-1");
//! builder.add_first_party_caveat("user = alice")?;
//! let token = builder.build()?.serialize();
//!
//! let macaroon = Macaroon::deserialize(&token)?;
//! let verifier = Verifier::new().satisfy_exact("user = alice");
//! assert!(verifier.verify(&macaroon, "secret").is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Third-party caveats can be decoded and inspected, but cannot be added
//! or verified.

pub mod builder;
pub mod caveat;
pub mod caveats;
pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod macaroon;
pub mod verifier;

pub use builder::MacaroonBuilder;
pub use caveat::Caveat;
pub use caveats::{AuthoritiesCaveatVerifier, TimestampCaveatVerifier};
pub use crypto::{compute_signature, derive_root_key, generate_secret, RootKey, Signature};
pub use error::{MacaroonError, Result, VerificationError};
pub use macaroon::Macaroon;
pub use verifier::{verify, GeneralCaveatVerifier, VerificationContext, Verifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
