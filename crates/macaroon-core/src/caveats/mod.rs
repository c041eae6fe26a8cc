//! Built-in general caveat verifiers
//!
//! These understand common first-party caveat shapes and plug into
//! [`Verifier::satisfy_general`](crate::verifier::Verifier::satisfy_general).

pub mod authorities;
pub mod timestamp;

pub use authorities::AuthoritiesCaveatVerifier;
pub use timestamp::TimestampCaveatVerifier;
