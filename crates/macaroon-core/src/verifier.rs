//! Macaroon verification
//!
//! Verification runs in a fixed order and fails closed:
//!
//! 1. Any third-party caveat fails with [`VerificationError::UnsupportedCaveat`].
//! 2. The signature chain is recomputed from the secret and compared to the
//!    macaroon's signature in constant time. A difference fails with
//!    [`VerificationError::SignatureMismatch`].
//! 3. Only then is every first-party predicate evaluated against the
//!    caller's [`VerificationContext`]. The first unsatisfied one fails with
//!    [`VerificationError::CaveatNotSatisfied`].

use crate::caveat::Caveat;
use crate::crypto::{derive_root_key, verify_signature};
use crate::error::VerificationError;
use crate::macaroon::Macaroon;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Decides whether a first-party caveat predicate holds
pub trait VerificationContext {
    fn is_satisfied(&self, predicate: &str) -> bool;
}

impl VerificationContext for HashSet<String> {
    fn is_satisfied(&self, predicate: &str) -> bool {
        self.contains(predicate)
    }
}

impl VerificationContext for BTreeSet<String> {
    fn is_satisfied(&self, predicate: &str) -> bool {
        self.contains(predicate)
    }
}

/// Checks caveats by structure rather than exact match, e.g. `time < ...`
pub trait GeneralCaveatVerifier: Send + Sync {
    fn verify_caveat(&self, predicate: &str) -> bool;
}

impl<F> GeneralCaveatVerifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn verify_caveat(&self, predicate: &str) -> bool {
        self(predicate)
    }
}

/// Verification context assembled from exact predicates and general verifiers
///
/// # Example
///
/// ```
/// use macaroon_core::{MacaroonBuilder, Verifier};
///
/// let mut builder = MacaroonBuilder::new("loc", "secret", "id");
/// builder.add_first_party_caveat("user = alice")?;
/// let macaroon = builder.build()?;
///
/// let verifier = Verifier::new().satisfy_exact("user = alice");
/// assert!(verifier.is_valid(&macaroon, "secret"));
/// # Ok::<(), macaroon_core::MacaroonError>(())
/// ```
#[derive(Default)]
pub struct Verifier {
    exact: HashSet<String>,
    general: Vec<Box<dyn GeneralCaveatVerifier>>,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("exact", &self.exact)
            .field("general", &self.general.len())
            .finish()
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `predicate` as satisfied when it appears verbatim as a caveat
    pub fn satisfy_exact(mut self, predicate: impl Into<String>) -> Self {
        self.exact.insert(predicate.into());
        self
    }

    /// Consult `verifier` for caveats not satisfied exactly
    pub fn satisfy_general(mut self, verifier: impl GeneralCaveatVerifier + 'static) -> Self {
        self.general.push(Box::new(verifier));
        self
    }

    /// Verify `macaroon` against `secret` and this context
    pub fn verify(&self, macaroon: &Macaroon, secret: impl AsRef<[u8]>) -> Result<(), VerificationError> {
        verify(macaroon, secret, self)
    }

    /// Same as [`Verifier::verify`], discarding the failure reason
    pub fn is_valid(&self, macaroon: &Macaroon, secret: impl AsRef<[u8]>) -> bool {
        self.verify(macaroon, secret).is_ok()
    }
}

impl VerificationContext for Verifier {
    fn is_satisfied(&self, predicate: &str) -> bool {
        self.exact.contains(predicate) || self.general.iter().any(|v| v.verify_caveat(predicate))
    }
}

/// Verify `macaroon` was minted with `secret` and all its caveats hold in `context`
pub fn verify<C>(
    macaroon: &Macaroon,
    secret: impl AsRef<[u8]>,
    context: &C,
) -> Result<(), VerificationError>
where
    C: VerificationContext + ?Sized,
{
    for (index, caveat) in macaroon.caveats().iter().enumerate() {
        if let Caveat::ThirdParty { identifier, .. } = caveat {
            warn!(
                identifier = %macaroon.identifier(),
                index,
                "SECURITY: Rejecting macaroon with third-party caveat"
            );
            return Err(VerificationError::UnsupportedCaveat {
                index,
                identifier: identifier.clone(),
            });
        }
    }

    let root_key = derive_root_key(secret)?;
    if !verify_signature(
        &root_key,
        macaroon.identifier(),
        macaroon.caveats(),
        macaroon.signature(),
    )? {
        warn!(
            identifier = %macaroon.identifier(),
            location = %macaroon.location(),
            "SECURITY: Macaroon signature mismatch"
        );
        return Err(VerificationError::SignatureMismatch);
    }

    for predicate in macaroon.first_party_predicates() {
        if !context.is_satisfied(predicate) {
            warn!(
                identifier = %macaroon.identifier(),
                predicate = %predicate,
                "Macaroon caveat not satisfied"
            );
            return Err(VerificationError::CaveatNotSatisfied {
                predicate: predicate.to_string(),
            });
        }
    }

    debug!(
        identifier = %macaroon.identifier(),
        caveats = macaroon.caveats().len(),
        "Macaroon verified"
    );
    Ok(())
}
