//! Builder for minting and re-signing macaroons
//!
//! The builder is the only mutable staging type. It holds the secret, the
//! location, the identifier and the caveat list, and derives the signature
//! chain from scratch on [`MacaroonBuilder::build`].
//!
//! # Example
//!
//! ```
//! use macaroon_core::MacaroonBuilder;
//!
//! let mut builder = MacaroonBuilder::new("https://bank.example", "secret", "key-1");
//! builder.add_first_party_caveat("account = 3735928559")?;
//! let macaroon = builder.build()?;
//! assert_eq!(macaroon.caveats().len(), 1);
//! # Ok::<(), macaroon_core::MacaroonError>(())
//! ```

use crate::caveat::Caveat;
use crate::constants::MACAROON_MAX_CAVEATS;
use crate::crypto::{compute_signature, derive_root_key};
use crate::error::{MacaroonError, Result};
use crate::macaroon::Macaroon;
use std::fmt;
use tracing::debug;

/// Staging area for a macaroon's fields before signing
///
/// Not meant to be shared: a builder has a single owner for as long as it
/// is being mutated.
#[derive(Clone)]
pub struct MacaroonBuilder {
    location: String,
    secret: Vec<u8>,
    identifier: String,
    caveats: Vec<Caveat>,
}

impl fmt::Debug for MacaroonBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacaroonBuilder")
            .field("location", &self.location)
            .field("secret", &"[redacted]")
            .field("identifier", &self.identifier)
            .field("caveats", &self.caveats)
            .finish()
    }
}

impl MacaroonBuilder {
    /// Start a macaroon with an empty caveat list
    pub fn new(
        location: impl Into<String>,
        secret: impl AsRef<[u8]>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            secret: secret.as_ref().to_vec(),
            identifier: identifier.into(),
            caveats: Vec::new(),
        }
    }

    /// Mint a macaroon without caveats
    pub fn create(
        location: impl Into<String>,
        secret: impl AsRef<[u8]>,
        identifier: impl Into<String>,
    ) -> Result<Macaroon> {
        Self::new(location, secret, identifier).build()
    }

    /// Start from an existing macaroon's location, identifier and caveats.
    ///
    /// The signature is re-derived from `secret` on build, so this only
    /// produces a valid macaroon when `secret` is the one it was minted with.
    pub fn modify(macaroon: &Macaroon, secret: impl AsRef<[u8]>) -> Self {
        Self {
            location: macaroon.location().to_string(),
            secret: secret.as_ref().to_vec(),
            identifier: macaroon.identifier().to_string(),
            caveats: macaroon.caveats().to_vec(),
        }
    }

    /// Append a first-party caveat.
    ///
    /// Fails without changing the builder if the caveat limit is reached or
    /// the predicate is too long.
    pub fn add_first_party_caveat(&mut self, predicate: impl Into<String>) -> Result<&mut Self> {
        if self.caveats.len() >= MACAROON_MAX_CAVEATS {
            return Err(MacaroonError::TooManyCaveats {
                max: MACAROON_MAX_CAVEATS,
            });
        }
        let caveat = Caveat::first_party(predicate)?;
        self.caveats.push(caveat);
        Ok(self)
    }

    /// Third-party caveats are not supported; this always fails.
    pub fn add_third_party_caveat(&mut self, location: &str, identifier: &str) -> Result<&mut Self> {
        Err(MacaroonError::Unsupported(format!(
            "third-party caveat '{identifier}' for '{location}': third-party caveats are not implemented"
        )))
    }

    pub fn caveat_count(&self) -> usize {
        self.caveats.len()
    }

    /// Derive the root key and sign the identifier and caveats
    pub fn build(&self) -> Result<Macaroon> {
        let root_key = derive_root_key(&self.secret)?;
        let signature = compute_signature(&root_key, &self.identifier, &self.caveats)?;
        let macaroon = Macaroon::from_parts(
            self.location.clone(),
            self.identifier.clone(),
            self.caveats.clone(),
            signature,
        )?;

        debug!(
            location = %macaroon.location(),
            identifier = %macaroon.identifier(),
            caveats = macaroon.caveats().len(),
            "Signed macaroon"
        );

        Ok(macaroon)
    }
}
