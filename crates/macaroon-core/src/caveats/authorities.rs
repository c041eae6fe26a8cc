//! Authority caveats: `authorities = A, B, C`

use crate::verifier::GeneralCaveatVerifier;
use std::collections::BTreeSet;

const CAVEAT_PREFIX: &str = "authorities = ";

/// Satisfies `authorities = ...` when every requested authority is listed
///
/// A verifier with no requested authorities satisfies nothing.
#[derive(Debug, Clone, Default)]
pub struct AuthoritiesCaveatVerifier {
    requested: BTreeSet<String>,
}

impl AuthoritiesCaveatVerifier {
    pub fn new<I, S>(requested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requested: requested.into_iter().map(Into::into).collect(),
        }
    }
}

impl GeneralCaveatVerifier for AuthoritiesCaveatVerifier {
    fn verify_caveat(&self, predicate: &str) -> bool {
        let Some(list) = predicate.strip_prefix(CAVEAT_PREFIX) else {
            return false;
        };
        if self.requested.is_empty() {
            return false;
        }
        let granted: BTreeSet<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        self.requested.iter().all(|a| granted.contains(a.as_str()))
    }
}
