//! Fixed vectors shared with other macaroon implementations
//!
//! Signatures match the libmacaroons key derivation and chain. Serialized
//! strings were produced by an independent encoder of the packet format.

use chrono::{TimeZone, Utc};
use macaroon_core::{
    derive_root_key, Macaroon, MacaroonBuilder, TimestampCaveatVerifier, VerificationError, Verifier,
};

const LOCATION: &str = "http://www.example.org";
const SECRET: &str = "this is our super secret key; only we should know it";
const IDENTIFIER: &str = "we used our secret key";

const NO_CAVEATS: &str = "MDAyNGxvY2F0aW9uIGh0dHA6Ly93d3cuZXhhbXBsZS5vcmcKMDAyNmlkZW50aWZpZXIgd2UgdXNlZCBvdXIgc2VjcmV0IGtleQowMDRmc2lnbmF0dXJlIGUzZDllMDI5MDg1MjZjNGMwMDM5YWUxNTExNDExNWQ5N2ZkZDY4YmYyYmEzNzliMzQyYWFmMGY2MTdkMDU1MmYK";

const ONE_CAVEAT: &str = "MDAyNGxvY2F0aW9uIGh0dHA6Ly93d3cuZXhhbXBsZS5vcmcKMDAyNmlkZW50aWZpZXIgd2UgdXNlZCBvdXIgc2VjcmV0IGtleQowMDFkY2lkIGFjY291bnQgPSAzNzM1OTI4NTU5CjAwNGZzaWduYXR1cmUgMWVmZTQ3NjNmMjkwZGJjZTBjMWQwODQ3NzM2N2UxMWY0ZWVlNDU2YTY0OTMzY2Y2NjJkNzk3NzJkYmI4MjEyOAo";

const THREE_CAVEATS: &str = "MDAyNGxvY2F0aW9uIGh0dHA6Ly93d3cuZXhhbXBsZS5vcmcKMDAyNmlkZW50aWZpZXIgd2UgdXNlZCBvdXIgc2VjcmV0IGtleQowMDFkY2lkIGFjY291bnQgPSAzNzM1OTI4NTU5CjAwMjBjaWQgdGltZSA8IDIwNDItMDEtMDFUMDA6MDAKMDAyMmNpZCBlbWFpbCA9IGFsaWNlQGV4YW1wbGUub3JnCjAwNGZzaWduYXR1cmUgYjA1YmYxMDE5NWQ5YThlOWIyOTFiMWIyMmYyNTJiYzllOTZlYTEwNjU0MGIyY2VlMzk0Zjc2NjVjOTY0MGE2MAo";

const NO_LOCATION: &str = "MDAxMmlkZW50aWZpZXIgaWQKMDAxNWNpZCB1c2VyID0gYWxpY2UKMDA0ZnNpZ25hdHVyZSA0M2Y2OTMyNmQxZDIxZTJjNTFlNzU0NWEzZjJjYjE4MjdiYWEzYmFiNjcwYjc4NTk4NzU5YjIyMjY2OWUxNTc0Cg";

fn three_caveat_macaroon() -> Macaroon {
    let mut builder = MacaroonBuilder::new(LOCATION, SECRET, IDENTIFIER);
    builder
        .add_first_party_caveat("account = 3735928559")
        .unwrap()
        .add_first_party_caveat("time < 2042-01-01T00:00")
        .unwrap()
        .add_first_party_caveat("email = alice@example.org")
        .unwrap();
    builder.build().unwrap()
}

#[test]
fn serialize_without_caveats() {
    let macaroon = MacaroonBuilder::create(LOCATION, SECRET, IDENTIFIER).unwrap();
    assert_eq!(macaroon.serialize(), NO_CAVEATS);
}

#[test]
fn serialize_with_one_caveat() {
    let mut builder = MacaroonBuilder::new(LOCATION, SECRET, IDENTIFIER);
    builder.add_first_party_caveat("account = 3735928559").unwrap();
    assert_eq!(builder.build().unwrap().serialize(), ONE_CAVEAT);
}

#[test]
fn serialize_with_three_caveats() {
    let macaroon = three_caveat_macaroon();
    assert_eq!(
        macaroon.signature_hex(),
        "b05bf10195d9a8e9b291b1b22f252bc9e96ea106540b2cee394f7665c9640a60"
    );
    assert_eq!(macaroon.serialize(), THREE_CAVEATS);
}

#[test]
fn serialize_without_location() {
    let mut builder = MacaroonBuilder::new("", "secret", "id");
    builder.add_first_party_caveat("user = alice").unwrap();
    assert_eq!(builder.build().unwrap().serialize(), NO_LOCATION);
}

#[test]
fn deserialize_one_caveat() {
    let macaroon = Macaroon::deserialize(ONE_CAVEAT).unwrap();
    assert_eq!(macaroon.location(), LOCATION);
    assert_eq!(macaroon.identifier(), IDENTIFIER);
    assert_eq!(
        macaroon.first_party_predicates().collect::<Vec<_>>(),
        vec!["account = 3735928559"]
    );
    assert_eq!(
        macaroon.signature_hex(),
        "1efe4763f290dbce0c1d08477367e11f4eee456a64933cf662d79772dbb82128"
    );
}

#[test]
fn verify_decoded_vector() {
    let macaroon = Macaroon::deserialize(THREE_CAVEATS).unwrap();
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    let verifier = Verifier::new()
        .satisfy_exact("account = 3735928559")
        .satisfy_exact("email = alice@example.org")
        .satisfy_general(TimestampCaveatVerifier::at(now));
    assert_eq!(verifier.verify(&macaroon, SECRET), Ok(()));
}

#[test]
fn expired_vector_fails_on_time_caveat() {
    let macaroon = Macaroon::deserialize(THREE_CAVEATS).unwrap();
    let now = Utc.with_ymd_and_hms(2043, 1, 1, 0, 0, 0).unwrap();

    let verifier = Verifier::new()
        .satisfy_exact("account = 3735928559")
        .satisfy_exact("email = alice@example.org")
        .satisfy_general(TimestampCaveatVerifier::at(now));
    assert_eq!(
        verifier.verify(&macaroon, SECRET),
        Err(VerificationError::CaveatNotSatisfied {
            predicate: "time < 2042-01-01T00:00".into()
        })
    );
}

#[test]
fn root_key_vector() {
    let key = derive_root_key(SECRET).unwrap();
    assert_eq!(
        hex::encode(key.as_bytes()),
        "a96173391e6bfa0356bbf095621b8af1510968e770e4d27d62109b7dc374814b"
    );
}
