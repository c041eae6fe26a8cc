//! Limits and wire-format constants
//!
//! These values are shared with other macaroon implementations (libmacaroons
//! and its ports). Changing any of them breaks interoperability.

/// Maximum length (in bytes, exclusive) of a location, identifier or caveat field
pub const MACAROON_MAX_STRLEN: usize = 32768;

/// Maximum number of caveats a single macaroon may carry
pub const MACAROON_MAX_CAVEATS: usize = 65536;

/// Recommended length of a freshly generated secret
pub const MACAROON_SUGGESTED_SECRET_LENGTH: usize = 32;

/// Size of root keys and signatures (HMAC-SHA256 output)
pub const MACAROON_HASH_BYTES: usize = 32;

/// HMAC key used to derive a root key from an arbitrary secret.
///
/// The ASCII string `macaroons-key-generator`, zero-padded to 32 bytes.
pub const KEY_GENERATOR: [u8; MACAROON_HASH_BYTES] = *b"macaroons-key-generator\0\0\0\0\0\0\0\0\0";

/// Number of hex digits in a packet length prefix
pub const PACKET_PREFIX_LENGTH: usize = 4;

/// Largest packet a 4-digit hex prefix can describe
pub const PACKET_MAX_LENGTH: usize = 0xFFFF;

pub const LOCATION: &str = "location";
pub const IDENTIFIER: &str = "identifier";
pub const SIGNATURE: &str = "signature";
pub const CID: &str = "cid";
pub const VID: &str = "vid";
pub const CL: &str = "cl";

pub const LINE_SEPARATOR: u8 = b'\n';
pub const KEY_VALUE_SEPARATOR: u8 = b' ';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generator_is_padded_ascii() {
        assert_eq!(&KEY_GENERATOR[..23], b"macaroons-key-generator");
        assert!(KEY_GENERATOR[23..].iter().all(|b| *b == 0));
    }
}
