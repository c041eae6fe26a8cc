//! Packet codec for the portable macaroon format
//!
//! A macaroon is written as a sequence of packets:
//!
//! ```text
//! HHHHkey value\n
//! ```
//!
//! `HHHH` is the length of the whole packet (prefix and trailing newline
//! included) as 4 hex digits. Packets appear in this order:
//!
//! ```text
//! location    (omitted when empty)
//! identifier
//! cid [vid cl]   (once per caveat)
//! signature   (64 lowercase hex characters)
//! ```
//!
//! The concatenated packets are exchanged as unpadded URL-safe base64.
//! Decoding checks structure only; use the verifier to check the signature.

use crate::caveat::Caveat;
use crate::constants::{
    CID, CL, IDENTIFIER, KEY_VALUE_SEPARATOR, LINE_SEPARATOR, LOCATION, MACAROON_MAX_CAVEATS,
    PACKET_MAX_LENGTH, PACKET_PREFIX_LENGTH, SIGNATURE, VID,
};
use crate::crypto::Signature;
use crate::error::{MacaroonError, Result};
use crate::macaroon::Macaroon;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use tracing::debug;

/// URL-safe base64: written without padding, read with or without it
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a macaroon to its portable string form
pub fn serialize(macaroon: &Macaroon) -> String {
    BASE64_URL.encode(to_packets(macaroon))
}

/// Decode a macaroon from its portable string form
pub fn deserialize(serialized: &str) -> Result<Macaroon> {
    let result = BASE64_URL
        .decode(serialized)
        .map_err(MacaroonError::from)
        .and_then(|raw| from_packets(&raw));
    if let Err(ref e) = result {
        debug!(error = %e, "Rejected malformed macaroon");
    }
    result
}

/// Write the raw packet stream for a macaroon
pub fn to_packets(macaroon: &Macaroon) -> Vec<u8> {
    let mut buf = Vec::new();
    if !macaroon.location().is_empty() {
        write_packet(&mut buf, LOCATION, macaroon.location().as_bytes());
    }
    write_packet(&mut buf, IDENTIFIER, macaroon.identifier().as_bytes());
    for caveat in macaroon.caveats() {
        match caveat {
            Caveat::FirstParty { predicate } => {
                write_packet(&mut buf, CID, predicate.as_bytes());
            }
            Caveat::ThirdParty {
                identifier,
                verification_key_ciphertext,
                location,
            } => {
                write_packet(&mut buf, CID, identifier.as_bytes());
                write_packet(&mut buf, VID, verification_key_ciphertext);
                write_packet(&mut buf, CL, location.as_bytes());
            }
        }
    }
    write_packet(&mut buf, SIGNATURE, macaroon.signature_hex().as_bytes());
    buf
}

/// Parse a raw packet stream into a macaroon
pub fn from_packets(data: &[u8]) -> Result<Macaroon> {
    let mut reader = PacketReader { data, pos: 0 };
    let mut packet = reader.next_packet()?;

    let mut location = String::new();
    if let Some(p) = packet.filter(|p| p.key == LOCATION) {
        location = p.value_string()?;
        packet = reader.next_packet()?;
    }

    let identifier = match packet {
        Some(p) if p.key == IDENTIFIER => p.value_string()?,
        Some(p) => return Err(unexpected(p.key, "identifier")),
        None => return Err(MacaroonError::deserialization("missing identifier packet")),
    };
    packet = reader.next_packet()?;

    let mut caveats = Vec::new();
    while let Some(p) = packet.filter(|p| p.key == CID) {
        if caveats.len() == MACAROON_MAX_CAVEATS {
            return Err(MacaroonError::deserialization(format!(
                "more than {MACAROON_MAX_CAVEATS} caveats"
            )));
        }
        let cid = p.value_string()?;
        packet = reader.next_packet()?;

        let mut vid = None;
        if let Some(p) = packet.filter(|p| p.key == VID) {
            vid = Some(p.value.to_vec());
            packet = reader.next_packet()?;
        }
        let mut cl = None;
        if let Some(p) = packet.filter(|p| p.key == CL) {
            cl = Some(p.value_string()?);
            packet = reader.next_packet()?;
        }

        let caveat = match (vid, cl) {
            (None, None) => Caveat::FirstParty { predicate: cid },
            (Some(verification_key_ciphertext), Some(location)) => Caveat::ThirdParty {
                identifier: cid,
                verification_key_ciphertext,
                location,
            },
            _ => {
                return Err(MacaroonError::deserialization(format!(
                    "caveat '{cid}' has only one of vid and cl"
                )));
            }
        };
        caveats.push(caveat);
    }

    let signature = match packet {
        Some(p) if p.key == SIGNATURE => Signature::from_hex(&p.value_string()?)?,
        Some(p) => return Err(unexpected(p.key, "cid or signature")),
        None => return Err(MacaroonError::deserialization("missing signature packet")),
    };

    if reader.pos != data.len() {
        return Err(MacaroonError::deserialization(format!(
            "{} trailing bytes after signature",
            data.len() - reader.pos
        )));
    }

    // Oversized fields in foreign input are a decoding failure, not a capacity error
    Macaroon::from_parts(location, identifier, caveats, signature)
        .map_err(|e| MacaroonError::deserialization(e.to_string()))
}

fn write_packet(buf: &mut Vec<u8>, key: &str, value: &[u8]) {
    let len = PACKET_PREFIX_LENGTH + key.len() + 1 + value.len() + 1;
    debug_assert!(len <= PACKET_MAX_LENGTH);
    buf.extend_from_slice(format!("{len:04x}").as_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.push(KEY_VALUE_SEPARATOR);
    buf.extend_from_slice(value);
    buf.push(LINE_SEPARATOR);
}

fn unexpected(key: &str, expected: &str) -> MacaroonError {
    MacaroonError::deserialization(format!("unexpected '{key}' packet, expected {expected}"))
}

/// One decoded `key value` record
#[derive(Debug, Clone, Copy)]
struct Packet<'a> {
    key: &'a str,
    value: &'a [u8],
}

impl Packet<'_> {
    fn value_string(&self) -> Result<String> {
        String::from_utf8(self.value.to_vec()).map_err(|_| {
            MacaroonError::deserialization(format!("'{}' value is not valid UTF-8", self.key))
        })
    }
}

struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    /// Read the packet at the current position, or `None` at end of input
    fn next_packet(&mut self) -> Result<Option<Packet<'a>>> {
        let data: &'a [u8] = self.data;
        let remaining = &data[self.pos..];
        if remaining.is_empty() {
            return Ok(None);
        }
        if remaining.len() < PACKET_PREFIX_LENGTH {
            return Err(MacaroonError::deserialization(format!(
                "truncated length prefix at offset {}",
                self.pos
            )));
        }

        let prefix = &remaining[..PACKET_PREFIX_LENGTH];
        if !prefix.iter().all(u8::is_ascii_hexdigit) {
            return Err(MacaroonError::deserialization(format!(
                "invalid length prefix at offset {}",
                self.pos
            )));
        }
        let len = prefix
            .iter()
            .fold(0usize, |acc, digit| (acc << 4) | hex_value(*digit));

        // Smallest valid packet is a one-byte key with an empty value
        if len < PACKET_PREFIX_LENGTH + 3 {
            return Err(MacaroonError::deserialization(format!(
                "packet length {len} at offset {} is too short",
                self.pos
            )));
        }
        if len > remaining.len() {
            return Err(MacaroonError::deserialization(format!(
                "packet length {len} at offset {} exceeds the {} remaining bytes",
                self.pos,
                remaining.len()
            )));
        }

        let packet = &remaining[..len];
        if packet[len - 1] != LINE_SEPARATOR {
            return Err(MacaroonError::deserialization(format!(
                "packet at offset {} is not newline-terminated",
                self.pos
            )));
        }

        let body = &packet[PACKET_PREFIX_LENGTH..len - 1];
        let split = body
            .iter()
            .position(|b| *b == KEY_VALUE_SEPARATOR)
            .ok_or_else(|| {
                MacaroonError::deserialization(format!(
                    "packet at offset {} has no key/value separator",
                    self.pos
                ))
            })?;
        let key = match std::str::from_utf8(&body[..split]) {
            Ok(key @ (LOCATION | IDENTIFIER | SIGNATURE | CID | VID | CL)) => key,
            _ => {
                return Err(MacaroonError::deserialization(format!(
                    "unknown packet key at offset {}",
                    self.pos
                )));
            }
        };

        self.pos += len;
        Ok(Some(Packet {
            key,
            value: &body[split + 1..],
        }))
    }
}

fn hex_value(digit: u8) -> usize {
    match digit {
        b'0'..=b'9' => (digit - b'0') as usize,
        b'a'..=b'f' => (digit - b'a' + 10) as usize,
        _ => (digit - b'A' + 10) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MacaroonBuilder;

    fn sample() -> Macaroon {
        let mut builder = MacaroonBuilder::new(
            "http://www.example.org",
            "this is our super secret key; only we should know it",
            "we used our secret key",
        );
        builder.add_first_party_caveat("account = 3735928559").unwrap();
        builder.build().unwrap()
    }

    fn packet(key: &str, value: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        write_packet(&mut buf, key, value.as_bytes());
        buf
    }

    #[test]
    fn test_packet_layout() {
        assert_eq!(packet("cid", "a = 1"), b"000ecid a = 1\n".to_vec());
    }

    #[test]
    fn test_packet_stream_layout() {
        let raw = to_packets(&sample());
        let text = String::from_utf8(raw).unwrap();
        assert_eq!(
            text,
            "0024location http://www.example.org\n\
             0026identifier we used our secret key\n\
             001dcid account = 3735928559\n\
             004fsignature 1efe4763f290dbce0c1d08477367e11f4eee456a64933cf662d79772dbb82128\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        let macaroon = sample();
        let decoded = deserialize(&serialize(&macaroon)).unwrap();
        assert_eq!(decoded, macaroon);
    }

    #[test]
    fn test_empty_location_is_omitted() {
        let macaroon = MacaroonBuilder::create("", "secret", "id").unwrap();
        let raw = to_packets(&macaroon);
        assert!(raw.starts_with(b"0012identifier id\n"));
        assert_eq!(deserialize(&serialize(&macaroon)).unwrap().location(), "");
    }

    #[test]
    fn test_serialized_form_is_unpadded_url_safe() {
        let encoded = serialize(&sample());
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_padded_input_accepted() {
        let macaroon = sample();
        let padded = base64::engine::general_purpose::URL_SAFE.encode(to_packets(&macaroon));
        assert_eq!(deserialize(&padded).unwrap(), macaroon);
    }

    #[test]
    fn test_uppercase_length_prefix_accepted() {
        let mut raw = to_packets(&sample());
        // "001dcid" -> "001Dcid"
        let text = String::from_utf8(raw.clone()).unwrap();
        let idx = text.find("001dcid").unwrap();
        raw[idx + 3] = b'D';
        assert_eq!(from_packets(&raw).unwrap(), sample());
    }

    #[test]
    fn test_third_party_caveat_roundtrip() {
        let macaroon = Macaroon::from_parts(
            "loc".into(),
            "id".into(),
            vec![Caveat::ThirdParty {
                identifier: "user = alice".into(),
                verification_key_ciphertext: vec![0, 159, 10, 32, 255],
                location: "https://auth.example".into(),
            }],
            Signature::from_bytes([7; 32]),
        )
        .unwrap();
        assert_eq!(deserialize(&serialize(&macaroon)).unwrap(), macaroon);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = deserialize("not base64!").unwrap_err();
        assert!(err.is_deserialization_error());
    }

    #[test]
    fn test_length_prefix_mismatch_rejected() {
        let mut raw = to_packets(&sample());
        // Declare the location packet one byte shorter than it is
        raw[3] = b'5';
        let err = deserialize(&BASE64_URL.encode(&raw)).unwrap_err();
        assert!(err.is_deserialization_error());
    }

    #[test]
    fn test_length_prefix_beyond_input_rejected() {
        let raw = b"ffffidentifier id\n";
        assert!(from_packets(raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_non_hex_prefix_rejected() {
        let raw = b"+012identifier id\n";
        assert!(from_packets(raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let raw = packet("location", "loc");
        let err = from_packets(&raw).unwrap_err();
        assert!(err.to_string().contains("missing identifier"));
    }

    #[test]
    fn test_missing_signature_rejected() {
        let mut raw = packet("identifier", "id");
        raw.extend(packet("cid", "a = 1"));
        let err = from_packets(&raw).unwrap_err();
        assert!(err.to_string().contains("missing signature"));
    }

    #[test]
    fn test_short_signature_rejected() {
        let mut raw = packet("identifier", "id");
        raw.extend(packet("signature", "abcd"));
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut raw = packet("identifier", "id");
        raw.extend(packet("expires", "tomorrow"));
        raw.extend(packet("signature", &"00".repeat(32)));
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_vid_without_cid_rejected() {
        let mut raw = packet("identifier", "id");
        raw.extend(packet("vid", "key"));
        raw.extend(packet("signature", &"00".repeat(32)));
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_vid_without_cl_rejected() {
        let mut raw = packet("identifier", "id");
        raw.extend(packet("cid", "tp"));
        raw.extend(packet("vid", "key"));
        raw.extend(packet("signature", &"00".repeat(32)));
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_trailing_packet_rejected() {
        let mut raw = to_packets(&sample());
        raw.extend(packet("cid", "late = 1"));
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_missing_newline_rejected() {
        let mut raw = packet("identifier", "id");
        let last = raw.len() - 1;
        raw[last] = b'x';
        assert!(from_packets(&raw).unwrap_err().is_deserialization_error());
    }

    #[test]
    fn test_value_may_contain_separators() {
        let mut builder = MacaroonBuilder::new("loc", "secret", "id with spaces");
        builder.add_first_party_caveat("multi\nline predicate").unwrap();
        let macaroon = builder.build().unwrap();
        assert_eq!(deserialize(&serialize(&macaroon)).unwrap(), macaroon);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(deserialize("").unwrap_err().is_deserialization_error());
    }
}
