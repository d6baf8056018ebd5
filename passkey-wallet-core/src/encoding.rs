//! Byte-array ↔ URL-safe unpadded base64 conversions.
//!
//! Everything that crosses the authenticator boundary (challenges, user
//! handles, credential identifiers, attestation payloads) travels in this
//! encoding.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::error::PasskeyWalletError;

/// Encodes bytes as unpadded URL-safe base64.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a URL-safe base64 string, with or without padding.
///
/// Padding is restored to a multiple of 4 before decoding.
///
/// # Errors
///
/// Returns [`PasskeyWalletError::MalformedEncoding`] on empty input or any
/// character outside the URL-safe alphabet.
pub fn decode(input: &str) -> Result<Vec<u8>, PasskeyWalletError> {
    if input.is_empty() {
        return Err(PasskeyWalletError::MalformedEncoding {
            reason: "empty input".to_string(),
        });
    }

    let mut padded = input.to_owned();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|err| PasskeyWalletError::MalformedEncoding {
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(b"f" ; "single byte")]
    #[test_case(b"fo" ; "two bytes")]
    #[test_case(b"foo" ; "three bytes")]
    #[test_case(&[0xfb, 0xff, 0xfe, 0x00, 0x7f] ; "bytes mapping to url safe chars")]
    fn round_trip(bytes: &[u8]) {
        let encoded = encode(bytes);
        assert_eq!(decode(&encoded).unwrap(), bytes.to_vec());
    }

    #[test]
    fn encode_is_unpadded_and_url_safe() {
        // 0xfb 0xff produces '+' and '/' in the standard alphabet.
        let encoded = encode(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn decode_accepts_padded_input() {
        assert_eq!(decode("Zm9v").unwrap(), b"foo".to_vec());
        assert_eq!(decode("Zm8=").unwrap(), b"fo".to_vec());
    }

    #[test]
    fn decode_rejects_empty_input() {
        let err = decode("").unwrap_err();
        assert!(matches!(err, PasskeyWalletError::MalformedEncoding { .. }));
    }

    #[test_case("Zm9v!" ; "punctuation")]
    #[test_case("Zm+v" ; "standard alphabet plus")]
    #[test_case("Zm/v" ; "standard alphabet slash")]
    #[test_case("Zm 9v" ; "embedded whitespace")]
    fn decode_rejects_non_alphabet_characters(input: &str) {
        let err = decode(input).unwrap_err();
        assert!(matches!(err, PasskeyWalletError::MalformedEncoding { .. }));
    }
}
