//! Base64 payload codec.
//!
//! Inbound payloads come from browsers and scripts that are loose about
//! padding, line wrapping and alphabet, so decoding is lenient: whitespace is
//! ignored, padding is optional and URL-safe `-`/`_` are read as `+`/`/`,
//! even when both alphabets appear in one payload.
//! Outbound bytes are always encoded with the standard padded alphabet.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Decode an inbound base64 payload into raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    Ok(LENIENT_STANDARD.decode(compact)?)
}

/// Encode result bytes for the response.
pub fn encode_output(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_padded() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decodes_without_padding() {
        assert_eq!(decode_payload("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn ignores_line_wrapping() {
        assert_eq!(decode_payload("aGVs\nbG8g\r\nd29y bGQ=").unwrap(), b"hello world");
    }

    #[test]
    fn accepts_url_safe_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in standard, "-_8=" in URL-safe
        assert_eq!(decode_payload("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_payload("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn accepts_mixed_alphabets() {
        assert_eq!(decode_payload("+_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_payload("-/8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_payload("not*base64"),
            Err(CodecError::InvalidBase64(_))
        ));
    }

    #[test]
    fn encode_is_standard_padded() {
        assert_eq!(encode_output(b"hello"), "aGVsbG8=");
        assert_eq!(encode_output(&[0xfb, 0xff]), "+/8=");
    }
}
