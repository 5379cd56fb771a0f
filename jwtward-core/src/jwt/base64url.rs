//! base64url segment decoding.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::DecodeError;

/// Standard alphabet, tolerant of non-canonical trailing bits.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64url segment into a UTF-8 string.
///
/// The URL-safe characters are mapped back onto the standard alphabet and
/// missing `=` padding is restored before decoding. The decoded bytes are then
/// reassembled as UTF-8, so multi-byte characters survive intact.
///
/// # Errors
///
/// - [`DecodeError::MalformedEncoding`] when the length leaves a remainder of
///   one, or the input contains characters outside the alphabet
/// - [`DecodeError::MalformedPayload`] when the bytes are not valid UTF-8
pub fn url_base64_decode(input: &str) -> Result<String, DecodeError> {
    let mut output: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    match output.len() % 4 {
        0 => {}
        2 => output.push_str("=="),
        3 => output.push('='),
        _ => {
            return Err(DecodeError::MalformedEncoding {
                message: format!("length {} leaves a remainder of 1 modulo 4", input.len()),
            });
        }
    }

    let bytes = STANDARD_LENIENT
        .decode(output.as_bytes())
        .map_err(|e| DecodeError::MalformedEncoding {
            message: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| DecodeError::MalformedPayload {
        message: format!("payload is not valid UTF-8: {}", e),
    })
}
