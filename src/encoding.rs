//! Body encodings applied when an aggregation finalises.
//!
//! Binary bodies are base64 encoded in MIME form: the standard alphabet with
//! padding, broken into lines of at most 76 characters joined by CRLF and
//! without a trailing separator. Text bodies are decoded as UTF-8.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// Maximum encoded line length for MIME base64 output.
pub const MIME_LINE_LENGTH: usize = 76;

const MIME_LINE_SEPARATOR: &str = "\r\n";

/// How non-UTF-8 bytes in a text body are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDecoding {
    /// Fail the aggregation with [`EncodingError::InvalidUtf8`].
    #[default]
    Strict,
    /// Substitute U+FFFD for invalid sequences.
    Lossy,
}

/// Encode `bytes` as MIME base64.
///
/// ```
/// use lambda_aggregator::encoding::encode_mime;
/// assert_eq!(encode_mime(&[0x00, 0xFF, 0x10]), "AP8Q");
/// ```
#[must_use]
pub fn encode_mime(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    if encoded.len() <= MIME_LINE_LENGTH {
        return encoded;
    }

    let separators = (encoded.len() - 1) / MIME_LINE_LENGTH;
    let mut out = String::with_capacity(encoded.len() + separators * MIME_LINE_SEPARATOR.len());
    for (index, line) in encoded.as_bytes().chunks(MIME_LINE_LENGTH).enumerate() {
        if index > 0 {
            out.push_str(MIME_LINE_SEPARATOR);
        }
        // base64 output is ASCII
        out.extend(line.iter().copied().map(char::from));
    }
    out
}

/// Decode a buffered body as UTF-8 text under `policy`.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidUtf8`] when `policy` is
/// [`TextDecoding::Strict`] and the bytes are not valid UTF-8.
pub fn decode_text(bytes: &[u8], policy: TextDecoding) -> Result<String, EncodingError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_owned()),
        Err(err) => match policy {
            TextDecoding::Strict => Err(EncodingError::InvalidUtf8 {
                valid_up_to: err.valid_up_to(),
            }),
            TextDecoding::Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}
