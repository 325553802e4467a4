//! Byte/text mapping for `bytes` and `fixed` payloads, and JSON number
//! literal validation for the raw numeric writers.
//!
//! The JSON encoding carries binary data as a string with one character per
//! byte (latin-1), so every byte value 0..=255 maps to the code point of the
//! same value and back.

use crate::{Error, Result};

/// Converts a decoded JSON string into bytes, one byte per character.
pub fn bytes_from_text(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return Err(Error::ValueMismatch(format!(
                "character {ch:?} is not a latin-1 byte"
            )));
        }
        out.push(code as u8);
    }
    Ok(out)
}

/// Converts bytes into the string form used on the wire.
pub fn text_from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Whether `text` is a well-formed JSON number literal.
pub(crate) fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }
    // integer part: 0, or nonzero digit followed by digits
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        _ => return false,
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

/// Whether `text` is a well-formed JSON integer (no fraction, no exponent).
pub(crate) fn is_json_integer(text: &str) -> bool {
    is_json_number(text) && !text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = text_from_bytes(&bytes);
        assert_eq!(bytes_from_text(&text).unwrap(), bytes);
    }

    #[test]
    fn rejects_wide_characters() {
        assert!(bytes_from_text("caf\u{e9}").is_ok());
        assert!(bytes_from_text("\u{1F600}").is_err());
    }

    #[test]
    fn json_number_shapes() {
        for ok in ["0", "-0", "12", "-12.5", "1e10", "2.5E-3", "0.25"] {
            assert!(is_json_number(ok), "{ok}");
        }
        for bad in ["", "-", "01", "1.", ".5", "1e", "1e+", "+1", "1 "] {
            assert!(!is_json_number(bad), "{bad}");
        }
        assert!(is_json_integer("-123456789012345678901234567890"));
        assert!(!is_json_integer("1.5"));
        assert!(!is_json_integer("1e3"));
    }
}
