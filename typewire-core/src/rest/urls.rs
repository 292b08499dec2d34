//! Url-encoding for path segments and parameter values.
//!
//! UTF-8 percent escapes with the form-encoding convention of space ⇔ `+`;
//! unreserved characters (`A–Z a–z 0–9 - _ . ~ *`) pass through.

use crate::error::FormatError;

pub fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

pub fn urldecode(input: &str) -> Result<String, FormatError> {
    let mut bytes = Vec::with_capacity(input.len());
    let mut rest = input.as_bytes();

    while let Some((&byte, tail)) = rest.split_first() {
        match byte {
            b'+' => {
                bytes.push(b' ');
                rest = tail;
            }
            b'%' => {
                let (escape, tail) = tail.split_at_checked(2).ok_or_else(|| {
                    FormatError::malformed(format!("truncated percent escape in '{input}'"))
                })?;
                let hex = std::str::from_utf8(escape)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        FormatError::malformed(format!("invalid percent escape in '{input}'"))
                    })?;
                bytes.push(hex);
                rest = tail;
            }
            other => {
                bytes.push(other);
                rest = tail;
            }
        }
    }

    String::from_utf8(bytes)
        .map_err(|_| FormatError::malformed(format!("invalid UTF-8 after decoding '{input}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let original = "héllo wörld/with?query=chars&more";
        let encoded = urlencode(original);
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('/'));
        assert_eq!(urldecode(&encoded).unwrap(), original);
    }

    #[test]
    fn space_becomes_plus() {
        assert_eq!(urlencode("a b"), "a+b");
        assert_eq!(urldecode("a+b").unwrap(), "a b");
    }

    #[test]
    fn rejects_truncated_escape() {
        assert!(urldecode("abc%2").is_err());
        assert!(urldecode("abc%zz").is_err());
    }
}
