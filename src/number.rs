//! Decoder for the fixed `-?d{1,2}.d` measurement format.

use crate::error::{BrcError, Result};

/// Decodes a value token such as `-12.3` into whole tenths (`-123`).
///
/// Only byte arithmetic is involved and the result is exact, so sums of
/// decoded values do not depend on the order they are added in. A single
/// trailing `\r` (CRLF input) is ignored. `offset` is reported in the error
/// for anything else that does not match the grammar.
pub fn decode(token: &[u8], offset: u64) -> Result<i32> {
    let token = token.strip_suffix(b"\r").unwrap_or(token);
    decode_tenths(token).ok_or_else(|| BrcError::MalformedValue {
        offset,
        token: String::from_utf8_lossy(token).into_owned(),
    })
}

/// Converts whole tenths back to the decimal value they stand for.
pub fn to_f64(tenths: i64) -> f64 {
    tenths as f64 / 10.0
}

fn decode_tenths(token: &[u8]) -> Option<i32> {
    let (negative, digits) = match token {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, token),
    };
    let (whole, frac) = match digits {
        [a, b'.', f] => (digit(*a)?, digit(*f)?),
        [a, b, b'.', f] => (digit(*a)? * 10 + digit(*b)?, digit(*f)?),
        _ => return None,
    };
    let tenths = whole * 10 + frac;
    Some(if negative { -tenths } else { tenths })
}

#[inline]
fn digit(b: u8) -> Option<i32> {
    b.is_ascii_digit().then(|| (b - b'0') as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_domain_values() {
        assert_eq!(decode(b"0.0", 0).unwrap(), 0);
        assert_eq!(decode(b"-9.9", 0).unwrap(), -99);
        assert_eq!(decode(b"99.9", 0).unwrap(), 999);
        assert_eq!(decode(b"-99.9", 0).unwrap(), -999);
        assert_eq!(decode(b"7.5", 0).unwrap(), 75);
        assert_eq!(decode(b"-03.4", 0).unwrap(), -34);
        assert_eq!(to_f64(-34), -3.4);
    }

    #[test]
    fn negative_zero_is_plain_zero() {
        assert_eq!(decode(b"-0.0", 0).unwrap(), 0);
        assert!(to_f64(0).is_sign_positive());
    }

    #[test]
    fn rejects_tokens_outside_grammar() {
        for token in [&b""[..], b"1.23", b"1", b"-.5", b"1.a", b"123.4", b"+1.0", b"1,0", b"-", b"1."] {
            match decode(token, 42) {
                Err(BrcError::MalformedValue { offset, .. }) => assert_eq!(offset, 42),
                other => panic!("{:?} decoded to {:?}", token, other),
            }
        }
    }

    #[test]
    fn strips_one_carriage_return() {
        assert_eq!(decode(b"12.5\r", 0).unwrap(), 125);
        assert!(decode(b"12.5\r\r", 0).is_err());
    }
}
