//! Decimal encoding and checked arithmetic for token amounts.
//!
//! Amounts travel as decimal ASCII both in invoke arguments and in the world
//! state. Stored values are always written by [`encode`], so [`decode`] only
//! accepts the canonical form and treats anything else as corrupt state.

use crate::error::{TokenError, TokenResult};

/// Signed machine integer used for balances, allowances and supply.
///
/// Signed so that negative arguments can be parsed and rejected explicitly
/// instead of failing as malformed input.
pub type Amount = i64;

/// Adds two amounts, failing instead of wrapping.
pub fn add(a: Amount, b: Amount) -> TokenResult<Amount> {
    a.checked_add(b).ok_or(TokenError::Overflow { a, b })
}

/// Subtracts `b` from `a`. `b` must be strictly positive and not exceed `a`.
pub fn sub(a: Amount, b: Amount) -> TokenResult<Amount> {
    if b <= 0 {
        return Err(TokenError::InvalidAmount(format!(
            "the subtraction number is {b}, it should be greater than 0"
        )));
    }
    if a < b {
        return Err(TokenError::Underflow { a, b });
    }
    Ok(a - b)
}

/// Parses an integer invoke argument.
///
/// Accepts an optional leading `-` followed by ASCII digits. Whitespace, a
/// leading `+` and values outside the machine range are rejected.
pub fn parse_arg(raw: &str) -> TokenResult<Amount> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::InvalidAmount(format!("{raw:?} is not a decimal integer")));
    }
    raw.parse::<Amount>()
        .map_err(|_| TokenError::InvalidAmount(format!("{raw} is out of range")))
}

/// Encodes a stored amount.
pub fn encode(value: Amount) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decodes an amount stored under `key`.
pub fn decode(key: &str, raw: &[u8]) -> TokenResult<Amount> {
    let corrupt = || TokenError::CorruptState { key: key.to_string() };
    let text = std::str::from_utf8(raw).map_err(|_| corrupt())?;
    let value = text.parse::<Amount>().map_err(|_| corrupt())?;
    if value < 0 || value.to_string() != text {
        return Err(corrupt());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_detects_overflow() {
        assert_eq!(add(Amount::MAX - 1, 1), Ok(Amount::MAX));
        assert_eq!(add(Amount::MAX, 1), Err(TokenError::Overflow { a: Amount::MAX, b: 1 }));
    }

    #[test]
    fn sub_requires_positive_subtrahend() {
        assert!(matches!(sub(10, 0), Err(TokenError::InvalidAmount(_))));
        assert!(matches!(sub(10, -3), Err(TokenError::InvalidAmount(_))));
        assert_eq!(sub(10, 11), Err(TokenError::Underflow { a: 10, b: 11 }));
        assert_eq!(sub(10, 10), Ok(0));
    }

    #[test]
    fn parse_arg_is_strict() {
        assert_eq!(parse_arg("1000"), Ok(1000));
        assert_eq!(parse_arg("-5"), Ok(-5));
        for bad in ["", "-", "+5", " 5", "5 ", "1e3", "0x10", "99999999999999999999"] {
            assert!(matches!(parse_arg(bad), Err(TokenError::InvalidAmount(_))), "{bad:?}");
        }
    }

    #[test]
    fn decode_accepts_only_canonical_values() {
        assert_eq!(decode("alice", b"700"), Ok(700));
        assert_eq!(decode("alice", &encode(Amount::MAX)), Ok(Amount::MAX));
        let malformed: [&[u8]; 5] = [b"007", b"+7", b"-7", b"", b"\xff"];
        for bad in malformed {
            assert_eq!(
                decode("alice", bad),
                Err(TokenError::CorruptState { key: "alice".into() })
            );
        }
    }
}
