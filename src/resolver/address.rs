//! Offline validation of typed account addresses.
//!
//! Accepts the forms users paste in practice: plain hex with or without the
//! `0x` prefix, EIP-55 checksummed hex, and ICAP (`XE..`) direct addresses.

use alloy::primitives::{Address, B256, U256};
use std::str::FromStr;

const HEX_LEN: usize = 40;
const ICAP_PREFIX: &str = "XE";

pub fn is_literal_address(value: &str) -> bool {
    parse_literal_address(value).is_some()
}

/// Parses `value` as a literal address, without any network access.
///
/// Mixed-case hex must carry a valid checksum; all-lower and all-upper hex
/// are taken as-is.
pub fn parse_literal_address(value: &str) -> Option<Address> {
    parse_hex(value).or_else(|| parse_icap(value))
}

fn parse_hex(value: &str) -> Option<Address> {
    let body = value.strip_prefix("0x").unwrap_or(value);
    if body.len() != HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let address = Address::from_str(body).ok()?;
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let checksummed = address.to_checksum(None);
        if checksummed[2..] != *body {
            return None;
        }
    }
    Some(address)
}

fn parse_icap(value: &str) -> Option<Address> {
    let rest = value.strip_prefix(ICAP_PREFIX)?;
    if rest.len() < 32 || rest.len() > 33 || !rest.is_ascii() {
        return None;
    }
    let (digits, body) = rest.split_at(2);
    if !digits.chars().all(|c| c.is_ascii_digit())
        || !body.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    if icap_checksum(body) != digits {
        return None;
    }
    let word = U256::from_str_radix(&body.to_ascii_lowercase(), 36).ok()?;
    if word.bit_len() > 160 {
        return None;
    }
    Some(Address::from_word(B256::from(word.to_be_bytes::<32>())))
}

/// IBAN mod-97 check digits for `XE??<body>`.
fn icap_checksum(body: &str) -> String {
    let rearranged = format!("{}{}00", body.to_ascii_uppercase(), ICAP_PREFIX);
    let mut remainder = 0u32;
    for c in rearranged.chars() {
        let Some(value) = c.to_digit(36) else {
            return String::new();
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    format!("{:02}", 98 - remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn accepts_checksummed_and_single_case_hex() {
        assert!(is_literal_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_literal_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_literal_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));
        assert!(is_literal_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01"));
    }

    #[test]
    fn accepts_missing_prefix() {
        assert_eq!(
            parse_literal_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Some(address!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"))
        );
    }

    #[test]
    fn rejects_bad_checksum() {
        assert!(!is_literal_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(!is_literal_address(""));
        assert!(!is_literal_address("0x"));
        assert!(!is_literal_address("0x1234"));
        assert!(!is_literal_address("0X5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_literal_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaedff"));
        assert!(!is_literal_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_literal_address(" 0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_literal_address("alice.eth"));
    }

    #[test]
    fn accepts_icap_direct_address() {
        assert_eq!(
            parse_literal_address("XE7338O073KYGTWWZN0F2WZ0R8PX5ZPPZS"),
            Some(address!("00c5496aee77c1ba1f0854206a26dda82a81d6d8"))
        );
    }

    #[test]
    fn rejects_icap_with_wrong_check_digits() {
        assert!(!is_literal_address("XE7438O073KYGTWWZN0F2WZ0R8PX5ZPPZS"));
        assert!(!is_literal_address("XE73"));
    }
}
