/// `0x5aAe…BeAed`-style abbreviation for long hex strings; short values pass through.
pub fn short_hex(value: &str) -> String {
    let chars: Vec<char> = value.trim().chars().collect();
    if chars.len() <= 12 {
        return chars.into_iter().collect();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::short_hex;

    #[test]
    fn abbreviates_addresses() {
        assert_eq!(
            short_hex("0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"),
            "0x0000…2e1e"
        );
        assert_eq!(short_hex(" 0x1234 "), "0x1234");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(short_hex("ééééééééééééé"), "éééééé…éééé");
    }
}
