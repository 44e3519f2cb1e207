use std::sync::OnceLock;

use regex::Regex;

fn e164_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("valid E.164 pattern"))
}

/// Strips the punctuation people type into phone fields so that
/// `+55 (11) 98888-7777` and `+5511988887777` identify the same customer.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')' | '\t'))
        .collect()
}

/// True when the number is already in strict E.164 form (no normalization applied).
pub fn is_e164(phone: &str) -> bool {
    e164_pattern().is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_removes_formatting() {
        assert_eq!(normalize_phone("+55 (11) 98888-7777"), "+5511988887777");
        assert_eq!(normalize_phone(" 555.123.4567 "), "5551234567");
    }

    #[test]
    fn e164_requires_plus_and_country_code() {
        assert!(is_e164("+5511988887777"));
        assert!(is_e164("+14155550100"));
        assert!(!is_e164("5511988887777"));
        assert!(!is_e164("+0123456789"));
        assert!(!is_e164("+1 415 555 0100"));
        assert!(!is_e164("+1234567890123456"));
    }
}
