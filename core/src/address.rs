//! Onion service address validation (v3 only).

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const ONION_SUFFIX: &str = ".onion";

fn v3_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z2-7]{56}\.onion$").expect("static regex"))
}

/// True when `s` is exactly 56 lowercase base32 characters followed by `.onion`.
pub fn is_valid_v3_onion(s: &str) -> bool {
    v3_pattern().is_match(s)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid or non-v3 onion address: {0}")]
pub struct AddressError(pub String);

/// A validated v3 onion address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OnionAddress(String);

impl OnionAddress {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if is_valid_v3_onion(s) {
            Ok(OnionAddress(s.to_string()))
        } else {
            Err(AddressError(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OnionAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OnionAddress::parse(s)
    }
}

impl fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OnionAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3(c: char) -> String {
        format!("{}.onion", c.to_string().repeat(56))
    }

    #[test]
    fn accepts_v3() {
        assert!(is_valid_v3_onion(&v3('a')));
        assert!(is_valid_v3_onion("zqktlwiuavvvqqt4ybvgvi7tyo4hjl5xgfuvpdf6otjiycgwqbym2qad.onion"));
    }

    #[test]
    fn rejects_v2_and_noise() {
        assert!(!is_valid_v3_onion("expyuzz4wqqyqhjn.onion"));
        assert!(!is_valid_v3_onion(&v3('A')));
        assert!(!is_valid_v3_onion(&v3('1')));
        assert!(!is_valid_v3_onion(&format!("{}.onion", "a".repeat(57))));
        assert!(!is_valid_v3_onion(&format!("{}.com", "a".repeat(56))));
        assert!(!is_valid_v3_onion(&format!(" {}", v3('a'))));
        assert!(!is_valid_v3_onion(""));
    }

    #[test]
    fn parse_roundtrips_through_display() {
        let a: OnionAddress = v3('b').parse().unwrap();
        assert_eq!(a.to_string(), v3('b'));
        assert!(OnionAddress::parse("example.com").is_err());
    }
}
