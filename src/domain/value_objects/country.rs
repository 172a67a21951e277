//! ISO 3166-1 alpha-2 country codes, normalized to uppercase.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    pub fn new(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(format!(
                "Country code must be two letters, got {:?}",
                trimmed
            ));
        }
        Ok(CountryCode([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Constructor guarantees ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalizes_case() {
        assert_eq!(CountryCode::new("ru").unwrap().as_str(), "RU");
        assert_eq!(CountryCode::new("De").unwrap().as_str(), "DE");
    }

    #[test]
    fn test_country_code_trims_whitespace() {
        assert_eq!(CountryCode::new(" kz ").unwrap().as_str(), "KZ");
    }

    #[test]
    fn test_country_code_rejects_bad_input() {
        assert!(CountryCode::new("RUS").is_err());
        assert!(CountryCode::new("R").is_err());
        assert!(CountryCode::new("12").is_err());
        assert!(CountryCode::new("").is_err());
    }

    #[test]
    fn test_country_code_equality() {
        assert_eq!(
            CountryCode::new("ru").unwrap(),
            CountryCode::new("RU").unwrap()
        );
    }
}
