use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use validator::ValidationError;

pub fn validate_condition(condition: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref CONDITION_VALIDATION_RE: Regex = Regex::new(r"^[a-z_]{1,32}$").unwrap();
    }

    if CONDITION_VALIDATION_RE.is_match(condition) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("condition"),
            message: Some(Cow::from("Condition must be a lowercase slug")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref CURRENCY_VALIDATION_RE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    }

    if CURRENCY_VALIDATION_RE.is_match(currency) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("currency"),
            message: Some(Cow::from("Currency must be an ISO 4217 code")),
            params: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition() {
        assert!(validate_condition("like_new").is_ok());
        assert!(validate_condition("Used").is_err());
        assert!(validate_condition("").is_err());
    }

    #[test]
    fn test_currency() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("EURO").is_err());
    }
}
