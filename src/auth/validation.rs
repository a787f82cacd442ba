use lazy_static::lazy_static;
use regex::Regex;

pub(crate) const WEAK_PASSWORD_MSG: &str = "Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// At least 8 characters with an uppercase letter, a lowercase letter, a digit and a
/// punctuation or symbol character.
pub(crate) fn is_strong_password(password: &str) -> bool {
    if password.chars().count() < 8 {
        return false;
    }

    let (mut upper, mut lower, mut digit, mut special) = (false, false, false, false);
    for c in password.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_numeric() {
            digit = true;
        } else if !c.is_whitespace() && !c.is_control() && !c.is_alphanumeric() {
            special = true;
        }
    }
    upper && lower && digit && special
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.co"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn password_strength() {
        assert!(is_strong_password("StrongP@ss1"));
        assert!(!is_strong_password("Sh0rt!"));
        assert!(!is_strong_password("nouppercase1!"));
        assert!(!is_strong_password("NOLOWERCASE1!"));
        assert!(!is_strong_password("NoDigitsHere!"));
        assert!(!is_strong_password("NoSpecial123"));
        assert!(!is_strong_password("With Space1a"));
    }
}
