use crate::utils::error::{DirectoryError, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("phone pattern"));

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DirectoryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DirectoryError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DirectoryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DirectoryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DirectoryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DirectoryError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DirectoryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(DirectoryError::validation(
            field_name,
            format!("'{}' is not a valid email address", value),
        ));
    }
    Ok(())
}

/// Optional leading `+`, then digits with spaces or dashes; 7 to 15 digits overall.
pub fn validate_phone(field_name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !PHONE_RE.is_match(trimmed) || !(7..=15).contains(&digits) {
        return Err(DirectoryError::validation(
            field_name,
            format!("'{}' is not a valid phone number", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("firestore.base_url", "https://example.com").is_ok());
        assert!(validate_url("firestore.base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("firestore.base_url", "").is_err());
        assert!(validate_url("firestore.base_url", "invalid-url").is_err());
        assert!(validate_url("firestore.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "donor@herosblood.org").is_ok());
        assert!(validate_email("email", " first.last+tag@mail.co.in ").is_ok());
        assert!(validate_email("email", "no-at-sign.org").is_err());
        assert!(validate_email("email", "a@b").is_err());
        assert!(validate_email("email", "").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("phone_number", "+91 98765 43210").is_ok());
        assert!(validate_phone("phone_number", "555-0100-22").is_ok());
        assert!(validate_phone("phone_number", "12345").is_err());
        assert!(validate_phone("phone_number", "call me").is_err());
        assert!(validate_phone("phone_number", "+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3);
        let missing: Option<u32> = None;
        assert_eq!(*validate_required_field("local", &present).unwrap(), 3);
        assert!(matches!(
            validate_required_field("local", &missing),
            Err(DirectoryError::MissingConfigError { .. })
        ));
    }
}
