//! Input validation shared by the services.
//!
//! Every function returns `AppError::InvalidRequest` with a message that is
//! safe to show to the user.

use chrono::{Datelike, Utc};

use crate::error::AppError;

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 2_000;

/// Trim and require a non-empty, bounded name.
pub fn required_name(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize optional free text: blank becomes `None`.
pub fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(AppError::InvalidRequest(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        ))),
        other => Ok(other),
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn email(value: &str) -> Result<String, AppError> {
    let normalized = value.trim().to_lowercase();
    let valid = match normalized.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !normalized.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::InvalidRequest(format!(
            "'{}' is not a valid email address",
            value.trim()
        )));
    }
    Ok(normalized)
}

pub fn optional_email(value: Option<String>) -> Result<Option<String>, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => email(&v).map(Some),
        _ => Ok(None),
    }
}

/// Tax identifiers (DNI, CUIT/CUIL) are stored as digits only.
///
/// Accepts dashes, dots and spaces as separators. Length 7..=11 covers
/// national ids (7-8 digits) and CUIT/CUIL (11 digits).
pub fn tax_id(value: &str) -> Result<String, AppError> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidRequest(
            "tax_id must contain only digits".to_string(),
        ));
    }
    if !(7..=11).contains(&cleaned.len()) {
        return Err(AppError::InvalidRequest(
            "tax_id must have between 7 and 11 digits".to_string(),
        ));
    }
    Ok(cleaned)
}

/// Model year between 1900 and next calendar year.
pub fn model_year(year: i32) -> Result<i32, AppError> {
    let max = Utc::now().year() + 1;
    if !(1900..=max).contains(&year) {
        return Err(AppError::InvalidRequest(format!(
            "year must be between 1900 and {max}"
        )));
    }
    Ok(year)
}

pub fn non_negative_cents(field: &str, value: i64) -> Result<i64, AppError> {
    if value < 0 {
        return Err(AppError::InvalidRequest(format!("{field} cannot be negative")));
    }
    Ok(value)
}

pub fn positive_cents(field: &str, value: i64) -> Result<i64, AppError> {
    if value <= 0 {
        return Err(AppError::InvalidRequest(format!("{field} must be positive")));
    }
    Ok(value)
}

/// Chassis, engine and plate numbers: upper-case, no spaces.
pub fn identifier(field: &str, value: &str) -> Result<String, AppError> {
    let normalized: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if normalized.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    if normalized.len() > 40 || !normalized.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::InvalidRequest(format!(
            "{field} may only contain letters, digits and dashes (max 40)"
        )));
    }
    Ok(normalized)
}

/// `#rrggbb` color.
pub fn hex_color(value: Option<String>) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) => {
            let v = v.trim().to_lowercase();
            let ok = v.len() == 7
                && v.starts_with('#')
                && v[1..].chars().all(|c| c.is_ascii_hexdigit());
            if ok {
                Ok(Some(v))
            } else {
                Err(AppError::InvalidRequest(
                    "color must be a #rrggbb hex value".to_string(),
                ))
            }
        }
    }
}

/// Organization slug: lower-case letters, digits and dashes.
pub fn slug(value: &str) -> Result<String, AppError> {
    let v = value.trim().to_lowercase();
    let ok = (3..=60).contains(&v.len())
        && v.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !v.starts_with('-')
        && !v.ends_with('-');
    if !ok {
        return Err(AppError::InvalidRequest(
            "slug must be 3-60 lower-case letters, digits or dashes".to_string(),
        ));
    }
    Ok(v)
}

pub fn password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < 8 {
        return Err(AppError::InvalidRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Pagination bounds: page starts at 1, at most 100 rows per page.
pub fn pagination(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(25).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_name() {
        assert_eq!(required_name("name", "  Centro ").unwrap(), "Centro");
        assert!(required_name("name", "   ").is_err());
        assert!(required_name("name", &"x".repeat(121)).is_err());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("notes", Some("  ".into())).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some(" ok ".into())).unwrap(),
            Some("ok".to_string())
        );
        assert_eq!(optional_text("notes", None).unwrap(), None);
    }

    #[test]
    fn test_email() {
        assert_eq!(email(" Ana@Example.com ").unwrap(), "ana@example.com");
        assert!(email("ana@").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("ana@example").is_err());
        assert!(email("ana@@example.com").is_err());
        assert!(email("a na@example.com").is_err());
    }

    #[test]
    fn test_tax_id() {
        assert_eq!(tax_id("20-12345678-3").unwrap(), "20123456783");
        assert_eq!(tax_id("12.345.678").unwrap(), "12345678");
        assert!(tax_id("123").is_err());
        assert!(tax_id("20-1234567A-3").is_err());
    }

    #[test]
    fn test_model_year() {
        assert!(model_year(2020).is_ok());
        assert!(model_year(1899).is_err());
        assert!(model_year(Utc::now().year() + 2).is_err());
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("chassis", " 9c2 jc4110 ").unwrap(), "9C2JC4110");
        assert!(identifier("chassis", "").is_err());
        assert!(identifier("chassis", "AB#12").is_err());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color(Some("#FF0000".into())).unwrap(), Some("#ff0000".into()));
        assert!(hex_color(Some("red".into())).is_err());
        assert_eq!(hex_color(None).unwrap(), None);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Motos-Norte").unwrap(), "motos-norte");
        assert!(slug("-bad").is_err());
        assert!(slug("ab").is_err());
        assert!(slug("with space").is_err());
    }

    #[test]
    fn test_pagination() {
        assert_eq!(pagination(None, None), (25, 0));
        assert_eq!(pagination(Some(3), Some(10)), (10, 20));
        assert_eq!(pagination(Some(0), Some(1_000)), (100, 0));
    }
}
