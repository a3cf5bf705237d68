use crate::error::{AppError, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static USER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-.:@]{1,128}$").expect("user id pattern is valid")
});

static PLANNING_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]{1,64}$").expect("planning id pattern is valid")
});

/// Largest window accepted by the date-range check, counting both ends.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Highest page number forwarded upstream.
pub const MAX_PAGE: usize = 10_000;

/// Validates an account identifier (auth uid).
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("User ID is required".to_string()));
    }

    if !USER_ID.is_match(user_id) {
        return Err(AppError::Validation("User ID contains invalid characters".to_string()));
    }

    Ok(())
}

/// Validates a BuildingInfo `planning_id`.
pub fn validate_planning_id(planning_id: &str) -> Result<()> {
    if planning_id.trim().is_empty() {
        return Err(AppError::Validation("Planning ID is required".to_string()));
    }

    if !PLANNING_ID.is_match(planning_id) {
        return Err(AppError::Validation("Planning ID contains invalid characters".to_string()));
    }

    Ok(())
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Parses and orders a start/end pair.
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_iso_date(start)?;
    let end = parse_iso_date(end)?;

    if start > end {
        return Err(AppError::Validation("Start date must not be after end date".to_string()));
    }

    if (end - start).num_days() + 1 > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "Date range must not exceed {} days",
            MAX_RANGE_DAYS
        )));
    }

    Ok((start, end))
}

/// Resolves `page`/`limit` query values into `(page, limit)`, 1-based.
pub fn normalize_pagination(
    page: Option<usize>,
    limit: Option<usize>,
    default_limit: usize,
    max_limit: usize,
) -> (usize, usize) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("kT3nRz0aQ1bW9xY2cD4eF6gH8iJ1").is_ok());
        assert!(validate_user_id("user@example.com").is_ok());

        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id("user id").is_err());
        assert!(validate_user_id(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_planning_id() {
        assert!(validate_planning_id("345678").is_ok());
        assert!(validate_planning_id("PL-2024_01").is_ok());

        assert!(validate_planning_id("").is_err());
        assert!(validate_planning_id("12;DROP").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let (start, end) = validate_date_range("2024-01-01", "2024-01-31").unwrap();
        assert_eq!((end - start).num_days(), 30);

        assert!(validate_date_range("2024-02-01", "2024-01-01").is_err());
        assert!(validate_date_range("01/01/2024", "2024-01-31").is_err());
        assert!(validate_date_range("2022-01-01", "2024-01-01").is_err());

        // 2024 is a leap year: the whole year is 366 days, one more is too many.
        assert!(validate_date_range("2024-01-01", "2024-12-31").is_ok());
        let err = validate_date_range("2024-01-01", "2025-01-01").unwrap_err();
        assert!(err.to_string().contains("366 days"));
    }

    #[test]
    fn test_normalize_pagination() {
        assert_eq!(normalize_pagination(None, None, 20, 100), (1, 20));
        assert_eq!(normalize_pagination(Some(0), Some(0), 20, 100), (1, 1));
        assert_eq!(normalize_pagination(Some(3), Some(500), 20, 100), (3, 100));
        assert_eq!(normalize_pagination(Some(usize::MAX), None, 20, 100), (MAX_PAGE, 20));
    }
}
