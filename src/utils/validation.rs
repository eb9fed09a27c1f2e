use crate::utils::error::{Result, SelectionError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SelectionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(SelectionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_score(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SelectionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Score must be a finite, non-negative number".to_string(),
        });
    }
    Ok(())
}

pub fn validate_age_range(
    field_name: &str,
    min_age: Option<u32>,
    max_age: Option<u32>,
) -> Result<()> {
    if let (Some(min), Some(max)) = (min_age, max_age) {
        if min > max {
            return Err(SelectionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format!("{}-{}", min, max),
                reason: "min_age must not exceed max_age".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SelectionError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SelectionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("rules.qualification_count", 2, 1).is_ok());
        assert!(validate_positive_number("rules.qualification_count", 0, 1).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score("min_qualification_scores.trampoline", 81.5).is_ok());
        assert!(validate_score("min_qualification_scores.trampoline", -1.0).is_err());
        assert!(validate_score("min_qualification_scores.trampoline", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_age_range() {
        assert!(validate_age_range("divisions.13-14", Some(13), Some(14)).is_ok());
        assert!(validate_age_range("divisions.13-14", Some(13), None).is_ok());
        assert!(validate_age_range("divisions.13-14", Some(15), Some(14)).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let year: Option<i32> = None;
        assert!(matches!(
            validate_required_field("year", &year),
            Err(SelectionError::MissingConfigError { .. })
        ));
        assert_eq!(*validate_required_field("year", &Some(2025)).unwrap(), 2025);
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("year", 2025, 1900, 2200).is_ok());
        assert!(validate_range("year", 25, 1900, 2200).is_err());
    }
}
