use thiserror::Error;

pub type LoanResult<T> = Result<T, LoanError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanError {
    #[error("invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error("math domain error: {0}")]
    MathDomain(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("stored value for {key} is unusable: {reason}")]
    Store { key: String, reason: String },
}

impl LoanError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// shared guards for the scalar inputs every calculation takes

pub(crate) fn check_positive(field: &str, value: f64) -> LoanResult<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(LoanError::invalid(field, format!("must be positive, got {value}")))
    }
}

pub(crate) fn check_non_negative(field: &str, value: f64) -> LoanResult<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(LoanError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ))
    }
}

/// Longest term accepted, in months (100 years).
pub const MAX_TERM_MONTHS: u32 = 1200;

pub(crate) fn check_months(field: &str, months: u32) -> LoanResult<()> {
    if months < 1 {
        Err(LoanError::invalid(field, "must be at least one month"))
    } else if months > MAX_TERM_MONTHS {
        Err(LoanError::invalid(
            field,
            format!("must not exceed {MAX_TERM_MONTHS} months, got {months}"),
        ))
    } else {
        Ok(())
    }
}
