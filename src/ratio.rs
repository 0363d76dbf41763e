use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{check_non_negative, check_positive, LoanError, LoanResult};
use crate::loan::{compound_growth, monthly_rate, round, years_to_months};

pub const SAFE_THRESHOLD_PERCENT: f64 = 25.;
pub const ACCEPTABLE_THRESHOLD_PERCENT: f64 = 33.;
/// Ratios above this are classed as danger. Some lenders tolerate up to
/// 50%; see [`RiskPolicy::lenient`].
pub const DANGER_THRESHOLD_PERCENT: f64 = 40.;
pub const LENIENT_DANGER_THRESHOLD_PERCENT: f64 = 50.;
pub const DEFAULT_MAX_DEBT_RATIO_PERCENT: f64 = 33.;

/// Upper bounds (inclusive, in percent of salary) of each risk band.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RiskPolicy {
    pub safe_max: f64,
    pub acceptable_max: f64,
    pub warning_max: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            safe_max: SAFE_THRESHOLD_PERCENT,
            acceptable_max: ACCEPTABLE_THRESHOLD_PERCENT,
            warning_max: DANGER_THRESHOLD_PERCENT,
        }
    }
}

impl RiskPolicy {
    pub fn lenient() -> Self {
        Self {
            warning_max: LENIENT_DANGER_THRESHOLD_PERCENT,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> LoanResult<()> {
        check_positive("safe_max", self.safe_max)?;
        check_positive("acceptable_max", self.acceptable_max)?;
        check_positive("warning_max", self.warning_max)?;
        if self.safe_max <= self.acceptable_max && self.acceptable_max <= self.warning_max {
            Ok(())
        } else {
            Err(LoanError::invalid(
                "risk_policy",
                format!(
                    "thresholds must be ordered, got {} / {} / {}",
                    self.safe_max, self.acceptable_max, self.warning_max
                ),
            ))
        }
    }

    pub fn classify(&self, debt_ratio: f64) -> DebtStatus {
        if debt_ratio <= self.safe_max {
            DebtStatus::Safe
        } else if debt_ratio <= self.acceptable_max {
            DebtStatus::Acceptable
        } else if debt_ratio <= self.warning_max {
            DebtStatus::Warning
        } else {
            DebtStatus::Danger
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DebtStatus {
    Safe,
    Acceptable,
    Warning,
    Danger,
}

impl DebtStatus {
    pub fn message(&self) -> &'static str {
        match self {
            DebtStatus::Safe => "Your finances are in excellent, very safe shape.",
            DebtStatus::Acceptable => {
                "Your position is acceptable, but watch out for new commitments."
            }
            DebtStatus::Warning => "Your debt ratio is high. Try to reduce your commitments.",
            DebtStatus::Danger => {
                "Your debt ratio is dangerous and will strain your day-to-day budget."
            }
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebtStatus::Safe => "safe",
            DebtStatus::Acceptable => "acceptable",
            DebtStatus::Warning => "warning",
            DebtStatus::Danger => "danger",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebtRatioResult {
    pub total_commitments: f64,
    /// percent of salary, unrounded
    pub debt_ratio: f64,
    pub net_salary: f64,
    pub net_salary_percentage: f64,
    pub status: DebtStatus,
    pub message: String,
}

impl fmt::Display for DebtRatioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "commitments ${:.2}, debt ratio {:.2}% ({}), net salary ${:.2} ({:.2}%): {}",
            self.total_commitments,
            self.debt_ratio,
            self.status,
            self.net_salary,
            self.net_salary_percentage,
            self.message
        )
    }
}

pub fn debt_ratio(
    salary: f64,
    monthly_payment: f64,
    other_commitments: f64,
) -> LoanResult<DebtRatioResult> {
    debt_ratio_with_policy(salary, monthly_payment, other_commitments, &RiskPolicy::default())
}

pub fn debt_ratio_with_policy(
    salary: f64,
    monthly_payment: f64,
    other_commitments: f64,
    policy: &RiskPolicy,
) -> LoanResult<DebtRatioResult> {
    check_positive("salary", salary)?;
    check_non_negative("monthly_payment", monthly_payment)?;
    check_non_negative("other_commitments", other_commitments)?;
    policy.validate()?;

    let total_commitments = monthly_payment + other_commitments;
    let ratio = total_commitments / salary * 100.;
    let net_salary = salary - total_commitments;
    let status = policy.classify(ratio);

    if status == DebtStatus::Danger {
        warn!("debt ratio {:.2}% exceeds {}%", ratio, policy.warning_max);
    } else {
        debug!("debt ratio {:.2}% classed {}", ratio, status);
    }

    Ok(DebtRatioResult {
        total_commitments,
        debt_ratio: ratio,
        net_salary,
        net_salary_percentage: net_salary / salary * 100.,
        status,
        message: status.message().to_string(),
    })
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CapacityStatus {
    CannotBorrow,
    Excellent,
    Good,
    Limited,
}

impl CapacityStatus {
    pub fn message(&self) -> &'static str {
        match self {
            CapacityStatus::CannotBorrow => {
                "Your current commitments leave no room to borrow safely."
            }
            CapacityStatus::Excellent => "Your borrowing capacity is excellent.",
            CapacityStatus::Good => "Your borrowing capacity is good.",
            CapacityStatus::Limited => "Your borrowing capacity is limited.",
        }
    }
}

impl fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapacityStatus::CannotBorrow => "cannot borrow",
            CapacityStatus::Excellent => "excellent",
            CapacityStatus::Good => "good",
            CapacityStatus::Limited => "limited",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BorrowingCapacity {
    pub max_loan_amount: f64,
    /// the affordable payment after existing commitments
    pub monthly_payment: f64,
    /// that payment as a percent of salary
    pub debt_ratio: f64,
    pub term_months: u32,
    pub status: CapacityStatus,
    pub message: String,
}

impl BorrowingCapacity {
    pub fn rounded(&self) -> Self {
        Self {
            max_loan_amount: round(self.max_loan_amount, 0),
            monthly_payment: round(self.monthly_payment, 0),
            ..self.clone()
        }
    }
}

impl fmt::Display for BorrowingCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max loan ${:.2} over {} months at ${:.2}/month ({:.2}% of salary, {}): {}",
            self.max_loan_amount,
            self.term_months,
            self.monthly_payment,
            self.debt_ratio,
            self.status,
            self.message
        )
    }
}

pub fn max_borrowing_capacity(
    salary: f64,
    annual_rate: f64,
    years: f64,
    other_commitments: f64,
    max_debt_ratio: f64,
) -> LoanResult<BorrowingCapacity> {
    max_borrowing_capacity_with_policy(
        salary,
        annual_rate,
        years,
        other_commitments,
        max_debt_ratio,
        &RiskPolicy::default(),
    )
}

pub fn max_borrowing_capacity_with_policy(
    salary: f64,
    annual_rate: f64,
    years: f64,
    other_commitments: f64,
    max_debt_ratio: f64,
    policy: &RiskPolicy,
) -> LoanResult<BorrowingCapacity> {
    check_positive("salary", salary)?;
    check_non_negative("annual_rate", annual_rate)?;
    check_non_negative("other_commitments", other_commitments)?;
    check_positive("max_debt_ratio", max_debt_ratio)?;
    if max_debt_ratio > 100. {
        return Err(LoanError::invalid(
            "max_debt_ratio",
            format!("must not exceed 100%, got {max_debt_ratio}"),
        ));
    }
    policy.validate()?;
    let months = years_to_months(years)?;

    let max_payment = salary * max_debt_ratio / 100. - other_commitments;
    if max_payment <= 0. {
        warn!(
            "commitments ${:.2} leave no room under a {}% ceiling",
            other_commitments, max_debt_ratio
        );
        let status = CapacityStatus::CannotBorrow;
        return Ok(BorrowingCapacity {
            max_loan_amount: 0.,
            monthly_payment: 0.,
            debt_ratio: 0.,
            term_months: months,
            status,
            message: status.message().to_string(),
        });
    }

    let rate = monthly_rate(annual_rate);
    let growth = compound_growth(rate, months);
    let max_loan_amount = if growth == 0. {
        max_payment * months as f64
    } else {
        max_payment * growth / (rate * (1. + growth))
    };

    let ratio = max_payment / salary * 100.;
    let status = if ratio <= policy.safe_max {
        CapacityStatus::Excellent
    } else if ratio <= policy.acceptable_max {
        CapacityStatus::Good
    } else {
        CapacityStatus::Limited
    };
    if status == CapacityStatus::Limited {
        warn!("capacity payment is {:.2}% of salary", ratio);
    }
    debug!(
        "max loan {} over {} months at {}/month",
        max_loan_amount, months, max_payment
    );

    Ok(BorrowingCapacity {
        max_loan_amount,
        monthly_payment: max_payment,
        debt_ratio: ratio,
        term_months: months,
        status,
        message: status.message().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{loan_summary, InterestType};
    use proptest::prelude::{prop_assert, proptest};
    use test_log::test;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn test_debt_ratio_safe_boundary() {
        let result = debt_ratio(10000., 2500., 0.).unwrap();
        assert_eq!(result.debt_ratio, 25.);
        assert_eq!(result.status, DebtStatus::Safe);
        assert_eq!(result.total_commitments, 2500.);
        assert_eq!(result.net_salary, 7500.);
        assert_eq!(result.net_salary_percentage, 75.);
        assert_eq!(result.message, DebtStatus::Safe.message());
    }

    #[test]
    fn test_debt_ratio_bands() {
        assert_eq!(debt_ratio(10000., 2000., 1000.).unwrap().status, DebtStatus::Acceptable);
        assert_eq!(debt_ratio(10000., 3300., 0.).unwrap().status, DebtStatus::Acceptable);
        assert_eq!(debt_ratio(10000., 3000., 1000.).unwrap().status, DebtStatus::Warning);
        assert_eq!(debt_ratio(10000., 4000., 0.).unwrap().status, DebtStatus::Warning);
        assert_eq!(debt_ratio(10000., 4500., 0.).unwrap().status, DebtStatus::Danger);
    }

    #[test]
    fn test_lenient_policy() {
        let policy = RiskPolicy::lenient();
        let result = debt_ratio_with_policy(10000., 4500., 0., &policy).unwrap();
        assert_eq!(result.status, DebtStatus::Warning);
        let result = debt_ratio_with_policy(10000., 5000., 100., &policy).unwrap();
        assert_eq!(result.status, DebtStatus::Danger);
    }

    #[test]
    fn test_debt_ratio_rejects_bad_input() {
        assert!(matches!(
            debt_ratio(0., 100., 0.),
            Err(LoanError::InvalidInput { ref field, .. }) if field == "salary"
        ));
        assert!(debt_ratio(1000., -1., 0.).is_err());
        assert!(debt_ratio(1000., 100., -5.).is_err());

        let unordered = RiskPolicy {
            safe_max: 40.,
            acceptable_max: 33.,
            warning_max: 50.,
        };
        assert!(debt_ratio_with_policy(1000., 100., 0., &unordered).is_err());
    }

    #[test]
    fn test_commitments_beyond_salary() {
        let result = debt_ratio(3000., 2500., 1000.).unwrap();
        assert_eq!(result.net_salary, -500.);
        assert_eq!(result.status, DebtStatus::Danger);
    }

    #[test]
    fn test_borrowing_capacity() {
        let capacity =
            max_borrowing_capacity(10000., 5., 5., 0., DEFAULT_MAX_DEBT_RATIO_PERCENT).unwrap();
        assert_close(capacity.monthly_payment, 3300., 1e-9);
        assert_close(capacity.max_loan_amount, 174869.33, 0.01);
        assert_eq!(capacity.term_months, 60);
        assert_close(capacity.debt_ratio, 33., 1e-9);
        assert_eq!(capacity.status, CapacityStatus::Good);
        assert_eq!(capacity.rounded().max_loan_amount, 174869.);
    }

    #[test]
    fn test_borrowing_capacity_with_commitments() {
        let capacity = max_borrowing_capacity(10000., 5., 5., 1000., 33.).unwrap();
        assert_close(capacity.monthly_payment, 2300., 1e-9);
        assert_close(capacity.debt_ratio, 23., 1e-9);
        assert_eq!(capacity.status, CapacityStatus::Excellent);

        let capacity = max_borrowing_capacity(10000., 5., 5., 0., 40.).unwrap();
        assert_eq!(capacity.status, CapacityStatus::Limited);
    }

    #[test]
    fn test_borrowing_capacity_zero_rate() {
        let capacity = max_borrowing_capacity(10000., 0., 5., 0., 33.).unwrap();
        assert_close(capacity.max_loan_amount, 198000., 1e-6);
    }

    #[test]
    fn test_borrowing_capacity_tiny_rate() {
        let capacity = max_borrowing_capacity(10000., 1e-14, 5., 0., 33.).unwrap();
        assert!(capacity.max_loan_amount.is_finite());
        assert_close(capacity.max_loan_amount, 198000., 1e-6);
    }

    #[test]
    fn test_cannot_borrow() {
        let capacity = max_borrowing_capacity(5000., 5., 10., 1650., 33.).unwrap();
        assert_eq!(capacity.status, CapacityStatus::CannotBorrow);
        assert_eq!(capacity.max_loan_amount, 0.);
        assert_eq!(capacity.monthly_payment, 0.);
        assert_eq!(capacity.debt_ratio, 0.);
    }

    #[test]
    fn test_capacity_rejects_bad_input() {
        assert!(max_borrowing_capacity(0., 5., 5., 0., 33.).is_err());
        assert!(max_borrowing_capacity(5000., -5., 5., 0., 33.).is_err());
        assert!(max_borrowing_capacity(5000., 5., 0., 0., 33.).is_err());
        assert!(max_borrowing_capacity(5000., 5., 150., 0., 33.).is_err());
        assert!(max_borrowing_capacity(5000., 5., 5., 0., 0.).is_err());
        assert!(max_borrowing_capacity(5000., 5., 5., 0., 120.).is_err());
    }

    proptest! {
        #[test]
        fn prop_net_salary_and_commitments_sum_to_salary(
            salary in 1u32..1_000_000,
            payment in 0u32..500_000,
            other in 0u32..500_000
        ) {
            let salary = salary as f64;
            let result = debt_ratio(salary, payment as f64, other as f64).unwrap();
            prop_assert!((result.net_salary + result.total_commitments - salary).abs() < 1e-6);
        }

        #[test]
        fn prop_capacity_round_trips_through_summary(
            salary in 1_000u32..100_000,
            rate_bp in 0u32..2_000,
            years in 1u32..31,
            other_pct in 0u32..30
        ) {
            let salary = salary as f64;
            let other = salary * other_pct as f64 / 100.;
            let capacity =
                max_borrowing_capacity(salary, rate_bp as f64 / 100., years as f64, other, 33.)
                    .unwrap();
            prop_assert!(capacity.max_loan_amount > 0.);
            let summary = loan_summary(
                capacity.max_loan_amount,
                rate_bp as f64 / 100.,
                years as f64,
                InterestType::Fixed,
            )
            .unwrap();
            prop_assert!((summary.monthly_payment - capacity.monthly_payment).abs() < 1e-6);
        }
    }
}
