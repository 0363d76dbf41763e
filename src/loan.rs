use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{
    check_months, check_non_negative, check_positive, LoanError, LoanResult, MAX_TERM_MONTHS,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum InterestType {
    /// Annuity: constant payment, shifting interest/principal split.
    #[default]
    Fixed,
    /// Constant principal installment, interest on the declining balance.
    Reducing,
}

impl fmt::Display for InterestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestType::Fixed => write!(f, "fixed"),
            InterestType::Reducing => write!(f, "reducing"),
        }
    }
}

impl FromStr for InterestType {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(InterestType::Fixed),
            "reducing" => Ok(InterestType::Reducing),
            other => Err(LoanError::invalid(
                "interest_type",
                format!("unknown interest type '{other}'"),
            )),
        }
    }
}

/// Validated loan parameters. The annual rate is a percentage (5.0 means 5%).
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanInput {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_months: u32,
    pub interest_type: InterestType,
}

impl LoanInput {
    pub fn new(
        principal: f64,
        annual_rate: f64,
        term_months: u32,
        interest_type: InterestType,
    ) -> LoanResult<Self> {
        check_loan(principal, annual_rate, term_months)?;
        Ok(Self {
            principal,
            annual_rate,
            term_months,
            interest_type,
        })
    }

    pub fn from_years(
        principal: f64,
        annual_rate: f64,
        years: f64,
        interest_type: InterestType,
    ) -> LoanResult<Self> {
        Self::new(principal, annual_rate, years_to_months(years)?, interest_type)
    }

    pub fn monthly_rate(&self) -> f64 {
        monthly_rate(self.annual_rate)
    }

    pub fn summary(&self) -> LoanSummary {
        build_summary(self)
    }
}

impl fmt::Display for LoanInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loan of ${:.2} at {}% over {} months",
            self.interest_type, self.principal, self.annual_rate, self.term_months
        )
    }
}

/// First, last and mean payment of a reducing-balance loan.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReducingPayments {
    pub first: f64,
    pub last: f64,
    pub average: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanSummary {
    /// For reducing loans this is the mean of the first and last payment;
    /// use the schedule for the real month-by-month figures.
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_amount: f64,
    /// total interest as a percentage of principal
    pub interest_percentage: f64,
    /// monthly payment as a percentage of principal
    pub payment_to_loan_ratio: f64,
    pub term_months: u32,
    pub interest_type: InterestType,
    pub reducing: Option<ReducingPayments>,
}

impl LoanSummary {
    /// Currency fields rounded to whole units. Ratios are left as computed.
    pub fn rounded(&self) -> Self {
        Self {
            monthly_payment: round(self.monthly_payment, 0),
            total_interest: round(self.total_interest, 0),
            total_amount: round(self.total_amount, 0),
            reducing: self.reducing.map(|r| ReducingPayments {
                first: round(r.first, 0),
                last: round(r.last, 0),
                average: round(r.average, 0),
            }),
            ..*self
        }
    }
}

impl fmt::Display for LoanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} over {} months, payment ${:.2}, total interest ${:.2} ({:.2}%), total ${:.2}",
            self.interest_type,
            self.term_months,
            self.monthly_payment,
            self.total_interest,
            self.interest_percentage,
            self.total_amount
        )?;
        if let Some(r) = &self.reducing {
            write!(f, ", first ${:.2}, last ${:.2}", r.first, r.last)?;
        }
        Ok(())
    }
}

/// Round `amt` to `dec` decimal places.
pub fn round(amt: f64, dec: i32) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powi(dec)).round() / 10_f64.powi(dec)
    }
}

pub fn years_to_months(years: f64) -> LoanResult<u32> {
    check_positive("years", years)?;
    let months = (years * 12.).round();
    if months < 1. || months > MAX_TERM_MONTHS as f64 {
        return Err(LoanError::invalid(
            "years",
            format!(
                "{years} years must come to between 1 and {MAX_TERM_MONTHS} whole months"
            ),
        ));
    }
    Ok(months as u32)
}

pub(crate) fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100. / 12.
}

pub(crate) fn check_loan(principal: f64, annual_rate: f64, months: u32) -> LoanResult<()> {
    check_positive("principal", principal)?;
    check_non_negative("annual_rate", annual_rate)?;
    check_months("months", months)
}

/// `(1 + rate)^months - 1`, kept accurate when `rate` is tiny.
pub(crate) fn compound_growth(rate: f64, months: u32) -> f64 {
    (months as f64 * rate.ln_1p()).exp_m1()
}

// payment for already validated inputs; `rate` is the monthly rate
pub(crate) fn annuity_payment(principal: f64, rate: f64, months: u32) -> f64 {
    let growth = compound_growth(rate, months);
    if growth == 0. {
        return principal / months as f64;
    }
    principal * rate * (1. + growth) / growth
}

fn reducing_stats(principal: f64, rate: f64, months: u32) -> ReducingPayments {
    let installment = principal / months as f64;
    let first = installment + principal * rate;
    let last = installment + installment * rate;
    ReducingPayments {
        first,
        last,
        average: (first + last) / 2.,
    }
}

fn reducing_total_interest(principal: f64, rate: f64, months: u32) -> f64 {
    let installment = principal / months as f64;
    let mut balance = principal;
    let mut total = 0.;
    for month in 1..=months {
        let interest = balance * rate;
        total += interest;
        balance -= installment;
        trace!("month {}, interest {}, balance {}", month, interest, balance);
    }
    total
}

pub fn fixed_monthly_payment(principal: f64, annual_rate: f64, months: u32) -> LoanResult<f64> {
    check_loan(principal, annual_rate, months)?;
    Ok(annuity_payment(principal, monthly_rate(annual_rate), months))
}

pub fn reducing_payment_stats(
    principal: f64,
    annual_rate: f64,
    months: u32,
) -> LoanResult<ReducingPayments> {
    check_loan(principal, annual_rate, months)?;
    Ok(reducing_stats(principal, monthly_rate(annual_rate), months))
}

pub fn loan_summary(
    principal: f64,
    annual_rate: f64,
    years: f64,
    interest_type: InterestType,
) -> LoanResult<LoanSummary> {
    Ok(LoanInput::from_years(principal, annual_rate, years, interest_type)?.summary())
}

fn build_summary(input: &LoanInput) -> LoanSummary {
    let LoanInput {
        principal,
        term_months,
        interest_type,
        ..
    } = *input;
    let rate = input.monthly_rate();

    let (monthly_payment, total_interest, reducing) = match interest_type {
        InterestType::Fixed => {
            let payment = annuity_payment(principal, rate, term_months);
            let interest = if rate == 0. {
                0.
            } else {
                payment * term_months as f64 - principal
            };
            (payment, interest, None)
        }
        InterestType::Reducing => {
            let stats = reducing_stats(principal, rate, term_months);
            (
                stats.average,
                reducing_total_interest(principal, rate, term_months),
                Some(stats),
            )
        }
    };

    let summary = LoanSummary {
        monthly_payment,
        total_interest,
        total_amount: principal + total_interest,
        interest_percentage: total_interest / principal * 100.,
        payment_to_loan_ratio: monthly_payment / principal * 100.,
        term_months,
        interest_type,
        reducing,
    };
    debug!("{}: {}", input, summary);
    summary
}
