use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{check_positive, LoanError, LoanResult};
use crate::loan::{annuity_payment, check_loan, monthly_rate, round};

// absorbs log/division residue so an exact whole term does not round up
const TERM_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EarlyPaymentOutcome {
    pub interest_saved: f64,
    pub time_saved_months: u32,
    /// unchanged instalment while the loan runs on; zero once retired
    pub new_monthly_payment: f64,
    pub new_balance: f64,
    /// months left to pay after the lump sum
    pub new_term_months: u32,
    pub total_savings: f64,
    /// the lump sum retired the loan outright
    pub completed: bool,
}

impl EarlyPaymentOutcome {
    pub fn rounded(&self) -> Self {
        Self {
            interest_saved: round(self.interest_saved, 0),
            new_monthly_payment: round(self.new_monthly_payment, 0),
            new_balance: round(self.new_balance, 0),
            total_savings: round(self.total_savings, 0),
            ..*self
        }
    }
}

impl fmt::Display for EarlyPaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.completed {
            return write!(
                f,
                "loan retired, interest saved ${:.2}, {} months saved",
                self.interest_saved, self.time_saved_months
            );
        }
        write!(
            f,
            "new balance ${:.2} paid at ${:.2}/month over {} months, interest saved ${:.2}, {} months saved",
            self.new_balance,
            self.new_monthly_payment,
            self.new_term_months,
            self.interest_saved,
            self.time_saved_months
        )
    }
}

/// Apply a lump sum to a fixed-rate loan after `paid_months` instalments and
/// report what it saves when the instalment stays the same.
pub fn early_payment_savings(
    principal: f64,
    annual_rate: f64,
    months: u32,
    paid_months: u32,
    lump_sum: f64,
) -> LoanResult<EarlyPaymentOutcome> {
    check_loan(principal, annual_rate, months)?;
    check_positive("lump_sum", lump_sum)?;
    if paid_months >= months {
        return Err(LoanError::invalid(
            "paid_months",
            format!("must be less than the {months} month term, got {paid_months}"),
        ));
    }

    let rate = monthly_rate(annual_rate);
    let payment = annuity_payment(principal, rate, months);

    let mut balance = principal;
    for month in 1..=paid_months {
        let interest = balance * rate;
        balance -= payment - interest;
        trace!("replay month {}, balance {}", month, balance);
    }

    let remaining_months = months - paid_months;
    let interest_without = payment * remaining_months as f64 - balance;
    let new_balance = balance - lump_sum;
    debug!(
        "balance {} after {} months, {} interest still due",
        balance, paid_months, interest_without
    );

    if new_balance <= 0. {
        return Ok(EarlyPaymentOutcome {
            interest_saved: interest_without,
            time_saved_months: remaining_months,
            new_monthly_payment: 0.,
            new_balance: 0.,
            new_term_months: 0,
            total_savings: interest_without,
            completed: true,
        });
    }

    let new_months = solve_remaining_term(new_balance, payment, rate)?.min(remaining_months);
    let interest_with = interest_over_term(new_balance, payment, rate, new_months);
    let interest_saved = interest_without - interest_with;
    debug!(
        "new term {} months, interest {} instead of {}",
        new_months, interest_with, interest_without
    );

    Ok(EarlyPaymentOutcome {
        interest_saved,
        time_saved_months: remaining_months - new_months,
        new_monthly_payment: payment,
        new_balance,
        new_term_months: new_months,
        total_savings: interest_saved,
        completed: false,
    })
}

/// Months needed to retire `balance` at a fixed `payment`:
/// n = ceil(ln(payment / (payment - balance * rate)) / ln(1 + rate)).
fn solve_remaining_term(balance: f64, payment: f64, rate: f64) -> LoanResult<u32> {
    let months = if rate == 0. {
        balance / payment
    } else {
        let headroom = payment - balance * rate;
        if headroom <= 0. {
            return Err(LoanError::MathDomain(format!(
                "payment {payment} never covers the {} monthly interest on {balance}",
                balance * rate
            )));
        }
        // ln(payment / headroom) == -ln(1 - balance * rate / payment)
        -(-balance * rate / payment).ln_1p() / rate.ln_1p()
    };
    if !months.is_finite() {
        return Err(LoanError::MathDomain(format!(
            "no finite payoff term for balance {balance} at payment {payment}"
        )));
    }
    Ok((months - TERM_EPSILON).ceil().max(1.) as u32)
}

// interest actually charged while paying `balance` down; the final
// instalment only covers what is left, so this is lower than
// `payment * months - balance` by that instalment's overshoot
fn interest_over_term(balance: f64, payment: f64, rate: f64, months: u32) -> f64 {
    let mut balance = balance;
    let mut total = 0.;
    for _ in 0..months {
        if balance <= 0. {
            break;
        }
        let interest = balance * rate;
        total += interest;
        balance -= (payment - interest).min(balance);
    }
    total
}
