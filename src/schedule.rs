use chrono::{Months, NaiveDate};
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, slice};

use crate::error::{LoanError, LoanResult};
use crate::loan::{annuity_payment, monthly_rate, round, InterestType, LoanInput};

/// Balances below this are floating-point residue, reported as zero.
const BALANCE_EPSILON: f64 = 0.005;
/// Residue grows with the principal; this share of it also counts as zero.
const RESIDUE_FRACTION: f64 = 1e-9;

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleEntry {
    /// 1-indexed position in the schedule
    pub month: u32,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub total_payment: f64,
    pub remaining_balance: f64,
}

impl ScheduleEntry {
    pub fn rounded(&self) -> Self {
        Self {
            month: self.month,
            principal_portion: round(self.principal_portion, 0),
            interest_portion: round(self.interest_portion, 0),
            total_payment: round(self.total_payment, 0),
            remaining_balance: round(self.remaining_balance, 0),
        }
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "month {}, payment ${:.2}, principal ${:.2}, interest ${:.2}, remaining balance ${:.2}",
            self.month,
            self.total_payment,
            self.principal_portion,
            self.interest_portion,
            self.remaining_balance
        )
    }
}

/// A schedule entry with its calendar due date.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatedEntry {
    pub due_date: NaiveDate,
    pub entry: ScheduleEntry,
}

impl fmt::Display for DatedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.due_date, self.entry)
    }
}

/// Month-by-month amortization of a loan. Regenerated on demand; never
/// updated in place.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PaymentSchedule {
    interest_type: InterestType,
    entries: Vec<ScheduleEntry>,
}

impl PaymentSchedule {
    pub fn interest_type(&self) -> InterestType {
        self.interest_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a 1-indexed month.
    pub fn get(&self, month: u32) -> Option<&ScheduleEntry> {
        let idx = (month as usize).checked_sub(1)?;
        self.entries.get(idx)
    }

    pub fn last(&self) -> Option<&ScheduleEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn iter(&self) -> slice::Iter<'_, ScheduleEntry> {
        self.entries.iter()
    }

    pub fn total_interest(&self) -> f64 {
        self.iter().map(|e| e.interest_portion).sum()
    }

    pub fn total_principal(&self) -> f64 {
        self.iter().map(|e| e.principal_portion).sum()
    }

    pub fn total_paid(&self) -> f64 {
        self.iter().map(|e| e.total_payment).sum()
    }

    /// Pair each entry with its due date. Month `i` falls due `i - 1` months
    /// after `first_payment_date`, clamped to the end of shorter months.
    pub fn dated(&self, first_payment_date: NaiveDate) -> LoanResult<Vec<DatedEntry>> {
        self.iter()
            .map(|entry| {
                let due_date = first_payment_date
                    .checked_add_months(Months::new(entry.month - 1))
                    .ok_or_else(|| {
                        LoanError::InvalidDate(format!(
                            "{} does not have a payment date {} months later",
                            first_payment_date,
                            entry.month - 1
                        ))
                    })?;
                Ok(DatedEntry {
                    due_date,
                    entry: *entry,
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a PaymentSchedule {
    type Item = &'a ScheduleEntry;
    type IntoIter = slice::Iter<'a, ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PaymentSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl LoanInput {
    pub fn schedule(&self) -> PaymentSchedule {
        build_schedule(self)
    }
}

pub fn payment_schedule(
    principal: f64,
    annual_rate: f64,
    months: u32,
    interest_type: InterestType,
) -> LoanResult<PaymentSchedule> {
    Ok(LoanInput::new(principal, annual_rate, months, interest_type)?.schedule())
}

fn build_schedule(input: &LoanInput) -> PaymentSchedule {
    let principal = input.principal;
    let months = input.term_months;
    let rate = monthly_rate(input.annual_rate);
    let fixed_payment = annuity_payment(principal, rate, months);
    let installment = principal / months as f64;

    let mut entries = Vec::with_capacity(months as usize);
    let mut balance = principal; // carried unrounded from month to month
    let residue = (principal * RESIDUE_FRACTION).max(BALANCE_EPSILON);

    for month in 1..=months {
        let interest = balance * rate;
        let (principal_portion, total_payment) = match input.interest_type {
            // last instalment clears exactly what is left
            InterestType::Fixed if month == months => (balance, balance + interest),
            InterestType::Fixed => (fixed_payment - interest, fixed_payment),
            InterestType::Reducing => (installment, installment + interest),
        };
        balance -= principal_portion;
        trace!(
            "month {}, interest {}, principal {}, balance {}",
            month,
            interest,
            principal_portion,
            balance
        );

        entries.push(ScheduleEntry {
            month,
            principal_portion,
            interest_portion: interest,
            total_payment,
            remaining_balance: if balance < residue { 0. } else { balance },
        });
    }

    debug!("generated {} entries for {}", entries.len(), input);
    PaymentSchedule {
        interest_type: input.interest_type,
        entries,
    }
}
