pub mod early;
pub mod error;
pub mod loan;
pub mod ratio;
pub mod schedule;
pub mod store;

pub use early::{early_payment_savings, EarlyPaymentOutcome};
pub use error::{LoanError, LoanResult};
pub use loan::{
    fixed_monthly_payment, loan_summary, reducing_payment_stats, round, years_to_months,
    InterestType, LoanInput, LoanSummary, ReducingPayments,
};
pub use ratio::{
    debt_ratio, debt_ratio_with_policy, max_borrowing_capacity,
    max_borrowing_capacity_with_policy, BorrowingCapacity, CapacityStatus, DebtRatioResult,
    DebtStatus, RiskPolicy, DEFAULT_MAX_DEBT_RATIO_PERCENT,
};
pub use schedule::{payment_schedule, DatedEntry, PaymentSchedule, ScheduleEntry};
pub use store::{recall_inputs, remember_inputs, KeyValueStore, MemoryStore};
