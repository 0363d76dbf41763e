use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use loanmath::*;
use simple_logger::SimpleLogger;
use std::process;

/// Loan amortization, debt ratio and borrowing capacity figures
#[derive(Parser)]
#[command(name = "loanmath", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Class debt ratios up to 50% as warning rather than danger
    #[arg(long, global = true)]
    lenient: bool,

    /// Round currency figures to whole units
    #[arg(long, global = true)]
    whole: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment, total interest and total amount
    Summary {
        #[arg(long)]
        principal: f64,
        /// annual rate in percent
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        years: f64,
        #[arg(long, value_enum, default_value = "fixed")]
        interest: CliInterestType,
    },
    /// Month-by-month amortization table
    Schedule {
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        months: u32,
        #[arg(long, value_enum, default_value = "fixed")]
        interest: CliInterestType,
        /// due date of the first payment (YYYY-MM-DD)
        #[arg(long)]
        first_payment: Option<NaiveDate>,
    },
    /// Share of salary taken by loan payments and other commitments
    DebtRatio {
        #[arg(long)]
        salary: f64,
        #[arg(long)]
        payment: f64,
        #[arg(long, default_value_t = 0.)]
        other: f64,
    },
    /// Largest loan affordable under a debt ratio ceiling
    Capacity {
        #[arg(long)]
        salary: f64,
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        years: f64,
        #[arg(long, default_value_t = 0.)]
        other: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_DEBT_RATIO_PERCENT)]
        max_ratio: f64,
    },
    /// Savings from a lump-sum payment part way through a fixed loan
    Early {
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        months: u32,
        #[arg(long)]
        paid: u32,
        #[arg(long)]
        lump_sum: f64,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliInterestType {
    Fixed,
    Reducing,
}

impl From<CliInterestType> for InterestType {
    fn from(value: CliInterestType) -> Self {
        match value {
            CliInterestType::Fixed => InterestType::Fixed,
            CliInterestType::Reducing => InterestType::Reducing,
        }
    }
}

fn main() {
    if let Err(e) = SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("logger unavailable: {e}");
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Compute the requested figures and render them as output lines.
fn run(cli: Cli) -> LoanResult<Vec<String>> {
    let policy = if cli.lenient {
        RiskPolicy::lenient()
    } else {
        RiskPolicy::default()
    };

    let lines = match cli.command {
        Commands::Summary {
            principal,
            rate,
            years,
            interest,
        } => {
            let summary = loan_summary(principal, rate, years, interest.into())?;
            let summary = if cli.whole { summary.rounded() } else { summary };
            vec![summary.to_string()]
        }
        Commands::Schedule {
            principal,
            rate,
            months,
            interest,
            first_payment,
        } => {
            let schedule = payment_schedule(principal, rate, months, interest.into())?;
            let lines = match first_payment {
                Some(date) => schedule
                    .dated(date)?
                    .into_iter()
                    .map(|dated| {
                        if cli.whole {
                            DatedEntry {
                                entry: dated.entry.rounded(),
                                ..dated
                            }
                        } else {
                            dated
                        }
                        .to_string()
                    })
                    .collect(),
                None => schedule
                    .iter()
                    .map(|entry| {
                        let entry = if cli.whole { entry.rounded() } else { *entry };
                        entry.to_string()
                    })
                    .collect(),
            };
            info!(
                "{} payments, total interest ${:.2}",
                schedule.len(),
                schedule.total_interest()
            );
            lines
        }
        Commands::DebtRatio {
            salary,
            payment,
            other,
        } => {
            let result = debt_ratio_with_policy(salary, payment, other, &policy)?;
            vec![result.to_string()]
        }
        Commands::Capacity {
            salary,
            rate,
            years,
            other,
            max_ratio,
        } => {
            let capacity = max_borrowing_capacity_with_policy(
                salary, rate, years, other, max_ratio, &policy,
            )?;
            let capacity = if cli.whole { capacity.rounded() } else { capacity };
            vec![capacity.to_string()]
        }
        Commands::Early {
            principal,
            rate,
            months,
            paid,
            lump_sum,
        } => {
            let outcome = early_payment_savings(principal, rate, months, paid, lump_sum)?;
            let outcome = if cli.whole { outcome.rounded() } else { outcome };
            vec![outcome.to_string()]
        }
    };
    Ok(lines)
}
