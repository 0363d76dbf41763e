//! Last-used inputs, kept through whatever key-value storage the caller
//! supplies (browser storage, a config file, memory).

use log::debug;
use std::collections::HashMap;

use crate::error::{LoanError, LoanResult};
use crate::loan::{InterestType, LoanInput};

pub const PRINCIPAL_KEY: &str = "loan.principal";
pub const RATE_KEY: &str = "loan.annual_rate";
pub const TERM_KEY: &str = "loan.term_months";
pub const INTEREST_TYPE_KEY: &str = "loan.interest_type";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

pub fn remember_inputs<S: KeyValueStore + ?Sized>(store: &mut S, input: &LoanInput) {
    store.set(PRINCIPAL_KEY, input.principal.to_string());
    store.set(RATE_KEY, input.annual_rate.to_string());
    store.set(TERM_KEY, input.term_months.to_string());
    store.set(INTEREST_TYPE_KEY, input.interest_type.to_string());
    debug!("remembered {}", input);
}

/// `Ok(None)` when nothing has been stored yet.
pub fn recall_inputs<S: KeyValueStore + ?Sized>(store: &S) -> LoanResult<Option<LoanInput>> {
    let Some(principal) = store.get(PRINCIPAL_KEY) else {
        return Ok(None);
    };
    let principal: f64 = parse(PRINCIPAL_KEY, &principal)?;
    let annual_rate: f64 = parse(RATE_KEY, &required(store, RATE_KEY)?)?;
    let term_months: u32 = parse(TERM_KEY, &required(store, TERM_KEY)?)?;
    let interest_type = match store.get(INTEREST_TYPE_KEY) {
        Some(raw) => parse::<InterestType>(INTEREST_TYPE_KEY, &raw)?,
        None => InterestType::default(),
    };

    LoanInput::new(principal, annual_rate, term_months, interest_type)
        .map(Some)
        .map_err(|e| LoanError::Store {
            key: PRINCIPAL_KEY.to_string(),
            reason: e.to_string(),
        })
}

fn required<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> LoanResult<String> {
    store.get(key).ok_or_else(|| LoanError::Store {
        key: key.to_string(),
        reason: "missing".to_string(),
    })
}

fn parse<T>(key: &str, raw: &str) -> LoanResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| LoanError::Store {
        key: key.to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(recall_inputs(&store).unwrap(), None);

        let input = LoanInput::new(150000., 4.75, 240, InterestType::Reducing).unwrap();
        remember_inputs(&mut store, &input);
        assert_eq!(recall_inputs(&store).unwrap(), Some(input));
        assert_eq!(store.get(INTEREST_TYPE_KEY).as_deref(), Some("reducing"));
    }

    #[test]
    fn test_missing_interest_type_defaults_to_fixed() {
        let mut store = MemoryStore::new();
        store.set(PRINCIPAL_KEY, "1000".to_string());
        store.set(RATE_KEY, "3".to_string());
        store.set(TERM_KEY, "12".to_string());
        let input = recall_inputs(&store).unwrap().unwrap();
        assert_eq!(input.interest_type, InterestType::Fixed);
    }

    #[test]
    fn test_unusable_values() {
        let mut store = MemoryStore::new();
        store.set(PRINCIPAL_KEY, "lots".to_string());
        assert!(matches!(
            recall_inputs(&store),
            Err(LoanError::Store { ref key, .. }) if key == PRINCIPAL_KEY
        ));

        store.set(PRINCIPAL_KEY, "1000".to_string());
        assert!(matches!(
            recall_inputs(&store),
            Err(LoanError::Store { ref key, .. }) if key == RATE_KEY
        ));

        store.set(RATE_KEY, "3".to_string());
        store.set(TERM_KEY, "0".to_string());
        assert!(matches!(recall_inputs(&store), Err(LoanError::Store { .. })));
    }
}
