//! In-memory store for deterministic tests and demos.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Category, LedgerEntry, NamingConfig, Receipt, RequesterId, StaffLedgerEntry};
use crate::number::Number;

use super::Store;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Failure injected by a test via the `fail_*` switches.
    #[error("injected failure: {0}")]
    Injected(&'static str),
}

/// Everything in RAM. Write operations can be made to fail on demand so the
/// queue's partial-failure paths are testable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pools: HashMap<Category, Vec<String>>,
    guards: Vec<String>,
    pointer: usize,
    naming: HashMap<Category, NamingConfig>,
    ledger: Vec<LedgerEntry>,
    staff_ledger: Vec<StaffLedgerEntry>,
    receipts: HashMap<RequesterId, Receipt>,

    /// When set, `clear_pool` fails (kills the job at the persist step).
    pub fail_clear_pool: bool,
    /// When set, `record_ledger` fails (kills the job after stock committed).
    pub fail_ledger: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pool<S: Into<String>>(&mut self, category: Category, raw: Vec<S>) {
        self.pools
            .insert(category, raw.into_iter().map(Into::into).collect());
    }

    pub fn set_guards<S: Into<String>>(&mut self, raw: Vec<S>) {
        self.guards = raw.into_iter().map(Into::into).collect();
    }

    pub fn set_pointer(&mut self, pointer: usize) {
        self.pointer = pointer;
    }

    pub fn set_naming(&mut self, category: Category, naming: NamingConfig) {
        self.naming.insert(category, naming);
    }

    pub fn pool(&self, category: Category) -> &[String] {
        self.pools.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn staff_ledger(&self) -> &[StaffLedgerEntry] {
        &self.staff_ledger
    }

    pub fn receipt(&self, requester: RequesterId) -> Option<&Receipt> {
        self.receipts.get(&requester)
    }
}

impl Store for MemoryStore {
    type Error = MemoryError;

    async fn read_pool(&self, category: Category) -> Result<Vec<String>, Self::Error> {
        Ok(self.pool(category).to_vec())
    }

    async fn clear_pool(&mut self, category: Category) -> Result<(), Self::Error> {
        if self.fail_clear_pool {
            return Err(MemoryError::Injected("clear_pool"));
        }
        self.pools.insert(category, Vec::new());
        Ok(())
    }

    async fn append_pool(
        &mut self,
        category: Category,
        numbers: &[Number],
    ) -> Result<(), Self::Error> {
        let pool = self.pools.entry(category).or_default();
        pool.extend(numbers.iter().map(|n| n.as_str().to_string()));
        Ok(())
    }

    async fn read_guards(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.guards.clone())
    }

    async fn read_guard_pointer(&self) -> Result<usize, Self::Error> {
        Ok(self.pointer)
    }

    async fn write_guard_pointer(&mut self, pointer: usize) -> Result<(), Self::Error> {
        self.pointer = pointer;
        Ok(())
    }

    async fn read_naming(&self, category: Category) -> Result<NamingConfig, Self::Error> {
        Ok(self.naming.get(&category).cloned().unwrap_or(NamingConfig {
            db_label: category.label().to_string(),
            contact_prefix: category.label().to_string(),
        }))
    }

    async fn record_ledger(
        &mut self,
        date: &str,
        category: Category,
        packets: u32,
    ) -> Result<(), Self::Error> {
        if self.fail_ledger {
            return Err(MemoryError::Injected("record_ledger"));
        }
        match self.ledger.iter_mut().find(|e| e.date == date) {
            Some(entry) => entry.add(category, packets),
            None => {
                let mut entry = LedgerEntry {
                    date: date.to_string(),
                    fresh: 0,
                    reused: 0,
                };
                entry.add(category, packets);
                self.ledger.push(entry);
            }
        }
        Ok(())
    }

    async fn record_staff_ledger(
        &mut self,
        date: &str,
        staff: &str,
        category: Category,
        packets: u32,
    ) -> Result<(), Self::Error> {
        match self
            .staff_ledger
            .iter_mut()
            .find(|e| e.date == date && e.staff == staff)
        {
            Some(entry) => entry.add(category, packets),
            None => {
                let mut entry = StaffLedgerEntry {
                    date: date.to_string(),
                    staff: staff.to_string(),
                    fresh: 0,
                    reused: 0,
                };
                entry.add(category, packets);
                self.staff_ledger.push(entry);
            }
        }
        Ok(())
    }

    async fn record_receipt(&mut self, receipt: &Receipt) -> Result<(), Self::Error> {
        self.receipts.insert(receipt.requester, receipt.clone());
        Ok(())
    }

    async fn ledger_entries(&self) -> Result<Vec<LedgerEntry>, Self::Error> {
        Ok(self.ledger.clone())
    }

    async fn staff_ledger_entries(&self) -> Result<Vec<StaffLedgerEntry>, Self::Error> {
        Ok(self.staff_ledger.clone())
    }
}
