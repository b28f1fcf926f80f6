//! Collaborator contracts for the durable backing store.
//!
//! The dispatcher is generic over [`Store`] so the real tabular backend can
//! be swapped for [`mem::MemoryStore`] in tests without touching the
//! pipeline. Pool reads return raw cells; normalization happens on every
//! read, in one place, so a messy backend never corrupts allocation.

use crate::model::{Category, LedgerEntry, NamingConfig, Receipt, StaffLedgerEntry};
use crate::number::Number;

pub mod csv;
pub mod mem;

pub use csv::CsvStore;
pub use mem::MemoryStore;

/// Durable table backend: number pools, guard rotation, naming labels and
/// the accounting ledgers.
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Raw pool cells for one category, head first. May contain garbage.
    async fn read_pool(&self, category: Category) -> Result<Vec<String>, Self::Error>;

    /// Drop the whole pool column. Compaction is clear-then-append.
    async fn clear_pool(&mut self, category: Category) -> Result<(), Self::Error>;

    /// Append numbers at the tail of a pool column.
    async fn append_pool(
        &mut self,
        category: Category,
        numbers: &[Number],
    ) -> Result<(), Self::Error>;

    /// Raw guard list cells, up to ten.
    async fn read_guards(&self) -> Result<Vec<String>, Self::Error>;

    async fn read_guard_pointer(&self) -> Result<usize, Self::Error>;

    async fn write_guard_pointer(&mut self, pointer: usize) -> Result<(), Self::Error>;

    async fn read_naming(&self, category: Category) -> Result<NamingConfig, Self::Error>;

    /// Add `packets` to the daily aggregate row for `date`.
    async fn record_ledger(
        &mut self,
        date: &str,
        category: Category,
        packets: u32,
    ) -> Result<(), Self::Error>;

    /// Add `packets` to the daily row for `(date, staff)`.
    async fn record_staff_ledger(
        &mut self,
        date: &str,
        staff: &str,
        category: Category,
        packets: u32,
    ) -> Result<(), Self::Error>;

    /// Overwrite the requester's last-request receipt.
    async fn record_receipt(&mut self, receipt: &Receipt) -> Result<(), Self::Error>;

    /// All daily aggregate rows, for reporting.
    async fn ledger_entries(&self) -> Result<Vec<LedgerEntry>, Self::Error>;

    /// All per-staff rows, for reporting.
    async fn staff_ledger_entries(&self) -> Result<Vec<StaffLedgerEntry>, Self::Error>;
}
