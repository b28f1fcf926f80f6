//! Pure aggregation over ledger rows: daily totals, monthly rollups and
//! per-staff tables. Presentation (chat formatting) lives with the caller.

use std::collections::HashMap;

use crate::model::{LedgerEntry, StaffLedgerEntry};

/// Packet totals for one date (zeroes when the date has no row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyReport {
    pub fresh: u32,
    pub reused: u32,
}

/// Rollup over one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyReport {
    pub fresh: u32,
    pub reused: u32,
    /// Distinct dates that had activity.
    pub days: u32,
}

/// One staff line of a report table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffRow {
    pub staff: String,
    pub fresh: u32,
    pub reused: u32,
}

impl StaffRow {
    pub fn total(&self) -> u32 {
        self.fresh + self.reused
    }
}

/// How many whole packets a pool of `available` valid numbers still covers.
pub fn packets_possible(available: usize, db_size: usize) -> usize {
    available / (db_size - 1)
}

pub fn daily(entries: &[LedgerEntry], date: &str) -> DailyReport {
    entries
        .iter()
        .find(|e| e.date == date)
        .map(|e| DailyReport {
            fresh: e.fresh,
            reused: e.reused,
        })
        .unwrap_or_default()
}

pub fn monthly(entries: &[LedgerEntry], year: i32, month: u32) -> MonthlyReport {
    let prefix = format!("{year:04}-{month:02}-");
    let mut report = MonthlyReport::default();
    for entry in entries.iter().filter(|e| e.date.starts_with(&prefix)) {
        report.fresh += entry.fresh;
        report.reused += entry.reused;
        report.days += 1;
    }
    report
}

/// Per-staff totals for one date, busiest staff first. Blank staff codes
/// collect under `UNKNOWN`.
pub fn staff_daily(entries: &[StaffLedgerEntry], date: &str) -> Vec<StaffRow> {
    staff_table(entries.iter().filter(|e| e.date == date))
}

/// Per-staff totals over one calendar month, busiest staff first.
pub fn staff_monthly(entries: &[StaffLedgerEntry], year: i32, month: u32) -> Vec<StaffRow> {
    let prefix = format!("{year:04}-{month:02}-");
    staff_table(entries.iter().filter(move |e| e.date.starts_with(&prefix)))
}

fn staff_table<'a>(entries: impl Iterator<Item = &'a StaffLedgerEntry>) -> Vec<StaffRow> {
    let mut by_staff: HashMap<String, (u32, u32)> = HashMap::new();
    for entry in entries {
        let key = if entry.staff.trim().is_empty() {
            "UNKNOWN".to_string()
        } else {
            entry.staff.trim().to_string()
        };
        let slot = by_staff.entry(key).or_default();
        slot.0 += entry.fresh;
        slot.1 += entry.reused;
    }

    let mut rows: Vec<StaffRow> = by_staff
        .into_iter()
        .map(|(staff, (fresh, reused))| StaffRow {
            staff,
            fresh,
            reused,
        })
        .collect();
    rows.sort_by(|a, b| b.total().cmp(&a.total()).then(a.staff.cmp(&b.staff)));
    rows
}
