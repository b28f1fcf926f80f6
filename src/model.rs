//! Core domain types for the distribution pipeline.

use serde::{Deserialize, Serialize};

use crate::number::Number;

/// Chat/requester identifier on the delivery channel.
pub type RequesterId = i64;

/// Number of slots in the guard rotation list.
pub const GUARD_SLOTS: usize = 10;

/// Stock category. The two pools are replenished independently but share
/// all allocation and rendering logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Never-contacted numbers.
    Fresh,
    /// Follow-up numbers, recycled from earlier rounds.
    Reused,
}

impl Category {
    /// Short label used in filenames and report rows.
    pub fn label(self) -> &'static str {
        match self {
            Category::Fresh => "FRESH",
            Category::Reused => "FU",
        }
    }

    /// Key of the pool column in the backing store.
    pub fn pool_key(self) -> &'static str {
        match self {
            Category::Fresh => "fresh",
            Category::Reused => "reused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresh" => Some(Category::Fresh),
            "reused" | "fu" => Some(Category::Reused),
            _ => None,
        }
    }
}

/// The guard rotation list: up to [`GUARD_SLOTS`] designated numbers, one of
/// which is force-inserted at the head of every packet. Slots holding raw
/// values that fail normalization read back as empty.
#[derive(Debug, Clone, Default)]
pub struct GuardList {
    slots: [Option<Number>; GUARD_SLOTS],
}

impl GuardList {
    /// Build the list from up to ten raw store cells. Extra rows are ignored,
    /// missing rows leave trailing slots empty.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: [Option<Number>; GUARD_SLOTS] = Default::default();
        for (i, cell) in raw.into_iter().take(GUARD_SLOTS).enumerate() {
            slots[i] = Number::parse(cell.as_ref());
        }
        GuardList { slots }
    }

    pub fn slot(&self, index: usize) -> Option<&Number> {
        self.slots[index % GUARD_SLOTS].as_ref()
    }
}

/// One allocation unit: a guard number followed by `db_size - 1` pool numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Guard slot this packet consumed, for auditing.
    pub guard_slot: usize,
    /// All numbers in delivery order; the guard is always first.
    pub numbers: Vec<Number>,
}

/// A queued request for `packet_count` packets of one category.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Where status notices go (the chat the command arrived in).
    pub requester: RequesterId,
    /// Where the artifacts go. Often the same as `requester`, but an operator
    /// may request on behalf of a staff member.
    pub beneficiary: RequesterId,
    pub staff_code: String,
    pub category: Category,
    pub packet_count: usize,
}

/// Per-category labels controlling artifact naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    /// Free-text name the artifact filename is derived from.
    pub db_label: String,
    /// Prefix for each contact's display name.
    pub contact_prefix: String,
}

/// Daily aggregate ledger row, accumulated by addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: String,
    pub fresh: u32,
    pub reused: u32,
}

/// Daily per-staff ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffLedgerEntry {
    pub date: String,
    pub staff: String,
    pub fresh: u32,
    pub reused: u32,
}

impl LedgerEntry {
    pub fn add(&mut self, category: Category, packets: u32) {
        match category {
            Category::Fresh => self.fresh += packets,
            Category::Reused => self.reused += packets,
        }
    }
}

impl StaffLedgerEntry {
    pub fn add(&mut self, category: Category, packets: u32) {
        match category {
            Category::Fresh => self.fresh += packets,
            Category::Reused => self.reused += packets,
        }
    }
}

/// Last successful allocation per requester, overwritten on each new success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub requester: RequesterId,
    pub staff_code: String,
    /// Completion timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub at: String,
    pub category: Category,
    pub packet_count: usize,
    /// Filenames of the delivered artifacts.
    pub artifacts: Vec<String>,
}
