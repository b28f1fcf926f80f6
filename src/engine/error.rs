//! Error types for the allocation and distribution pipeline.

use thiserror::Error;

use crate::model::GUARD_SLOTS;

/// Precondition failure from [`allocate`](super::allocate).
///
/// All variants are raised before any state is touched: the pool, guard list
/// and pointer are unchanged when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("requested {requested} packets, at most {GUARD_SLOTS} per job")]
    TooManyPackets { requested: usize },

    #[error("guard slot {0} is empty or invalid")]
    GuardSlotMissing(usize),

    #[error("insufficient stock: need {required} numbers, {available} available")]
    InsufficientStock { required: usize, available: usize },
}

/// Terminal failure of one job. Exactly one of these (or success) ends every
/// dequeued job; nothing propagates past the queue worker.
#[derive(Debug, Error)]
pub enum JobError {
    /// Rejected before any mutation or delivery.
    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    /// A store read failed before allocation could run. No side effects.
    #[error("store read failed: {source}")]
    Store {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport failure while sending artifacts. `sent` of `total` artifacts
    /// were already delivered and are not retracted.
    #[error("delivery failed after {sent}/{total} artifacts: {source}")]
    Delivery {
        sent: usize,
        total: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Persistence failed after `delivered` artifacts went out: numbers were
    /// handed out but inventory or ledger bookkeeping may not reflect it.
    #[error("persistence failed with {delivered} artifacts already delivered: {source}")]
    Persist {
        delivered: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl JobError {
    /// How many artifacts reached the beneficiary before the job died.
    pub fn delivered(&self) -> usize {
        match self {
            JobError::Allocation(_) | JobError::Store { .. } => 0,
            JobError::Delivery { sent, .. } => *sent,
            JobError::Persist { delivered, .. } => *delivered,
        }
    }
}
