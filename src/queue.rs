//! Single-flight job queue.
//!
//! All allocation requests funnel through one FIFO worker: at most one job's
//! allocate/render/deliver/persist chain is in flight process-wide, which is
//! what lets the allocation engine read and write the shared pool without a
//! lower-level lock. Requests arriving mid-job queue up and observe only the
//! state left by fully-completed predecessors.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tracing::{info, warn};

use crate::delivery::DeliveryChannel;
use crate::engine::{self, Allocation, JobError};
use crate::model::{Category, GuardList, JobRequest, Receipt, RequesterId};
use crate::number::normalize_pool;
use crate::render::{Artifact, Renderer};
use crate::store::Store;

/// When the pool compaction and guard-pointer advance are committed,
/// relative to artifact delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPoint {
    /// Commit stock before sending anything. A crash mid-delivery loses
    /// stock but can never hand the same numbers out twice.
    BeforeDelivery,
    /// Deliver first, commit after. A crash mid-delivery keeps the stock
    /// but risks re-allocating numbers that already went out.
    AfterDelivery,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Numbers per packet, guard included.
    pub db_size: usize,
    /// Minimum interval between two artifact sends within one job.
    pub delivery_delay: Duration,
    pub commit_point: CommitPoint,
    /// Accounting days roll over at this UTC offset.
    pub ledger_utc_offset_hours: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            db_size: 250,
            delivery_delay: Duration::from_millis(1200),
            commit_point: CommitPoint::BeforeDelivery,
            ledger_utc_offset_hours: 7,
        }
    }
}

/// Handle for enqueueing jobs; cheap to clone. Outcomes are reported back
/// through the delivery channel, never through this handle.
#[derive(Debug, Clone)]
pub struct JobSender(tokio::sync::mpsc::Sender<JobRequest>);

impl JobSender {
    /// Fire-and-forget enqueue: waits for queue space when the channel is
    /// full, then returns. Returns `false` if the worker is gone.
    pub async fn submit(&self, job: JobRequest) -> bool {
        info!(
            requester = job.requester,
            staff = %job.staff_code,
            category = job.category.label(),
            packets = job.packet_count,
            "job enqueued"
        );
        self.0.send(job).await.is_ok()
    }
}

/// Create the FIFO feeding a [`Dispatcher::run`] worker.
pub fn job_channel(capacity: usize) -> (JobSender, ReceiverStream<JobRequest>) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    (JobSender(tx), ReceiverStream::new(rx))
}

/// What a completed job did, for the receipt and the success notice.
#[derive(Debug)]
struct JobSummary {
    artifacts: Vec<String>,
}

/// The single worker. Owns the collaborator handles; nothing else touches
/// the pool, guard list or pointer while it runs.
pub struct Dispatcher<S, C> {
    store: S,
    delivery: C,
    config: DispatchConfig,
}

impl<S: Store, C: DeliveryChannel> Dispatcher<S, C> {
    pub fn new(store: S, delivery: C, config: DispatchConfig) -> Self {
        Dispatcher {
            store,
            delivery,
            config,
        }
    }

    /// Hand the collaborators back, for inspection after a drained run.
    pub fn into_parts(self) -> (S, C) {
        (self.store, self.delivery)
    }

    /// Drain the job stream, one job at a time, until it closes. Failures
    /// end the current job and never the worker.
    pub async fn run(&mut self, mut stream: impl Stream<Item = JobRequest> + Unpin) {
        while let Some(job) = stream.next().await {
            self.process(job).await;
        }
    }

    /// Run one job to its terminal state and report the outcome.
    pub async fn process(&mut self, job: JobRequest) {
        info!(
            requester = job.requester,
            staff = %job.staff_code,
            category = job.category.label(),
            packets = job.packet_count,
            "job started"
        );
        self.notice(job.beneficiary, "Working on your request...").await;

        match self.run_job(&job).await {
            Ok(summary) => {
                info!(
                    requester = job.requester,
                    packets = job.packet_count,
                    "job completed"
                );
                let text = format!(
                    "DONE\nStaff: {}\nPackets: {}\nContacts: {} (guard numbers included)",
                    job.staff_code,
                    job.packet_count,
                    job.packet_count * self.config.db_size,
                );
                self.notice(job.beneficiary, &text).await;
                if job.requester != job.beneficiary {
                    let text = format!(
                        "Delivered {} packet(s) ({} files) to staff {}",
                        job.packet_count,
                        summary.artifacts.len(),
                        job.staff_code,
                    );
                    self.notice(job.requester, &text).await;
                }
            }
            Err(err) => {
                warn!(
                    requester = job.requester,
                    delivered = err.delivered(),
                    error = %err,
                    "job failed"
                );
                let text = failure_notice(&job, &err);
                self.notice(job.requester, &text).await;
                if job.beneficiary != job.requester {
                    self.notice(job.beneficiary, &text).await;
                }
            }
        }
    }

    async fn run_job(&mut self, job: &JobRequest) -> Result<JobSummary, JobError> {
        // Allocating
        let raw_pool = self.store.read_pool(job.category).await.map_err(store_err)?;
        let pool = normalize_pool(&raw_pool);
        let guards = GuardList::from_raw(self.store.read_guards().await.map_err(store_err)?);
        let pointer = self.store.read_guard_pointer().await.map_err(store_err)?;

        let allocation = engine::allocate(
            job.packet_count,
            pool,
            &guards,
            pointer,
            self.config.db_size,
        )?;

        let naming = self.store.read_naming(job.category).await.map_err(store_err)?;
        let mut renderer = Renderer::new(&naming, job.category.label());
        let artifacts: Vec<Artifact> = allocation
            .packets
            .iter()
            .enumerate()
            .map(|(i, packet)| renderer.render(packet, i))
            .collect();

        if self.config.commit_point == CommitPoint::BeforeDelivery {
            self.commit_stock(job.category, &allocation)
                .await
                .map_err(|source| JobError::Persist {
                    delivered: 0,
                    source,
                })?;
        }

        // Delivering
        let total = artifacts.len();
        let mut sent = 0;
        for artifact in &artifacts {
            if sent > 0 {
                tokio::time::sleep(self.config.delivery_delay).await;
            }
            self.delivery
                .send_artifact(job.beneficiary, artifact)
                .await
                .map_err(|e| JobError::Delivery {
                    sent,
                    total,
                    source: Box::new(e),
                })?;
            sent += 1;
            info!(
                dest = job.beneficiary,
                file = %artifact.filename,
                sent,
                total,
                "packet delivered"
            );
        }

        // Persisting
        if self.config.commit_point == CommitPoint::AfterDelivery {
            self.commit_stock(job.category, &allocation)
                .await
                .map_err(|source| JobError::Persist {
                    delivered: sent,
                    source,
                })?;
        }
        self.record_job(job, &artifacts)
            .await
            .map_err(|source| JobError::Persist {
                delivered: sent,
                source,
            })?;

        Ok(JobSummary {
            artifacts: artifacts.into_iter().map(|a| a.filename).collect(),
        })
    }

    /// Compact the pool (clear, then write the remainder back in original
    /// order) and advance the guard pointer in one pass.
    async fn commit_stock(
        &mut self,
        category: Category,
        allocation: &Allocation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.store.clear_pool(category).await?;
        if !allocation.remainder.is_empty() {
            self.store.append_pool(category, &allocation.remainder).await?;
        }
        self.store.write_guard_pointer(allocation.new_pointer).await?;
        Ok(())
    }

    /// Ledger rows and the requester's receipt, after delivery only.
    async fn record_job(
        &mut self,
        job: &JobRequest,
        artifacts: &[Artifact],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let date = self.date_key();
        let packets = job.packet_count as u32;

        self.store.record_ledger(&date, job.category, packets).await?;
        self.store
            .record_staff_ledger(&date, &job.staff_code, job.category, packets)
            .await?;
        self.store
            .record_receipt(&Receipt {
                requester: job.requester,
                staff_code: job.staff_code.clone(),
                at: self.timestamp(),
                category: job.category,
                packet_count: job.packet_count,
                artifacts: artifacts.iter().map(|a| a.filename.clone()).collect(),
            })
            .await?;
        Ok(())
    }

    /// Best-effort status line; a dead transport must not kill the job.
    async fn notice(&mut self, dest: RequesterId, text: &str) {
        if let Err(e) = self.delivery.send_notice(dest, text).await {
            warn!(dest, error = %e, "status notice failed");
        }
    }

    fn ledger_now(&self) -> chrono::NaiveDateTime {
        (Utc::now() + TimeDelta::hours(self.config.ledger_utc_offset_hours)).naive_utc()
    }

    fn date_key(&self) -> String {
        self.ledger_now().format("%Y-%m-%d").to_string()
    }

    fn timestamp(&self) -> String {
        self.ledger_now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> JobError {
    JobError::Store {
        source: Box::new(e),
    }
}

fn failure_notice(job: &JobRequest, err: &JobError) -> String {
    match err {
        JobError::Allocation(e) => format!("Request rejected: {e}"),
        JobError::Store { source } => {
            format!("Could not read stock data, nothing was allocated: {source}")
        }
        JobError::Delivery { sent: 0, .. } => {
            "Delivery failed, no packets were sent. Re-issue the request.".to_string()
        }
        JobError::Delivery { sent, total, .. } => format!(
            "Delivery interrupted: {sent}/{total} packets already went to staff {} and are not \
             retracted. Reconcile before re-requesting the rest.",
            job.staff_code,
        ),
        JobError::Persist { delivered: 0, source } => format!(
            "Stock commit failed before delivery; no packets were sent. \
             Check the stock tables: {source}"
        ),
        JobError::Persist { delivered, source } => format!(
            "WARNING: all {delivered} packet(s) were delivered but bookkeeping failed: {source}. \
             Stock and ledgers may not reflect this job; reconcile manually."
        ),
    }
}
