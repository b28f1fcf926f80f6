//! Delivery channel contract and the filesystem-backed implementation.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::model::RequesterId;
use crate::render::Artifact;

/// Outbound side of the pipeline. Artifact sends must report failure to the
/// caller; notice sends are best-effort and the dispatcher swallows their
/// failures.
pub trait DeliveryChannel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver one artifact to a destination. Delivered artifacts are never
    /// retracted, even if the job later fails.
    async fn send_artifact(
        &mut self,
        dest: RequesterId,
        artifact: &Artifact,
    ) -> Result<(), Self::Error>;

    /// Deliver a human-readable status line.
    async fn send_notice(&mut self, dest: RequesterId, text: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum FsDeliveryError {
    #[error("failed to write {file}: {source}")]
    Write {
        file: String,
        source: std::io::Error,
    },
}

/// Writes artifacts as `.vcf` files into a per-destination directory and
/// logs notices. Stands in for the chat transport in the CLI and e2e tests.
#[derive(Debug)]
pub struct FsDelivery {
    out_dir: PathBuf,
}

impl FsDelivery {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        FsDelivery {
            out_dir: out_dir.into(),
        }
    }
}

impl DeliveryChannel for FsDelivery {
    type Error = FsDeliveryError;

    async fn send_artifact(
        &mut self,
        dest: RequesterId,
        artifact: &Artifact,
    ) -> Result<(), Self::Error> {
        let dir = self.out_dir.join(dest.to_string());
        let path = dir.join(&artifact.filename);
        let write = fs::create_dir_all(&dir).and_then(|_| fs::write(&path, artifact.to_vcard()));
        write.map_err(|source| FsDeliveryError::Write {
            file: path.display().to_string(),
            source,
        })?;

        info!(dest, file = %artifact.filename, contacts = artifact.records.len(), "artifact written");
        Ok(())
    }

    async fn send_notice(&mut self, dest: RequesterId, text: &str) -> Result<(), Self::Error> {
        info!(dest, "{text}");
        Ok(())
    }
}

/// In-memory channel recording everything it is handed. Artifact sends can
/// be made to fail from a given index on, to exercise partial delivery.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    pub artifacts: Vec<(RequesterId, Artifact)>,
    pub notices: Vec<(RequesterId, String)>,
    /// Fail the artifact send once this many have gone out.
    pub fail_after: Option<usize>,
}

#[derive(Debug, Error)]
#[error("transport refused the artifact")]
pub struct TransportRefused;

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices sent to one destination, in order.
    pub fn notices_for(&self, dest: RequesterId) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|(d, _)| *d == dest)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl DeliveryChannel for MemoryDelivery {
    type Error = TransportRefused;

    async fn send_artifact(
        &mut self,
        dest: RequesterId,
        artifact: &Artifact,
    ) -> Result<(), Self::Error> {
        if let Some(limit) = self.fail_after
            && self.artifacts.len() >= limit
        {
            return Err(TransportRefused);
        }
        self.artifacts.push((dest, artifact.clone()));
        Ok(())
    }

    async fn send_notice(&mut self, dest: RequesterId, text: &str) -> Result<(), Self::Error> {
        self.notices.push((dest, text.to_string()));
        Ok(())
    }
}
