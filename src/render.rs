//! Packet rendering: turns allocated packets into deliverable contact-card
//! artifacts with deterministic, job-scoped naming.

use crate::model::{NamingConfig, Packet};
use crate::number::Number;

const MAX_FILENAME_STEM: usize = 40;

/// One contact entry of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub display_name: String,
    pub number: Number,
}

/// A self-contained deliverable file: one record per number, packet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub records: Vec<ContactRecord>,
}

impl Artifact {
    /// Serialize as VCARD 3.0 text, one card per record.
    pub fn to_vcard(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str("BEGIN:VCARD\n");
            out.push_str("VERSION:3.0\n");
            out.push_str(&format!("FN:{}\n", record.display_name));
            out.push_str(&format!("TEL;TYPE=CELL:{}\n", record.number));
            out.push_str("END:VCARD\n");
        }
        out
    }
}

/// Renders the packets of one job.
///
/// The contact counter starts at 1 per job and runs across packets: the guard
/// of packet 2 in a 2-packet job of 250 is contact 251, not 1. Filenames are
/// indexed per packet within the job, starting at 1.
pub struct Renderer {
    stem: String,
    prefix: String,
    counter: u32,
}

impl Renderer {
    /// `fallback_label` replaces an empty configured name in the filename.
    pub fn new(naming: &NamingConfig, fallback_label: &str) -> Self {
        let mut stem = sanitize_filename(&naming.db_label);
        if stem.is_empty() {
            stem = sanitize_filename(fallback_label);
        }
        Renderer {
            stem,
            prefix: naming.contact_prefix.clone(),
            counter: 0,
        }
    }

    /// Render the next packet of the job. Pure; no I/O.
    pub fn render(&mut self, packet: &Packet, packet_index: usize) -> Artifact {
        let records = packet
            .numbers
            .iter()
            .map(|number| {
                self.counter += 1;
                ContactRecord {
                    display_name: format!("{}-{:03}", self.prefix, self.counter),
                    number: number.clone(),
                }
            })
            .collect();

        Artifact {
            filename: format!("{}_{}.vcf", self.stem, packet_index + 1),
            records,
        }
    }
}

/// Reduce a free-text label to a safe filename stem: word characters and
/// hyphens survive, everything else becomes an underscore; runs collapse,
/// edges are trimmed, length is capped.
fn sanitize_filename(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_underscore = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    trimmed.chars().take(MAX_FILENAME_STEM).collect()
}
