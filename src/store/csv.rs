//! CSV-file-backed store: one directory, one file per table, the local
//! equivalent of the spreadsheet tabs the live system uses.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::model::{
    Category, JobRequest, LedgerEntry, NamingConfig, Receipt, RequesterId, StaffLedgerEntry,
};
use crate::number::Number;

use super::Store;

const POINTER_FILE: &str = "pointer.txt";
const GUARDS_FILE: &str = "guards.csv";
const NAMING_FILE: &str = "naming.csv";
const REPORT_FILE: &str = "report.csv";
const STAFF_REPORT_FILE: &str = "staff_report.csv";
const LAST_REQUEST_FILE: &str = "last_request.csv";

#[derive(Debug, Error)]
pub enum CsvStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("guard pointer file holds '{0}', expected an integer")]
    BadPointer(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct NamingRow {
    category: Category,
    db_label: String,
    contact_prefix: String,
}

/// Receipt row flattened for csv: artifact filenames joined with `;`.
#[derive(Debug, Serialize, Deserialize)]
struct ReceiptRow {
    requester: RequesterId,
    staff_code: String,
    at: String,
    category: Category,
    packet_count: usize,
    artifacts: String,
}

impl From<&Receipt> for ReceiptRow {
    fn from(r: &Receipt) -> Self {
        ReceiptRow {
            requester: r.requester,
            staff_code: r.staff_code.clone(),
            at: r.at.clone(),
            category: r.category,
            packet_count: r.packet_count,
            artifacts: r.artifacts.join(";"),
        }
    }
}

/// Store backed by a directory of csv files. Missing files read as empty
/// tables so a fresh data directory needs no scaffolding beyond the pools
/// and guard list.
#[derive(Debug)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CsvStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(CsvStore { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn pool_path(&self, category: Category) -> PathBuf {
        self.path(&format!("pool_{}.csv", category.pool_key()))
    }

    /// Read a headerless single-column file; absent file = empty column.
    fn read_column(path: &Path) -> Result<Vec<String>, CsvStoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut out = Vec::new();
        for record in reader.records() {
            let record = record?;
            out.push(record.get(0).unwrap_or("").to_string());
        }
        Ok(out)
    }

    fn write_column(path: &Path, values: &[String]) -> Result<(), CsvStoreError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        for value in values {
            writer.write_record([value.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CsvStoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut out = Vec::new();
        for row in reader.deserialize() {
            out.push(row?);
        }
        Ok(out)
    }

    fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), CsvStoreError> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Store for CsvStore {
    type Error = CsvStoreError;

    async fn read_pool(&self, category: Category) -> Result<Vec<String>, Self::Error> {
        Self::read_column(&self.pool_path(category))
    }

    async fn clear_pool(&mut self, category: Category) -> Result<(), Self::Error> {
        Self::write_column(&self.pool_path(category), &[])
    }

    async fn append_pool(
        &mut self,
        category: Category,
        numbers: &[Number],
    ) -> Result<(), Self::Error> {
        let path = self.pool_path(category);
        let mut column = Self::read_column(&path)?;
        column.extend(numbers.iter().map(|n| n.as_str().to_string()));
        Self::write_column(&path, &column)
    }

    async fn read_guards(&self) -> Result<Vec<String>, Self::Error> {
        Self::read_column(&self.path(GUARDS_FILE))
    }

    async fn read_guard_pointer(&self) -> Result<usize, Self::Error> {
        let path = self.path(POINTER_FILE);
        if !path.exists() {
            return Ok(0);
        }
        let raw = fs::read_to_string(path)?;
        let trimmed = raw.trim();
        trimmed
            .parse()
            .map_err(|_| CsvStoreError::BadPointer(trimmed.to_string()))
    }

    async fn write_guard_pointer(&mut self, pointer: usize) -> Result<(), Self::Error> {
        fs::write(self.path(POINTER_FILE), pointer.to_string())?;
        Ok(())
    }

    async fn read_naming(&self, category: Category) -> Result<NamingConfig, Self::Error> {
        let rows: Vec<NamingRow> = Self::read_rows(&self.path(NAMING_FILE))?;
        Ok(rows
            .into_iter()
            .find(|row| row.category == category)
            .map(|row| NamingConfig {
                db_label: row.db_label,
                contact_prefix: row.contact_prefix,
            })
            .unwrap_or(NamingConfig {
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
        let path = self.path(REPORT_FILE);
        let mut rows: Vec<LedgerEntry> = Self::read_rows(&path)?;
        match rows.iter_mut().find(|row| row.date == date) {
            Some(row) => row.add(category, packets),
            None => {
                let mut row = LedgerEntry {
                    date: date.to_string(),
                    fresh: 0,
                    reused: 0,
                };
                row.add(category, packets);
                rows.push(row);
            }
        }
        Self::write_rows(&path, &rows)
    }

    async fn record_staff_ledger(
        &mut self,
        date: &str,
        staff: &str,
        category: Category,
        packets: u32,
    ) -> Result<(), Self::Error> {
        let path = self.path(STAFF_REPORT_FILE);
        let mut rows: Vec<StaffLedgerEntry> = Self::read_rows(&path)?;
        match rows
            .iter_mut()
            .find(|row| row.date == date && row.staff == staff)
        {
            Some(row) => row.add(category, packets),
            None => {
                let mut row = StaffLedgerEntry {
                    date: date.to_string(),
                    staff: staff.to_string(),
                    fresh: 0,
                    reused: 0,
                };
                row.add(category, packets);
                rows.push(row);
            }
        }
        Self::write_rows(&path, &rows)
    }

    async fn record_receipt(&mut self, receipt: &Receipt) -> Result<(), Self::Error> {
        let path = self.path(LAST_REQUEST_FILE);
        let mut rows: Vec<ReceiptRow> = Self::read_rows(&path)?;
        rows.retain(|row| row.requester != receipt.requester);
        rows.push(ReceiptRow::from(receipt));
        Self::write_rows(&path, &rows)
    }

    async fn ledger_entries(&self) -> Result<Vec<LedgerEntry>, Self::Error> {
        Self::read_rows(&self.path(REPORT_FILE))
    }

    async fn staff_ledger_entries(&self) -> Result<Vec<StaffLedgerEntry>, Self::Error> {
        Self::read_rows(&self.path(STAFF_REPORT_FILE))
    }
}

/// Errors that can occur when parsing request csv rows.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unknown category '{value}'")]
    UnknownCategory { line: usize, value: String },

    #[error("line {line}: packet count must be a positive integer, got '{value}'")]
    BadCount { line: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct RequestRow {
    requester: RequesterId,
    beneficiary: RequesterId,
    staff: String,
    category: String,
    packets: String,
}

/// Read job requests from a csv file
/// (`requester,beneficiary,staff,category,packets`).
pub fn read_requests(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<JobRequest, RequestError>>, CsvStoreError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    Ok(reader
        .into_deserialize::<RequestRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| RequestError::Parse { line, source })?;

            let category =
                Category::parse(&row.category).ok_or_else(|| RequestError::UnknownCategory {
                    line,
                    value: row.category.clone(),
                })?;

            let packet_count = match row.packets.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(RequestError::BadCount {
                        line,
                        value: row.packets.clone(),
                    });
                }
            };

            Ok(JobRequest {
                requester: row.requester,
                beneficiary: row.beneficiary,
                staff_code: row.staff,
                category,
                packet_count,
            })
        }))
}
