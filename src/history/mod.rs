// src/history/mod.rs
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::process::normalize::{SectorRecord, SECTOR_NAMES};
use crate::process::period::ReportingPeriod;

/// Dataset column holding the reporting year.
pub const YEAR_COLUMN: &str = "Năm";
/// Dataset column holding the reporting month.
pub const MONTH_COLUMN: &str = "Tháng";

/// One persisted row of the historical dataset: a reporting period plus the
/// nine sector values, aligned with [`SECTOR_NAMES`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow {
    pub year: i32,
    pub month: u32,
    pub sectors: [f64; 9],
}

impl From<SectorRecord> for DatasetRow {
    fn from(record: SectorRecord) -> Self {
        Self {
            year: record.period.year,
            month: record.period.month,
            sectors: record.values,
        }
    }
}

/// The full historical dataset, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Newest period on record. Rows are validated on load, so every row
    /// maps to a period.
    pub fn latest_period(&self) -> Option<ReportingPeriod> {
        self.rows
            .iter()
            .filter_map(|r| ReportingPeriod::new(r.year, r.month).ok())
            .max()
    }

    /// Append-only merge: the new row always lands last, prior rows are
    /// never reordered or rewritten in memory.
    pub fn push(&mut self, row: DatasetRow) {
        self.rows.push(row);
    }
}

/// CSV-backed store for the historical dataset. This job is its only
/// writer; the file is read fully at startup and rewritten in full on
/// update.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole dataset. Columns are resolved by header name, so
    /// legacy files with a different column order load fine. A missing
    /// file is an empty dataset: the first run bootstraps the store.
    pub fn load(&self) -> Result<Dataset, ScrapeError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "no historical dataset yet, starting empty");
            return Ok(Dataset::default());
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let headers = rdr.headers()?.clone();
        let year_col = find_column(&headers, YEAR_COLUMN)?;
        let month_col = find_column(&headers, MONTH_COLUMN)?;
        let sector_cols = SECTOR_NAMES
            .iter()
            .map(|name| find_column(&headers, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record?;
            let year: i32 = parse_field(&record, year_col, idx)?;
            let month: u32 = parse_field(&record, month_col, idx)?;
            ReportingPeriod::new(year, month).map_err(|_| {
                ScrapeError::SchemaMismatch(format!(
                    "dataset row {}: month {} out of range",
                    idx + 1,
                    month
                ))
            })?;

            let mut sectors = [0.0_f64; 9];
            for (slot, &col) in sectors.iter_mut().zip(&sector_cols) {
                *slot = parse_field(&record, col, idx)?;
            }
            rows.push(DatasetRow {
                year,
                month,
                sectors,
            });
        }

        info!(path = %self.path.display(), rows = rows.len(), "historical dataset loaded");
        Ok(Dataset { rows })
    }

    /// Rewrite the store with the given dataset, canonical column order.
    /// The bytes go to a temp file in the same directory first and replace
    /// the store by rename, so a failed write cannot corrupt it.
    pub fn save(&self, dataset: &Dataset) -> Result<(), ScrapeError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| self.persist_err(e))?;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        let mut header = vec![YEAR_COLUMN, MONTH_COLUMN];
        header.extend(SECTOR_NAMES);
        wtr.write_record(&header).map_err(|e| self.csv_err(e))?;
        for row in &dataset.rows {
            let mut fields = vec![row.year.to_string(), row.month.to_string()];
            fields.extend(row.sectors.iter().map(|v| v.to_string()));
            wtr.write_record(&fields).map_err(|e| self.csv_err(e))?;
        }
        let buf = wtr
            .into_inner()
            .map_err(|e| self.persist_err(e.into_error()))?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| self.persist_err(e))?;
        tmp.write_all(&buf).map_err(|e| self.persist_err(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.persist_err(e.error))?;

        info!(path = %self.path.display(), rows = dataset.len(), "dataset persisted");
        Ok(())
    }

    fn persist_err(&self, source: io::Error) -> ScrapeError {
        ScrapeError::Persist {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, source: csv::Error) -> ScrapeError {
        self.persist_err(io::Error::new(io::ErrorKind::Other, source))
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize, ScrapeError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ScrapeError::SchemaMismatch(format!("dataset missing column {:?}", name)))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    col: usize,
    row: usize,
) -> Result<T, ScrapeError> {
    let raw = record.get(col).unwrap_or("").trim();
    raw.parse().map_err(|_| {
        ScrapeError::SchemaMismatch(format!("dataset row {}: cannot parse {:?}", row + 1, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(year: i32, month: u32, fill: f64) -> DatasetRow {
        DatasetRow {
            year,
            month,
            sectors: [fill; 9],
        }
    }

    #[test]
    fn round_trips_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("du_no.csv"));

        let mut ds = Dataset::default();
        ds.push(row(2024, 3, 10.5));
        ds.push(row(2024, 4, 11.25));
        store.save(&ds).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, ds);
    }

    #[test]
    fn merge_appends_without_touching_prior_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("du_no.csv"));

        let mut ds = Dataset::default();
        for m in 1..=4 {
            ds.push(row(2024, m, m as f64));
        }
        store.save(&ds).unwrap();

        let mut loaded = store.load().unwrap();
        let before = loaded.rows().to_vec();
        loaded.push(row(2024, 5, 99.0));
        store.save(&loaded).unwrap();

        let merged = store.load().unwrap();
        assert_eq!(merged.len(), before.len() + 1);
        assert_eq!(&merged.rows()[..before.len()], &before[..]);
        assert_eq!(merged.rows().last().unwrap(), &row(2024, 5, 99.0));
    }

    #[test]
    fn latest_period_is_the_max_regardless_of_file_order() {
        let mut ds = Dataset::default();
        ds.push(row(2024, 2, 0.0));
        ds.push(row(2023, 12, 0.0));
        ds.push(row(2024, 1, 0.0));
        assert_eq!(
            ds.latest_period(),
            Some(ReportingPeriod::new(2024, 2).unwrap())
        );
        assert_eq!(Dataset::default().latest_period(), None);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nope.csv"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn legacy_column_order_is_resolved_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");

        // sector columns first, period columns last, quoted headers
        let mut header: Vec<String> = SECTOR_NAMES.iter().map(|s| s.to_string()).collect();
        header.push(YEAR_COLUMN.into());
        header.push(MONTH_COLUMN.into());
        let mut wtr = csv::Writer::from_path(&path).unwrap();
        wtr.write_record(&header).unwrap();
        let mut fields: Vec<String> = (1..=9).map(|v| format!("{}.5", v)).collect();
        fields.push("2024".into());
        fields.push("4".into());
        wtr.write_record(&fields).unwrap();
        wtr.flush().unwrap();

        let loaded = HistoryStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 1);
        let r = &loaded.rows()[0];
        assert_eq!((r.year, r.month), (2024, 4));
        assert_eq!(r.sectors[0], 1.5);
        assert_eq!(r.sectors[8], 9.5);
    }

    #[test]
    fn missing_sector_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "Năm,Tháng\n2024,4\n").unwrap();
        assert!(matches!(
            HistoryStore::new(&path).load(),
            Err(ScrapeError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn out_of_range_month_in_store_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        let store = HistoryStore::new(&path);
        let mut ds = Dataset::default();
        ds.push(row(2024, 4, 1.0));
        store.save(&ds).unwrap();
        let text = fs::read_to_string(&path).unwrap().replace(",4,", ",13,");
        fs::write(&path, text).unwrap();
        assert!(matches!(
            store.load(),
            Err(ScrapeError::SchemaMismatch(_))
        ));
    }
}
