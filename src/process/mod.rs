// src/process/mod.rs
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::error::ScrapeError;

pub mod freshness;
pub mod normalize;
pub mod period;

/// The unprocessed grid of text cells extracted from the bulletin PDF.
/// Header and metadata rows come first (the period label sits in row 1),
/// then one row per economic sector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// Extract the first table of the OCR'd bulletin PDF as a [`RawTable`].
///
/// Table detection itself is delegated to the camelot CLI in stream layout
/// mode; its CSV export is read back in here. The grid is returned
/// verbatim, cleaning is the normalizer's job.
pub fn read_bulletin_table(pdf_path: &Path) -> Result<RawTable, ScrapeError> {
    let out_csv = pdf_path.with_extension("csv");
    info!(pdf = %pdf_path.display(), "extracting table via camelot (stream)");

    let status = Command::new("camelot")
        .arg("--pages")
        .arg("1")
        .arg("--format")
        .arg("csv")
        .arg("--output")
        .arg(&out_csv)
        .arg("stream")
        .arg(pdf_path)
        .status()
        .map_err(|e| ScrapeError::Extraction(format!("failed to launch camelot: {}", e)))?;
    if !status.success() {
        return Err(ScrapeError::Extraction(format!(
            "camelot exited with {}",
            status
        )));
    }

    let exported = first_export(&out_csv)?;
    read_grid(&exported)
}

/// camelot exports one file per detected table, suffixing the requested
/// output name. Prefer the page-1 table, fall back to the plain name.
fn first_export(out_csv: &Path) -> Result<PathBuf, ScrapeError> {
    let stem = out_csv
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let per_table = out_csv.with_file_name(format!("{}-page-1-table-1.csv", stem));

    for candidate in [per_table, out_csv.to_path_buf()] {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(ScrapeError::Extraction(format!(
        "camelot produced no table export next to {}",
        out_csv.display()
    )))
}

fn read_grid(path: &Path) -> Result<RawTable, ScrapeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScrapeError::Extraction(format!("table export unreadable: {}", e)))?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record
            .map_err(|e| ScrapeError::Extraction(format!("table export unreadable: {}", e)))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    info!(rows = rows.len(), "raw table extracted");
    Ok(RawTable { rows })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::history::{Dataset, DatasetRow, HistoryStore};
    use std::fs;

    /// A bulletin grid the way camelot's stream mode reports it: four
    /// header/metadata rows, then the nine sector rows.
    pub(crate) fn bulletin_fixture() -> RawTable {
        let rows = vec![
            vec!["NGAN HANG NHA NUOC VIET NAM", "", "", ""],
            vec!["", "Du no tin dung Thang 5 Nam 2024", "", ""],
            vec!["", "Don vi: ty dong", "", ""],
            vec!["STT", "Nganh kinh te", "Du no", "Tang truong (%)"],
            vec!["1", "Nong nghiep, lam nghiep va thuy san", "986.241,53", "0,57"],
            vec!["2", "Cong nghiep va xay dung", "2.504.218,50", "1,76"],
            vec!["2.1", "Cong nghiep", "1.926.518,77", "1,89"],
            vec!["2.2", "Xay dung", "577.699,73", "1,32"],
            vec![
                "3",
                "Hoat dong Thuong mai, Van tai va Vien thong",
                "3.607.810,45",
                "2,10",
            ],
            vec!["3.1", "Thuong mai", "3.283.085,09", "2,15"],
            vec!["3.2", "Van tai va Vien thong", "324.725,36", "1,57"],
            vec!["4", "Cac hoat dong dich vu khac", "6.581.830,74", "2,53"],
            vec!["5", "Tong cong", "13.680.101,22", "2,19"],
        ]
        .into_iter()
        .map(|r: Vec<&str>| r.into_iter().map(String::from).collect())
        .collect();
        RawTable { rows }
    }

    #[test]
    fn stale_bulletin_appends_exactly_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("du_no.csv"));

        let mut seed = Dataset::default();
        seed.push(DatasetRow {
            year: 2024,
            month: 4,
            sectors: [1.0; 9],
        });
        store.save(&seed).unwrap();

        let mut dataset = store.load().unwrap();
        let table = bulletin_fixture();
        let current = period::extract_period(&table).unwrap();
        assert_eq!((current.year, current.month), (2024, 5));
        assert!(!freshness::is_up_to_date(dataset.latest_period(), current));

        let record = normalize::normalize(&table, current).unwrap();
        dataset.push(record.into());
        store.save(&dataset).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.rows()[0].sectors, [1.0; 9]);
        let last = reloaded.rows().last().unwrap();
        assert_eq!((last.year, last.month), (2024, 5));
        assert_eq!(last.sectors[0], 986_241.53);
        assert_eq!(last.sectors[8], 13_680_101.22);
    }

    #[test]
    fn failed_extraction_leaves_the_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("du_no.csv");
        let store = HistoryStore::new(&path);

        let mut seed = Dataset::default();
        seed.push(DatasetRow {
            year: 2024,
            month: 4,
            sectors: [2.0; 9],
        });
        store.save(&seed).unwrap();
        let before = fs::read(&path).unwrap();

        let mut table = bulletin_fixture();
        table.rows[1] = vec!["".into(), "Du no tin dung (khong ro ky)".into()];
        assert!(matches!(
            period::extract_period(&table),
            Err(ScrapeError::Extraction(_))
        ));

        let after = fs::read(&path).unwrap();
        assert_eq!(before, after);
    }
}
