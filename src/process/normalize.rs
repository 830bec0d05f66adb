// src/process/normalize.rs
use serde::Serialize;

use crate::error::ScrapeError;
use crate::process::period::ReportingPeriod;
use crate::process::RawTable;

/// The nine sector rows of the bulletin, in the order they are printed.
/// These double as the column names of the historical dataset.
pub const SECTOR_NAMES: [&str; 9] = [
    "Nông nghiệp, lâm nghiệp và thủy sản",
    "Công nghiệp và xây dựng",
    "Công nghiệp",
    "Xây dựng",
    "Hoạt động Thương mại, Vận tải và Viễn thông",
    "Thương mại",
    "Vận tải và Viễn thông",
    "Các hoạt động dịch vụ khác",
    "Tổng cộng",
];

/// Rows above the first sector row: title, period label, unit line, column
/// headings.
const HEADER_ROWS: usize = 4;

/// Cleaned data columns: [code, field, value_bln_vnd, change].
const DATA_COLUMNS: usize = 4;
const VALUE_COLUMN: usize = 2;

/// One bulletin reduced to a single record: outstanding credit per sector,
/// billion VND, positionally aligned with [`SECTOR_NAMES`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRecord {
    pub period: ReportingPeriod,
    pub values: [f64; 9],
}

impl SectorRecord {
    pub fn sectors(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        SECTOR_NAMES.iter().copied().zip(self.values)
    }
}

/// Reduce the raw OCR grid to one [`SectorRecord`].
///
/// Stream-mode extraction pads the grid with empty cells wherever the image
/// has whitespace, so the shape checks only run after those are stripped:
/// the retained grid must be exactly 9 rows by 4 columns, one row per
/// sector. Pure function, the table is not consumed.
pub fn normalize(table: &RawTable, period: ReportingPeriod) -> Result<SectorRecord, ScrapeError> {
    // (a) drop the header rows, (b) blank cells become absent and fully
    // blank rows go away before any structural interpretation
    let data: Vec<Vec<Option<&str>>> = table
        .rows
        .iter()
        .skip(HEADER_ROWS)
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let cell = cell.trim();
                    (!cell.is_empty()).then_some(cell)
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(Option::is_some))
        .collect();

    // columns that are blank across every retained row are padding
    let width = data.iter().map(Vec::len).max().unwrap_or(0);
    let kept: Vec<usize> = (0..width)
        .filter(|&col| data.iter().any(|row| cell(row, col).is_some()))
        .collect();

    // (c) whatever survives must be the four bulletin columns
    if kept.len() != DATA_COLUMNS {
        return Err(ScrapeError::SchemaMismatch(format!(
            "expected {} data columns after cleaning, found {}",
            DATA_COLUMNS,
            kept.len()
        )));
    }

    // (e) one row per sector, validated rather than assumed: a shifted
    // layout would otherwise silently mislabel every sector
    if data.len() != SECTOR_NAMES.len() {
        return Err(ScrapeError::SchemaMismatch(format!(
            "expected {} sector rows after cleaning, found {}",
            SECTOR_NAMES.len(),
            data.len()
        )));
    }

    // (d) convert the value column; (f)/(g) the other columns are dropped
    // by never reading them, collapsing to the single output row
    let value_col = kept[VALUE_COLUMN];
    let mut values = [0.0_f64; 9];
    for (slot, row) in values.iter_mut().zip(&data) {
        let raw = cell(row, value_col).ok_or_else(|| ScrapeError::NumericParse {
            value: String::new(),
        })?;
        *slot = parse_vn_number(raw)?;
    }

    Ok(SectorRecord { period, values })
}

/// Convert a Vietnamese-locale numeral: `.` groups thousands, `,` is the
/// decimal separator. `"1.234,56"` → 1234.56.
pub fn parse_vn_number(s: &str) -> Result<f64, ScrapeError> {
    let cleaned = s.replace('.', "").replace(',', ".");
    cleaned.parse().map_err(|_| ScrapeError::NumericParse {
        value: s.to_string(),
    })
}

fn cell<'a>(row: &'a [Option<&'a str>], col: usize) -> Option<&'a str> {
    row.get(col).copied().flatten()
}
