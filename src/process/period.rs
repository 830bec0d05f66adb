// src/process/period.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::process::RawTable;

/// Bulletin label pattern, e.g. "Thang 5 Nam 2024". OCR drops the
/// diacritics, so the plain ASCII forms are what actually appear.
static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Thang\s+(\d+)\s+Nam\s+(\d+)").unwrap());

/// Row of the raw table that carries the period label.
const PERIOD_ROW: usize = 1;

/// The (year, month) a bulletin reports on.
///
/// Ordering is by (year, month), which matches comparing the end-of-month
/// dates the bulletin figures are stated as of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, ScrapeError> {
        if !(1..=12).contains(&month) {
            return Err(ScrapeError::Extraction(format!(
                "month {} out of range for year {}",
                month, year
            )));
        }
        Ok(Self { year, month })
    }

    /// Last calendar day of the period's month.
    pub fn month_end(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        // month is validated in [1,12], so both dates exist
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .expect("validated month")
    }
}

impl std::fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

/// Pull the reporting period out of the bulletin's metadata row.
///
/// Every non-empty cell of the row is tried against the label pattern and
/// the first match wins; OCR sometimes splits the label across cells.
pub fn extract_period(table: &RawTable) -> Result<ReportingPeriod, ScrapeError> {
    let row = table.rows.get(PERIOD_ROW).ok_or_else(|| {
        ScrapeError::Extraction(format!("table has no metadata row {}", PERIOD_ROW))
    })?;

    for cell in row.iter().filter(|c| !c.trim().is_empty()) {
        if let Some(caps) = PERIOD_RE.captures(cell) {
            let month: u32 = caps[1]
                .parse()
                .map_err(|_| ScrapeError::Extraction(format!("bad month token in {:?}", cell)))?;
            let year: i32 = caps[2]
                .parse()
                .map_err(|_| ScrapeError::Extraction(format!("bad year token in {:?}", cell)))?;
            return ReportingPeriod::new(year, month);
        }
    }

    Err(ScrapeError::Extraction(format!(
        "no cell in row {} matches the \"Thang N Nam Y\" label",
        PERIOD_ROW
    )))
}
