// src/process/freshness.rs
use tracing::info;

use crate::process::period::ReportingPeriod;

/// Compare the newest stored period against the one just extracted.
///
/// Returns true when the dataset already covers `current` (equal periods
/// count as covered, so a rerun never inserts a duplicate). An empty
/// dataset is always stale: the first run bootstraps the file.
pub fn is_up_to_date(latest: Option<ReportingPeriod>, current: ReportingPeriod) -> bool {
    let up_to_date = match latest {
        Some(old) => old.month_end() >= current.month_end(),
        None => false,
    };

    if up_to_date {
        info!("Data is up to date");
    } else {
        info!("New data is available for {}", current);
    }

    up_to_date
}
