use serde::Serialize;

use super::validate::{PlannedRecord, PlannedRow, ValidationReport};
use super::ImportError;

#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub add: usize,
    pub merge: usize,
    pub skip: usize,
    /// `row,action,detail`, one line per input row in sheet order
    pub preview_csv: String,
}

/// Dry run of a commit: counts and a preview, no writes.
pub fn simulate(report: &ValidationReport) -> Result<Simulation, ImportError> {
    let mut lines: Vec<(usize, &'static str, String)> = Vec::new();
    lines.extend(report.valid.iter().map(|p| (p.row, "ADD", describe(p))));
    lines.extend(report.to_merge.iter().map(|p| (p.row, "MERGE", describe(p))));
    lines.extend(report.errors.iter().map(|i| (i.row, "SKIP", format!("error: {}", i.message))));
    lines.extend(report.link_failed.iter().map(|i| (i.row, "SKIP", format!("link failed: {}", i.message))));
    lines.sort_by_key(|(row, _, _)| *row);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["row", "action", "detail"])?;
    for (row, action, detail) in &lines {
        writer.write_record([row.to_string().as_str(), *action, detail.as_str()])?;
    }
    let bytes = writer.into_inner().map_err(|e| ImportError::Csv(csv::Error::from(e.into_error())))?;

    Ok(Simulation {
        add: report.valid.len(),
        merge: report.to_merge.len(),
        skip: report.skipped(),
        preview_csv: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

pub(crate) fn describe(planned: &PlannedRow) -> String {
    match &planned.record {
        PlannedRecord::Donor(d) => format!("new donor {} ({})", d.full_name(), d.phone.as_deref().unwrap_or("")),
        PlannedRecord::Merge { target, target_row: Some(row), patch } => {
            format!("{} merges into row {} (donor {})", patch.full_name(), row, target)
        }
        PlannedRecord::Merge { target, target_row: None, patch } => {
            format!("{} merges into existing donor {}", patch.full_name(), target)
        }
        PlannedRecord::Donation(d) => {
            format!("donation {} {} on {}", d.amount.normalize(), d.currency, d.donated_on.format("%Y-%m-%d"))
        }
        PlannedRecord::Pledge(p) => {
            format!("pledge {} {} on {}", p.total_amount.normalize(), p.currency, p.pledged_on.format("%Y-%m-%d"))
        }
    }
}
