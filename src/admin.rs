use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};

use crate::directory::EmployeeDirectory;
use crate::error::Result;
use crate::logbook::AttendanceLogbook;
use crate::models::{local_today, AttendanceLog};
use crate::service::AttendanceService;
use serde::{Deserialize, Serialize};

/// Which slice of the log cache a review or export covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReportScope {
    Today,
    All,
}

const CSV_HEADERS: [&str; 8] = [
    "LogID",
    "EmployeeID",
    "EmployeeName",
    "Date",
    "PunchInTime",
    "PunchInImageURL",
    "PunchOutTime",
    "PunchOutImageURL",
];

/// Read-only admin surface over both caches: date-scope filtering, CSV
/// export, and a combined refresh.
pub struct AdminPanel<S> {
    directory: EmployeeDirectory<S>,
    logbook: AttendanceLogbook<S>,
}

impl<S> Clone for AdminPanel<S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            logbook: self.logbook.clone(),
        }
    }
}

impl<S: AttendanceService> AdminPanel<S> {
    pub fn new(directory: EmployeeDirectory<S>, logbook: AttendanceLogbook<S>) -> Self {
        Self { directory, logbook }
    }

    /// The log cache narrowed to the requested scope. Pure; never mutates
    /// the cache and never touches the network.
    pub fn filter_logs(&self, scope: ReportScope) -> Vec<AttendanceLog> {
        scope_filter(&self.logbook.list(), scope, &local_today())
    }

    /// Write the given logs to `path` as CSV. An empty selection produces
    /// no file and returns `None`; the shell turns that into a
    /// "nothing to export" notice.
    pub fn export_csv(
        &self,
        logs: &[AttendanceLog],
        path: &Path,
    ) -> anyhow::Result<Option<PathBuf>> {
        if logs.is_empty() {
            warn!("no attendance logs to export for this selection");
            return Ok(None);
        }

        let csv = render_csv(logs);
        fs::write(path, csv)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        info!("exported {} logs to {}", logs.len(), path.display());
        Ok(Some(path.to_path_buf()))
    }

    /// Refresh both caches concurrently; succeeds only if both do.
    pub async fn refresh_all(&self) -> Result<()> {
        tokio::try_join!(self.directory.refresh(), self.logbook.refresh())?;
        Ok(())
    }
}

/// Narrow a log slice to the given scope against the provided today
/// string. Split out so scoping stays testable without a clock.
pub fn scope_filter(
    logs: &[AttendanceLog],
    scope: ReportScope,
    today: &str,
) -> Vec<AttendanceLog> {
    match scope {
        ReportScope::All => logs.to_vec(),
        ReportScope::Today => logs
            .iter()
            .filter(|log| log.day() == today)
            .cloned()
            .collect(),
    }
}

/// Serialize logs to CSV with a fixed column order. Absent timestamps and
/// image URLs render as empty fields; timestamps are RFC 3339.
pub fn render_csv(logs: &[AttendanceLog]) -> String {
    let mut rows = Vec::with_capacity(logs.len() + 1);
    rows.push(CSV_HEADERS.join(","));

    for log in logs {
        let timestamp = |value: &Option<chrono::DateTime<chrono::Utc>>| {
            value.map(|t| t.to_rfc3339()).unwrap_or_default()
        };
        let url = |value: &Option<String>| value.clone().unwrap_or_default();
        let fields = [
            csv_field(&log.log_id),
            csv_field(&log.employee_id),
            csv_field(&log.employee_name),
            csv_field(&log.date),
            csv_field(&timestamp(&log.punch_in_time)),
            csv_field(&url(&log.punch_in_image_url)),
            csv_field(&timestamp(&log.punch_out_time)),
            csv_field(&url(&log.punch_out_image_url)),
        ];
        rows.push(fields.join(","));
    }

    rows.join("\n")
}

/// Quote a field when it contains the separator, a quote, or a newline;
/// internal quotes are doubled.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
