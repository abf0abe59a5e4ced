use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// One employee's punch record for one calendar day.
///
/// The server owns every transition: it creates the log on the first
/// punch-in of the day and fills in the punch-out later. The client only
/// ever replaces its local copy wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceLog {
    #[serde(rename = "LogID", deserialize_with = "super::sheet_id")]
    pub log_id: String,
    #[serde(rename = "EmployeeID", deserialize_with = "super::sheet_id")]
    pub employee_id: String,
    #[serde(rename = "EmployeeName")]
    pub employee_name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "PunchInTime", default)]
    pub punch_in_time: Option<DateTime<Utc>>,
    #[serde(rename = "PunchInImageURL", default)]
    pub punch_in_image_url: Option<String>,
    #[serde(rename = "PunchOutTime", default)]
    pub punch_out_time: Option<DateTime<Utc>>,
    #[serde(rename = "PunchOutImageURL", default)]
    pub punch_out_image_url: Option<String>,
}

impl AttendanceLog {
    /// The log's calendar day. Sheet cells occasionally hold a full datetime
    /// instead of a plain `YYYY-MM-DD`; keep only the date part.
    pub fn day(&self) -> &str {
        match self.date.split_once('T') {
            Some((day, _)) => day,
            None => &self.date,
        }
    }
}

/// Where an employee stands in today's punch cycle. Derived on demand from
/// the log cache, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DailyStatus {
    NotPunchedIn,
    PunchedIn,
    CompletedForDay,
}

impl DailyStatus {
    /// The single punch action available from this status, if any.
    pub fn enabled_direction(self) -> Option<PunchDirection> {
        match self {
            DailyStatus::NotPunchedIn => Some(PunchDirection::In),
            DailyStatus::PunchedIn => Some(PunchDirection::Out),
            DailyStatus::CompletedForDay => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PunchDirection {
    In,
    Out,
}

impl PunchDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            PunchDirection::In => "in",
            PunchDirection::Out => "out",
        }
    }
}

/// Derive an employee's punch status for the given calendar day.
///
/// A log with a punch-in and no punch-out means the employee is on the
/// clock; any other existing log for the day counts as completed.
pub fn status_for_day(logs: &[AttendanceLog], employee_id: &str, day: &str) -> DailyStatus {
    let todays = logs
        .iter()
        .find(|log| log.employee_id == employee_id && log.day() == day);

    match todays {
        None => DailyStatus::NotPunchedIn,
        Some(log) if log.punch_in_time.is_some() && log.punch_out_time.is_none() => {
            DailyStatus::PunchedIn
        }
        Some(_) => DailyStatus::CompletedForDay,
    }
}

/// Today as the operator's local wall-clock calendar date.
///
/// The punch boundary must line up with the employee's actual workday, so a
/// UTC-derived date is wrong here whenever the operator is west or east of
/// Greenwich around midnight.
pub fn local_today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
