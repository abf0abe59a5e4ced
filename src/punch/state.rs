use serde::{Deserialize, Serialize};

use crate::models::{DailyStatus, Employee, PunchDirection};

/// Where the punch workflow currently stands. The `Verified`, `Capturing`
/// and `Submitting` phases carry the daily status derived at verification
/// time; the status decides which single punch action is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum PunchPhase {
    AwaitingId,
    Verifying,
    Verified { status: DailyStatus },
    Capturing { status: DailyStatus },
    Submitting { status: DailyStatus },
    Success { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PunchState {
    pub phase: PunchPhase,
    pub employee: Option<Employee>,
    pub last_error: Option<String>,
}

impl Default for PunchState {
    fn default() -> Self {
        Self {
            phase: PunchPhase::AwaitingId,
            employee: None,
            last_error: None,
        }
    }
}

impl PunchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn begin_verifying(&mut self) {
        self.phase = PunchPhase::Verifying;
        self.employee = None;
        self.last_error = None;
    }

    /// Identity lookup failed; the operator must re-enter the id.
    pub fn verify_failed(&mut self, message: impl Into<String>) {
        self.phase = PunchPhase::AwaitingId;
        self.employee = None;
        self.last_error = Some(message.into());
    }

    pub fn verified(&mut self, employee: Employee, status: DailyStatus) {
        self.employee = Some(employee);
        self.phase = PunchPhase::Verified { status };
    }

    /// Camera trouble is surfaced without leaving the verified phase; the
    /// operator may retry acquisition.
    pub fn report_camera_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn verified_status(&self) -> Option<DailyStatus> {
        match self.phase {
            PunchPhase::Verified { status } => Some(status),
            _ => None,
        }
    }

    pub fn punch_enabled(&self, direction: PunchDirection) -> bool {
        self.verified_status()
            .map(|status| status.enabled_direction() == Some(direction))
            .unwrap_or(false)
    }

    pub fn begin_capture(&mut self, status: DailyStatus) {
        self.last_error = None;
        self.phase = PunchPhase::Capturing { status };
    }

    pub fn begin_submit(&mut self, status: DailyStatus) {
        self.phase = PunchPhase::Submitting { status };
    }

    /// A failed submission returns to the verified phase unchanged so the
    /// operator can retry without re-entering the id.
    pub fn submit_failed(&mut self, status: DailyStatus, message: impl Into<String>) {
        self.phase = PunchPhase::Verified { status };
        self.last_error = Some(message.into());
    }

    pub fn completed(&mut self, message: String) {
        self.phase = PunchPhase::Success { message };
        self.last_error = None;
    }
}
