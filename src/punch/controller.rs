use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::camera::{CameraController, CameraSource};
use crate::directory::EmployeeDirectory;
use crate::error::{Error, Result};
use crate::logbook::AttendanceLogbook;
use crate::models::{local_today, status_for_day, AttendanceLog, DailyStatus, PunchDirection};
use crate::service::{AttendanceService, PunchRequest};

use super::{PunchPhase, PunchState};

/// State plus camera flag, broadcast after every transition so a shell can
/// render without polling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchSnapshot {
    pub state: PunchState,
    pub camera_active: bool,
}

/// Drives one operator's punch session: verify an id, derive today's
/// status, keep a live camera feed warm, and submit a single punch whose
/// authoritative result is folded back into the log cache.
pub struct PunchController<S, C> {
    directory: EmployeeDirectory<S>,
    logbook: AttendanceLogbook<S>,
    service: Arc<S>,
    camera: CameraController<C>,
    state: Arc<Mutex<PunchState>>,
    updates: Arc<watch::Sender<PunchSnapshot>>,
}

impl<S, C> Clone for PunchController<S, C> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            logbook: self.logbook.clone(),
            service: self.service.clone(),
            camera: self.camera.clone(),
            state: self.state.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<S: AttendanceService, C: CameraSource> PunchController<S, C> {
    pub fn new(
        directory: EmployeeDirectory<S>,
        logbook: AttendanceLogbook<S>,
        service: Arc<S>,
        camera: CameraController<C>,
    ) -> Self {
        let (updates, _) = watch::channel(PunchSnapshot {
            state: PunchState::new(),
            camera_active: false,
        });
        Self {
            directory,
            logbook,
            service,
            camera,
            state: Arc::new(Mutex::new(PunchState::new())),
            updates: Arc::new(updates),
        }
    }

    pub async fn snapshot(&self) -> PunchSnapshot {
        PunchSnapshot {
            state: self.state.lock().await.clone(),
            camera_active: self.camera.is_active().await,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PunchSnapshot> {
        self.updates.subscribe()
    }

    async fn broadcast(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.updates.send(snapshot);
    }

    /// Look the submitted id up in the directory cache, derive today's
    /// status, and request the camera. An unknown id fails with
    /// `Error::NotFound` and the workflow returns to awaiting an id; camera
    /// trouble is reported without reverting the verified phase.
    pub async fn submit_id(&self, raw_id: &str) -> Result<DailyStatus> {
        let id = raw_id.trim();
        if id.is_empty() {
            return Err(Error::Validation("An employee ID is required.".to_string()));
        }

        {
            let mut state = self.state.lock().await;
            if state.phase != PunchPhase::AwaitingId {
                return Err(Error::Validation(
                    "A punch is already in progress. Start over first.".to_string(),
                ));
            }
            state.begin_verifying();
        }
        self.broadcast().await;

        let employee = match self.directory.find(id) {
            Some(employee) => employee,
            None => {
                let err = Error::NotFound(id.to_string());
                self.state.lock().await.verify_failed(err.to_string());
                self.broadcast().await;
                return Err(err);
            }
        };

        let today = local_today();
        let status = status_for_day(&self.logbook.list(), &employee.id, &today);
        info!(
            "verified employee {} with status {:?} for {}",
            employee.id, status, today
        );
        self.state.lock().await.verified(employee, status);
        self.broadcast().await;

        if let Err(err) = self.camera.start().await {
            warn!("camera acquisition failed after verification: {err}");
            self.state.lock().await.report_camera_error(err.to_string());
            self.broadcast().await;
        }

        Ok(status)
    }

    /// Re-attempt camera acquisition after a reported failure.
    pub async fn retry_camera(&self) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.verified_status().is_none() {
                return Err(Error::Validation(
                    "No verified employee. Submit an ID first.".to_string(),
                ));
            }
        }

        let result = self.camera.start().await;
        {
            let mut state = self.state.lock().await;
            match &result {
                Ok(()) => state.clear_error(),
                Err(err) => state.report_camera_error(err.to_string()),
            }
        }
        self.broadcast().await;
        result
    }

    /// Capture a still frame, release the camera, and submit the punch.
    ///
    /// Only callable from the verified phase with the direction that phase
    /// enables, which also guarantees at most one in-flight submission. On
    /// a server or transport failure the message is surfaced verbatim, the
    /// camera is re-acquired, and the verified phase is restored.
    pub async fn punch(&self, direction: PunchDirection) -> Result<AttendanceLog> {
        let (employee, status) = {
            let mut state = self.state.lock().await;
            let status = match state.phase {
                PunchPhase::Verified { status } => status,
                _ => {
                    return Err(Error::Validation(
                        "No verified employee is ready to punch.".to_string(),
                    ))
                }
            };
            if status.enabled_direction() != Some(direction) {
                return Err(Error::Validation(format!(
                    "Punch-{} is not available right now.",
                    direction.as_str()
                )));
            }
            let employee = state.employee.clone().ok_or_else(|| {
                Error::Validation("No verified employee is ready to punch.".to_string())
            })?;
            state.begin_capture(status);
            (employee, status)
        };
        self.broadcast().await;

        let image_data_url = match self.camera.capture_still().await {
            Ok(url) => url,
            Err(err) => {
                self.state.lock().await.submit_failed(status, err.to_string());
                self.broadcast().await;
                return Err(err);
            }
        };
        self.camera.stop().await;

        self.state.lock().await.begin_submit(status);
        self.broadcast().await;

        let request = PunchRequest {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            image_data_url,
            direction,
        };

        match self.service.log_attendance(&request).await {
            Ok(record) => {
                self.logbook.merge_upsert(record.clone());
                info!(
                    "punch-{} recorded for {} (log {})",
                    direction.as_str(),
                    employee.id,
                    record.log_id
                );
                let message = format!("You have successfully punched {}.", direction.as_str());
                self.state.lock().await.completed(message);
                self.broadcast().await;
                Ok(record)
            }
            Err(err) => {
                warn!("punch-{} failed for {}: {err}", direction.as_str(), employee.id);
                self.state.lock().await.submit_failed(status, err.to_string());
                if let Err(camera_err) = self.camera.start().await {
                    self.state
                        .lock()
                        .await
                        .report_camera_error(camera_err.to_string());
                }
                self.broadcast().await;
                Err(err)
            }
        }
    }

    /// Back to awaiting an id from any phase, releasing the camera.
    pub async fn start_over(&self) {
        self.camera.stop().await;
        self.state.lock().await.reset();
        self.broadcast().await;
    }

    /// Shell unmount hook: the camera must never outlive the workflow.
    pub async fn teardown(&self) {
        self.camera.stop().await;
        self.broadcast().await;
    }
}
