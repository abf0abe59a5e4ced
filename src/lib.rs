//! Core engine for a photo-verified punch in/out attendance client.
//!
//! The crate keeps local caches of the employee roster and attendance logs,
//! derives each employee's daily punch status, drives the capture-and-submit
//! punch workflow, and exposes the admin filtering/export and session gate.
//! The remote data service, camera hardware, identity widget, and visual
//! shell all live behind traits.

mod admin;
mod auth;
mod camera;
mod config;
mod directory;
mod error;
mod logbook;
mod models;
mod punch;
mod service;

pub use admin::{render_csv, scope_filter, AdminPanel, ReportScope};
pub use auth::{
    AuthGate, CredentialPrompt, MemorySessionStorage, SessionStorage, SESSION_STORAGE_KEY,
};
pub use camera::{
    encode_jpeg_data_url, CameraController, CameraSource, RawFrame, SyntheticCamera,
};
pub use config::Config;
pub use directory::EmployeeDirectory;
pub use error::{Error, Result};
pub use logbook::AttendanceLogbook;
pub use models::{
    local_today, status_for_day, AdminUser, AttendanceLog, DailyStatus, Employee, PunchDirection,
};
pub use punch::{PunchController, PunchPhase, PunchSnapshot, PunchState};
pub use service::{AttendanceService, HttpAttendanceService, NewEmployee, PunchRequest};

use std::sync::Arc;

use log::error;

/// Everything a shell needs, wired together: both caches, the punch
/// workflow, the admin surface, and the session gate, all sharing one
/// service handle.
pub struct App<S, C> {
    pub directory: EmployeeDirectory<S>,
    pub logbook: AttendanceLogbook<S>,
    pub punch: PunchController<S, C>,
    pub admin: AdminPanel<S>,
    pub auth: AuthGate<S>,
}

impl<S: AttendanceService, C: CameraSource> App<S, C> {
    pub fn new(service: S, camera: C, storage: Arc<dyn SessionStorage>, config: &Config) -> Self {
        let service = Arc::new(service);
        let directory = EmployeeDirectory::new(service.clone());
        let logbook = AttendanceLogbook::new(service.clone());
        let camera = CameraController::new(camera, config.frame_interval);
        let punch = PunchController::new(
            directory.clone(),
            logbook.clone(),
            service.clone(),
            camera,
        );
        let admin = AdminPanel::new(directory.clone(), logbook.clone());
        let auth = AuthGate::new(service, storage);

        Self {
            directory,
            logbook,
            punch,
            admin,
            auth,
        }
    }

    /// Startup sequence: restore any persisted session, then load both
    /// caches concurrently. A cold cache is not fatal; failures are logged
    /// and the shell starts with whatever arrived.
    pub async fn initialize(&self) {
        self.auth.restore();

        let (roster, logs) = tokio::join!(self.directory.refresh(), self.logbook.refresh());
        if let Err(err) = roster {
            error!("failed to load the employee roster at startup: {err}");
        }
        // the logbook logs its own refresh failures
        let _ = logs;
    }
}

/// Initialize logging for the embedding shell (reads `RUST_LOG`).
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
