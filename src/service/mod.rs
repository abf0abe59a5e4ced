//! Request/response contract with the remote spreadsheet-backed data
//! service. The engine only ever talks to the service through the
//! [`AttendanceService`] trait; [`http::HttpAttendanceService`] is the
//! production adapter.

mod http;

pub use http::HttpAttendanceService;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AdminUser, AttendanceLog, Employee, PunchDirection};

/// A new roster entry plus its base64-encoded reference photo.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub id: String,
    pub name: String,
    pub image_base64: String,
    pub mime_type: String,
}

/// One punch-in or punch-out submission, carrying the captured still frame
/// as a JPEG data URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PunchRequest {
    pub employee_id: String,
    pub employee_name: String,
    pub image_data_url: String,
    pub direction: PunchDirection,
}

#[async_trait]
pub trait AttendanceService: Send + Sync + 'static {
    /// Fetch the full roster.
    async fn get_employees(&self) -> Result<Vec<Employee>>;

    /// Create a roster entry. Duplicate ids are the server's concern.
    async fn add_employee(&self, request: &NewEmployee) -> Result<()>;

    /// Delete a roster entry by id.
    async fn delete_employee(&self, id: &str) -> Result<()>;

    /// Fetch every attendance log.
    async fn get_attendance(&self) -> Result<Vec<AttendanceLog>>;

    /// Submit a punch; the server answers with the authoritative log for
    /// that employee and day.
    async fn log_attendance(&self, request: &PunchRequest) -> Result<AttendanceLog>;

    /// Exchange an identity-widget credential for a verified admin.
    async fn verify_admin_token(&self, token: &str) -> Result<AdminUser>;
}
