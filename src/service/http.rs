use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{AdminUser, AttendanceLog, Employee};
use crate::service::{AttendanceService, NewEmployee, PunchRequest};

/// HTTP adapter for the spreadsheet-backed data service. All actions go
/// through one endpoint: reads as `GET ?action=...`, writes as a `POST`
/// whose JSON body carries the `action` field.
pub struct HttpAttendanceService {
    client: Client,
    base_url: String,
}

impl HttpAttendanceService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.service_url.clone(),
        })
    }

    async fn get_raw(&self, query: &str) -> Result<String> {
        let url = format!("{}?{}", self.base_url, query);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "request failed with status {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }

    async fn post_raw(&self, body: &serde_json::Value) -> Result<String> {
        let response = self.client.post(&self.base_url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "request failed with status {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

#[derive(Deserialize)]
struct RosterResponse {
    success: bool,
    message: Option<String>,
    #[serde(default)]
    employees: Vec<Employee>,
}

#[derive(Deserialize)]
struct RecordsResponse {
    success: bool,
    message: Option<String>,
    #[serde(default)]
    records: Vec<AttendanceLog>,
}

#[derive(Deserialize)]
struct PunchResponse {
    success: bool,
    message: Option<String>,
    log: Option<AttendanceLog>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    success: bool,
    message: Option<String>,
    user: Option<AdminUser>,
}

#[derive(Deserialize)]
struct AckResponse {
    success: bool,
    message: Option<String>,
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|err| Error::Fetch(format!("malformed service response: {err}")))
}

fn service_failure(message: Option<String>, fallback: &str) -> Error {
    Error::Service(message.unwrap_or_else(|| fallback.to_string()))
}

fn parse_roster(raw: &str) -> Result<Vec<Employee>> {
    let parsed: RosterResponse = decode(raw)?;
    if parsed.success {
        Ok(parsed.employees)
    } else {
        Err(service_failure(
            parsed.message,
            "An unknown error occurred fetching employees.",
        ))
    }
}

fn parse_records(raw: &str) -> Result<Vec<AttendanceLog>> {
    let parsed: RecordsResponse = decode(raw)?;
    if parsed.success {
        Ok(parsed.records)
    } else {
        Err(service_failure(
            parsed.message,
            "An unknown error occurred fetching logs.",
        ))
    }
}

fn parse_punch_log(raw: &str) -> Result<AttendanceLog> {
    let parsed: PunchResponse = decode(raw)?;
    match (parsed.success, parsed.log) {
        (true, Some(log)) => Ok(log),
        (_, _) => Err(service_failure(
            parsed.message,
            "An unknown error occurred during the punch.",
        )),
    }
}

fn parse_admin_user(raw: &str) -> Result<AdminUser> {
    let parsed: VerifyResponse = decode(raw)?;
    match (parsed.success, parsed.user) {
        (true, Some(user)) => Ok(user),
        (_, _) => Err(service_failure(
            parsed.message,
            "Access denied. You are not an authorized administrator.",
        )),
    }
}

fn parse_ack(raw: &str, fallback: &str) -> Result<()> {
    let parsed: AckResponse = decode(raw)?;
    if parsed.success {
        Ok(())
    } else {
        Err(service_failure(parsed.message, fallback))
    }
}

#[async_trait]
impl AttendanceService for HttpAttendanceService {
    async fn get_employees(&self) -> Result<Vec<Employee>> {
        let raw = self.get_raw("action=getEmployees").await?;
        parse_roster(&raw)
    }

    async fn add_employee(&self, request: &NewEmployee) -> Result<()> {
        let body = json!({
            "action": "addEmployee",
            "id": request.id,
            "name": request.name,
            "imageBase64": request.image_base64,
            "mimeType": request.mime_type,
        });
        let raw = self.post_raw(&body).await?;
        parse_ack(&raw, "Failed to add employee on the server.")
    }

    async fn delete_employee(&self, id: &str) -> Result<()> {
        let body = json!({
            "action": "deleteEmployee",
            "id": id,
        });
        let raw = self.post_raw(&body).await?;
        parse_ack(&raw, "Failed to delete employee on the server.")
    }

    async fn get_attendance(&self) -> Result<Vec<AttendanceLog>> {
        // Intermediaries aggressively cache this endpoint; a fresh token per
        // request defeats them.
        let query = format!("action=getAttendance&cacheBust={}", Uuid::new_v4());
        let raw = self.get_raw(&query).await?;
        parse_records(&raw)
    }

    async fn log_attendance(&self, request: &PunchRequest) -> Result<AttendanceLog> {
        let body = json!({
            "action": "logAttendance",
            "employeeId": request.employee_id,
            "name": request.employee_name,
            "imageDataUrl": request.image_data_url,
            "punchType": request.direction.as_str(),
        });
        let raw = self.post_raw(&body).await?;
        parse_punch_log(&raw)
    }

    async fn verify_admin_token(&self, token: &str) -> Result<AdminUser> {
        let body = json!({
            "action": "verifyAdminToken",
            "token": token,
        });
        let raw = self.post_raw(&body).await?;
        parse_admin_user(&raw)
    }
}
