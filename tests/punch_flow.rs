//! End-to-end punch workflow against a scripted service and a counting
//! camera: verification, status gating, capture, submission, and the
//! merge-upsert back into the log cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use punchdesk::{
    local_today, AdminUser, App, AttendanceLog, AttendanceService, CameraSource, Config,
    DailyStatus, Employee, Error, MemorySessionStorage, NewEmployee, PunchDirection, PunchPhase,
    PunchRequest, RawFrame, Result,
};

struct FakeService {
    employees: Vec<Employee>,
    records: Vec<AttendanceLog>,
    punch_replies: Arc<Mutex<Vec<Result<AttendanceLog>>>>,
    punch_requests: Arc<Mutex<Vec<PunchRequest>>>,
}

impl FakeService {
    fn new(employees: Vec<Employee>, records: Vec<AttendanceLog>) -> Self {
        Self {
            employees,
            records,
            punch_replies: Arc::new(Mutex::new(Vec::new())),
            punch_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AttendanceService for FakeService {
    async fn get_employees(&self) -> Result<Vec<Employee>> {
        Ok(self.employees.clone())
    }

    async fn add_employee(&self, _request: &NewEmployee) -> Result<()> {
        Ok(())
    }

    async fn delete_employee(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn get_attendance(&self) -> Result<Vec<AttendanceLog>> {
        Ok(self.records.clone())
    }

    async fn log_attendance(&self, request: &PunchRequest) -> Result<AttendanceLog> {
        self.punch_requests.lock().unwrap().push(request.clone());
        self.punch_replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Service("no punch reply scripted".to_string())))
    }

    async fn verify_admin_token(&self, _token: &str) -> Result<AdminUser> {
        Err(Error::Service("Access denied.".to_string()))
    }
}

#[derive(Clone, Default)]
struct CameraCounters {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

struct CountingCamera {
    counters: CameraCounters,
}

#[async_trait]
impl CameraSource for CountingCamera {
    async fn open(&self) -> Result<()> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        Ok(RawFrame {
            width: 8,
            height: 8,
            pixels: vec![0x40; 8 * 8 * 3],
        })
    }

    async fn close(&self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn jane() -> Employee {
    Employee {
        id: "EMP001".to_string(),
        name: "Jane Doe".to_string(),
        reference_image_url: "https://img/jane".to_string(),
    }
}

fn authoritative_log(log_id: &str, punched_out: bool) -> AttendanceLog {
    let stamp = |at: &str| {
        DateTime::parse_from_rfc3339(at)
            .unwrap()
            .with_timezone(&Utc)
    };
    AttendanceLog {
        log_id: log_id.to_string(),
        employee_id: "EMP001".to_string(),
        employee_name: "Jane Doe".to_string(),
        date: local_today(),
        punch_in_time: Some(stamp("2026-08-05T08:00:00Z")),
        punch_in_image_url: Some("https://img/punch-in".to_string()),
        punch_out_time: punched_out.then(|| stamp("2026-08-05T17:00:00Z")),
        punch_out_image_url: None,
    }
}

async fn app_with(
    service: FakeService,
) -> (
    App<FakeService, CountingCamera>,
    CameraCounters,
) {
    let counters = CameraCounters::default();
    let camera = CountingCamera {
        counters: counters.clone(),
    };
    let app = App::new(
        service,
        camera,
        Arc::new(MemorySessionStorage::new()),
        &Config::new("https://service.invalid/exec"),
    );
    app.initialize().await;
    (app, counters)
}

#[tokio::test]
async fn an_unknown_id_is_rejected_and_the_workflow_stays_put() {
    let (app, _) = app_with(FakeService::new(vec![jane()], Vec::new())).await;

    let err = app.punch.submit_id("NOPE").await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(err.to_string(), "Employee with ID \"NOPE\" not found.");
    let snapshot = app.punch.snapshot().await;
    assert_eq!(snapshot.state.phase, PunchPhase::AwaitingId);
    assert!(!snapshot.camera_active);
}

#[tokio::test]
async fn a_successful_punch_in_lands_in_the_log_cache() {
    let service = FakeService::new(vec![jane()], Vec::new());
    service
        .punch_replies
        .lock()
        .unwrap()
        .push(Ok(authoritative_log("L1", false)));
    let (app, counters) = app_with(service).await;

    let status = app.punch.submit_id("EMP001").await.unwrap();
    assert_eq!(status, DailyStatus::NotPunchedIn);

    // punch-out is not enabled from NotPunchedIn
    let err = app.punch.punch(PunchDirection::Out).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let record = app.punch.punch(PunchDirection::In).await.unwrap();
    assert_eq!(record.log_id, "L1");

    let logs = app.logbook.list();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_id, "L1");

    let snapshot = app.punch.snapshot().await;
    assert_eq!(
        snapshot.state.phase,
        PunchPhase::Success {
            message: "You have successfully punched in.".to_string()
        }
    );
    // the camera was acquired once and released before submission
    assert!(!snapshot.camera_active);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn the_submitted_image_is_a_jpeg_data_url() {
    let service = FakeService::new(vec![jane()], Vec::new());
    service
        .punch_replies
        .lock()
        .unwrap()
        .push(Ok(authoritative_log("L1", false)));
    let requests = service.punch_requests.clone();
    let (app, _) = app_with(service).await;

    app.punch.submit_id("EMP001").await.unwrap();
    app.punch.punch(PunchDirection::In).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].employee_id, "EMP001");
    assert_eq!(requests[0].employee_name, "Jane Doe");
    assert_eq!(requests[0].direction, PunchDirection::In);
    assert!(requests[0]
        .image_data_url
        .starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn a_rejected_punch_returns_to_verified_with_the_message_verbatim() {
    let service = FakeService::new(vec![jane()], Vec::new());
    service
        .punch_replies
        .lock()
        .unwrap()
        .push(Err(Error::Service("duplicate punch".to_string())));
    let (app, counters) = app_with(service).await;

    app.punch.submit_id("EMP001").await.unwrap();
    let err = app.punch.punch(PunchDirection::In).await.unwrap_err();

    assert_eq!(err.to_string(), "duplicate punch");
    let snapshot = app.punch.snapshot().await;
    assert_eq!(
        snapshot.state.phase,
        PunchPhase::Verified {
            status: DailyStatus::NotPunchedIn
        }
    );
    assert_eq!(snapshot.state.last_error.as_deref(), Some("duplicate punch"));
    // the camera was re-acquired for the retry
    assert!(snapshot.camera_active);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 2);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

    // the log cache must not have been touched
    assert!(app.logbook.list().is_empty());

    app.punch.teardown().await;
    assert_eq!(counters.closes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn an_open_log_for_today_enables_only_punch_out() {
    let open_log = authoritative_log("L1", false);
    let service = FakeService::new(vec![jane()], vec![open_log]);
    service
        .punch_replies
        .lock()
        .unwrap()
        .push(Ok(authoritative_log("L1", true)));
    let (app, _) = app_with(service).await;

    let status = app.punch.submit_id("EMP001").await.unwrap();
    assert_eq!(status, DailyStatus::PunchedIn);

    let err = app.punch.punch(PunchDirection::In).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let record = app.punch.punch(PunchDirection::Out).await.unwrap();
    assert!(record.punch_out_time.is_some());

    // the merged log replaced the original entry instead of growing the cache
    let logs = app.logbook.list();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].punch_out_time.is_some());
}

#[tokio::test]
async fn a_completed_day_enables_neither_action() {
    let service = FakeService::new(vec![jane()], vec![authoritative_log("L1", true)]);
    let (app, _) = app_with(service).await;

    let status = app.punch.submit_id("EMP001").await.unwrap();
    assert_eq!(status, DailyStatus::CompletedForDay);

    assert!(app.punch.punch(PunchDirection::In).await.is_err());
    assert!(app.punch.punch(PunchDirection::Out).await.is_err());
}

#[tokio::test]
async fn start_over_releases_the_camera_and_resets_the_workflow() {
    let (app, counters) = app_with(FakeService::new(vec![jane()], Vec::new())).await;

    app.punch.submit_id("EMP001").await.unwrap();
    assert!(app.punch.snapshot().await.camera_active);

    app.punch.start_over().await;

    let snapshot = app.punch.snapshot().await;
    assert_eq!(snapshot.state.phase, PunchPhase::AwaitingId);
    assert!(snapshot.state.employee.is_none());
    assert!(!snapshot.camera_active);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}
