use std::sync::{Arc, RwLock};

use log::{error, info};

use crate::error::Result;
use crate::models::AttendanceLog;
use crate::service::AttendanceService;

/// Local cache of attendance logs, ordered date-descending with ties broken
/// by employee name.
pub struct AttendanceLogbook<S> {
    service: Arc<S>,
    logs: Arc<RwLock<Vec<AttendanceLog>>>,
}

impl<S> Clone for AttendanceLogbook<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            logs: self.logs.clone(),
        }
    }
}

impl<S: AttendanceService> AttendanceLogbook<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            logs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The current ordered log sequence. No network call.
    pub fn list(&self) -> Vec<AttendanceLog> {
        self.logs.read().unwrap().clone()
    }

    /// Replace the cache with the server's logs. A stale cache beats an
    /// empty one: on failure the last known value stays in place, the
    /// condition is logged, and the error is returned so a combined refresh
    /// can report it.
    pub async fn refresh(&self) -> Result<()> {
        let mut records = match self.service.get_attendance().await {
            Ok(records) => records,
            Err(err) => {
                error!("attendance refresh failed, keeping cached logs: {err}");
                return Err(err);
            }
        };
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.employee_name.cmp(&b.employee_name))
        });
        info!("attendance logs refreshed ({} records)", records.len());
        *self.logs.write().unwrap() = records;
        Ok(())
    }

    /// Fold one authoritative server log into the cache: replace in place
    /// when the `log_id` is known (keeping its position), otherwise insert
    /// at the front. This is how a completed punch lands without a refetch.
    pub fn merge_upsert(&self, log: AttendanceLog) {
        let mut logs = self.logs.write().unwrap();
        match logs.iter().position(|existing| existing.log_id == log.log_id) {
            Some(index) => logs[index] = log,
            None => logs.insert(0, log),
        }
    }
}
