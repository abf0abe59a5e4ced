use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::info;

use crate::error::{Error, Result};
use crate::models::Employee;
use crate::service::{AttendanceService, NewEmployee};

/// Local cache of the employee roster.
///
/// Mutations never touch the cache directly: add/remove go to the server and
/// finish with a full refresh, so the cache is only ever a sorted copy of
/// what the server last reported.
pub struct EmployeeDirectory<S> {
    service: Arc<S>,
    roster: Arc<RwLock<Vec<Employee>>>,
}

impl<S> Clone for EmployeeDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            roster: self.roster.clone(),
        }
    }
}

impl<S: AttendanceService> EmployeeDirectory<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            roster: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The current roster, ordered by name. No network call.
    pub fn list(&self) -> Vec<Employee> {
        self.roster.read().unwrap().clone()
    }

    /// Exact-match lookup by employee id.
    pub fn find(&self, id: &str) -> Option<Employee> {
        self.roster
            .read()
            .unwrap()
            .iter()
            .find(|employee| employee.id == id)
            .cloned()
    }

    /// Replace the cache with the server's roster. On failure the cache is
    /// left exactly as it was and the error propagates.
    pub async fn refresh(&self) -> Result<()> {
        let mut employees = self.service.get_employees().await?;
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        info!("employee roster refreshed ({} entries)", employees.len());
        *self.roster.write().unwrap() = employees;
        Ok(())
    }

    /// Create a roster entry and refresh. The photo is base64-encoded here;
    /// duplicate id detection is the server's job.
    pub async fn add(&self, id: &str, name: &str, photo: &[u8], mime_type: &str) -> Result<()> {
        let id = id.trim();
        let name = name.trim();
        if id.is_empty() || name.is_empty() || photo.is_empty() {
            return Err(Error::Validation(
                "Please provide an ID, a name, and a photo.".to_string(),
            ));
        }

        let request = NewEmployee {
            id: id.to_string(),
            name: name.to_string(),
            image_base64: BASE64.encode(photo),
            mime_type: mime_type.to_string(),
        };
        self.service.add_employee(&request).await?;
        self.refresh().await
    }

    /// Delete a roster entry and refresh.
    pub async fn remove(&self, employee: &Employee) -> Result<()> {
        self.service.delete_employee(&employee.id).await?;
        self.refresh().await
    }
}
