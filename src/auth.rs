use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{error, info};

use crate::error::Result;
use crate::models::AdminUser;
use crate::service::AttendanceService;

/// Single storage key under which the verified admin identity lives.
pub const SESSION_STORAGE_KEY: &str = "punchdesk-user";

/// Tab-scoped key-value storage, the shape of a browser's sessionStorage.
/// The shell supplies whatever backs it; the in-memory implementation below
/// covers tests and headless use.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemorySessionStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }
}

/// The identity widget's controllable surface. After a rejected credential
/// (and on sign-out) the widget must stop auto-selecting the previous
/// account, or the operator gets stuck in a rejection loop.
pub trait CredentialPrompt: Send + Sync {
    fn disable_auto_select(&self);
}

/// Holds the authenticated admin for the lifetime of the tab and gates the
/// admin surface. `handle_credential` is the callback handed to the
/// identity widget.
pub struct AuthGate<S> {
    service: Arc<S>,
    storage: Arc<dyn SessionStorage>,
    user: Arc<RwLock<Option<AdminUser>>>,
    prompt: Arc<RwLock<Option<Arc<dyn CredentialPrompt>>>>,
}

impl<S> Clone for AuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            storage: self.storage.clone(),
            user: self.user.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

impl<S: AttendanceService> AuthGate<S> {
    pub fn new(service: Arc<S>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            service,
            storage,
            user: Arc::new(RwLock::new(None)),
            prompt: Arc::new(RwLock::new(None)),
        }
    }

    pub fn attach_prompt(&self, prompt: Arc<dyn CredentialPrompt>) {
        *self.prompt.write().unwrap() = Some(prompt);
    }

    /// Restore a session persisted by a previous load of the same tab. A
    /// value that no longer parses is cleared rather than trusted.
    pub fn restore(&self) {
        let Some(stored) = self.storage.get(SESSION_STORAGE_KEY) else {
            return;
        };
        match serde_json::from_str::<AdminUser>(&stored) {
            Ok(user) => {
                info!("restored admin session for {}", user.email);
                *self.user.write().unwrap() = Some(user);
            }
            Err(err) => {
                error!("failed to parse stored session, clearing it: {err}");
                self.storage.remove(SESSION_STORAGE_KEY);
            }
        }
    }

    pub fn current_user(&self) -> Option<AdminUser> {
        self.user.read().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.read().unwrap().is_some()
    }

    /// Exchange an identity-widget credential for a verified admin. A
    /// rejected or errored exchange leaves the gate anonymous, surfaces the
    /// reason, and suppresses the widget's auto-reselect.
    pub async fn handle_credential(&self, token: &str) -> Result<AdminUser> {
        match self.service.verify_admin_token(token).await {
            Ok(user) => {
                match serde_json::to_string(&user) {
                    Ok(json) => self.storage.set(SESSION_STORAGE_KEY, &json),
                    Err(err) => error!("failed to persist session: {err}"),
                }
                info!("admin verified: {}", user.email);
                *self.user.write().unwrap() = Some(user.clone());
                Ok(user)
            }
            Err(err) => {
                error!("admin verification failed: {err}");
                self.suppress_auto_select();
                Err(err)
            }
        }
    }

    /// Immediately and unconditionally drop the session, in memory and in
    /// storage.
    pub fn sign_out(&self) {
        *self.user.write().unwrap() = None;
        self.storage.remove(SESSION_STORAGE_KEY);
        self.suppress_auto_select();
        info!("admin signed out");
    }

    fn suppress_auto_select(&self) {
        if let Some(prompt) = self.prompt.read().unwrap().as_ref() {
            prompt.disable_auto_select();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;
    use crate::service::testing::StubService;

    #[derive(Default)]
    struct RecordingPrompt {
        suppressions: AtomicUsize,
    }

    impl CredentialPrompt for RecordingPrompt {
        fn disable_auto_select(&self) {
            self.suppressions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn admin() -> AdminUser {
        AdminUser {
            id: "u-1".to_string(),
            name: "Pat Admin".to_string(),
            email: "pat@example.com".to_string(),
            picture_url: "https://img/pat".to_string(),
        }
    }

    fn gate_with(stub: Arc<StubService>) -> (AuthGate<StubService>, Arc<MemorySessionStorage>) {
        let storage = Arc::new(MemorySessionStorage::new());
        (AuthGate::new(stub, storage.clone()), storage)
    }

    #[tokio::test]
    async fn a_verified_credential_authenticates_and_persists() {
        let stub = Arc::new(StubService::default());
        stub.verify_replies.lock().unwrap().push(Ok(admin()));
        let (gate, storage) = gate_with(stub);

        let user = gate.handle_credential("token").await.unwrap();

        assert_eq!(user, admin());
        assert!(gate.is_authenticated());
        let stored = storage.get(SESSION_STORAGE_KEY).unwrap();
        assert_eq!(serde_json::from_str::<AdminUser>(&stored).unwrap(), admin());
    }

    #[tokio::test]
    async fn a_rejected_credential_stays_anonymous_and_suppresses_reselect() {
        let stub = Arc::new(StubService::default());
        let (gate, storage) = gate_with(stub);
        let prompt = Arc::new(RecordingPrompt::default());
        gate.attach_prompt(prompt.clone());

        let err = gate.handle_credential("bad-token").await.unwrap_err();

        assert!(matches!(err, Error::Service(_)));
        assert!(!gate.is_authenticated());
        assert!(storage.get(SESSION_STORAGE_KEY).is_none());
        assert_eq!(prompt.suppressions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sign_out_clears_memory_and_storage() {
        let stub = Arc::new(StubService::default());
        stub.verify_replies.lock().unwrap().push(Ok(admin()));
        let (gate, storage) = gate_with(stub);
        let prompt = Arc::new(RecordingPrompt::default());
        gate.attach_prompt(prompt.clone());
        gate.handle_credential("token").await.unwrap();

        gate.sign_out();

        assert!(!gate.is_authenticated());
        assert!(storage.get(SESSION_STORAGE_KEY).is_none());
        assert_eq!(prompt.suppressions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn restore_round_trips_a_persisted_session() {
        let stub = Arc::new(StubService::default());
        let (gate, storage) = gate_with(stub.clone());
        storage.set(
            SESSION_STORAGE_KEY,
            &serde_json::to_string(&admin()).unwrap(),
        );

        gate.restore();

        assert_eq!(gate.current_user(), Some(admin()));
    }

    #[test]
    fn restore_clears_an_unparseable_session() {
        let stub = Arc::new(StubService::default());
        let (gate, storage) = gate_with(stub);
        storage.set(SESSION_STORAGE_KEY, "{not json");

        gate.restore();

        assert!(!gate.is_authenticated());
        assert!(storage.get(SESSION_STORAGE_KEY).is_none());
    }
}
