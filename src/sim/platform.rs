//! Recording fakes for the host page and the push platform.

use crate::collaborators::{HostPage, PermissionRequestError, PermissionState, PushPlatform};
use crate::error::SdkError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct SimHostPage {
    href: RwLock<String>,
    title: RwLock<String>,
    navigations: Mutex<Vec<String>>,
    sessions: AtomicUsize,
}

impl SimHostPage {
    pub fn new(href: &str, title: &str) -> Self {
        Self {
            href: RwLock::new(href.to_string()),
            title: RwLock::new(title.to_string()),
            navigations: Mutex::new(Vec::new()),
            sessions: AtomicUsize::new(0),
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    pub fn browser_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl HostPage for SimHostPage {
    fn location_href(&self) -> String {
        self.href.read().clone()
    }

    fn title(&self) -> String {
        self.title.read().clone()
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().push(url.to_string());
        *self.href.write() = url.to_string();
    }

    fn begin_browser_session(&self) {
        self.sessions.fetch_add(1, Ordering::SeqCst);
    }
}

/// Push platform with scripted answers and a record of every call
pub struct SimPushPlatform {
    permission: RwLock<PermissionState>,
    request_outcome: RwLock<Result<Value, PermissionRequestError>>,
    showing_request: AtomicBool,
    push_enabled: AtomicBool,
    fail_unsubscribe: AtomicBool,
    dismissals: AtomicUsize,
    unsubscribes: AtomicUsize,
    prompts: Mutex<Vec<Value>>,
    subscription_changes: Mutex<Vec<bool>>,
    registrations: Mutex<Vec<Value>>,
}

impl Default for SimPushPlatform {
    fn default() -> Self {
        Self {
            permission: RwLock::new(PermissionState::Default),
            request_outcome: RwLock::new(Ok(Value::String("granted".to_string()))),
            showing_request: AtomicBool::new(false),
            push_enabled: AtomicBool::new(false),
            fail_unsubscribe: AtomicBool::new(false),
            dismissals: AtomicUsize::new(0),
            unsubscribes: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            subscription_changes: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
        }
    }
}

impl SimPushPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_permission(&self, permission: PermissionState) {
        *self.permission.write() = permission;
    }

    pub fn set_request_outcome(&self, outcome: Result<Value, PermissionRequestError>) {
        *self.request_outcome.write() = outcome;
    }

    pub fn set_showing_request(&self, showing: bool) {
        self.showing_request.store(showing, Ordering::SeqCst);
    }

    pub fn set_push_enabled(&self, enabled: bool) {
        self.push_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Value> {
        self.prompts.lock().clone()
    }

    pub fn subscription_changes(&self) -> Vec<bool> {
        self.subscription_changes.lock().clone()
    }

    pub fn registrations(&self) -> Vec<Value> {
        self.registrations.lock().clone()
    }
}

#[async_trait]
impl PushPlatform for SimPushPlatform {
    async fn notification_permission(&self) -> PermissionState {
        *self.permission.read()
    }

    async fn show_http_permission_request(
        &self,
        _options: Value,
    ) -> Result<Value, PermissionRequestError> {
        self.request_outcome.read().clone()
    }

    async fn is_showing_http_permission_request(&self) -> bool {
        self.showing_request.load(Ordering::SeqCst)
    }

    fn mark_prompt_dismissed(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }

    async fn unsubscribe_from_push(&self) -> Result<(), SdkError> {
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(SdkError::InvalidState("No push subscription".to_string()));
        }
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn show_http_prompt(&self, options: Value) -> Result<(), SdkError> {
        self.prompts.lock().push(options);
        Ok(())
    }

    async fn set_subscription(&self, enabled: bool) -> Result<(), SdkError> {
        self.subscription_changes.lock().push(enabled);
        Ok(())
    }

    async fn finish_remote_registration(&self, subscription_info: Value) -> Result<(), SdkError> {
        self.registrations.lock().push(subscription_info);
        Ok(())
    }

    async fn is_push_enabled(&self) -> bool {
        self.push_enabled.load(Ordering::SeqCst)
    }
}
