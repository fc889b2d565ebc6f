//! External collaborator contracts.
//!
//! Storage, app config fetching, the DOM, the host page and the push
//! platform are I/O the core only reaches through these traits. The `sim`
//! module and `storage` module provide implementations.

use crate::environment::AppConfig;
use crate::error::{SdkError, StorageError};
use crate::messenger::WindowTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use url::Url;

/// Two-level (table, key) persistent store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// The stored value for `key`, if any.
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError>;

    /// Insert or replace a whole record; the table's key path names its key field.
    async fn put(&self, table: &str, record: Value) -> Result<(), StorageError>;

    async fn remove(&self, table: &str, key: &str) -> Result<(), StorageError>;
}

/// Fetches server-side app configuration (network).
#[async_trait]
pub trait AppConfigSource: Send + Sync {
    async fn get_app_config(&self, app_id: &str) -> Result<AppConfig, SdkError>;
}

/// The top-level page a context lives in.
pub trait HostPage: Send + Sync {
    fn location_href(&self) -> String;

    fn title(&self) -> String;

    /// Point the page at `url`.
    fn navigate(&self, url: &str);

    /// Mark the current visit as a continuing browsing session.
    fn begin_browser_session(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Default,
    Granted,
    Denied,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PermissionState::Default => "default",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        })
    }
}

/// Why a permission request did not produce a result
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionRequestError {
    /// Permission is already granted; nothing to show
    AlreadyGranted,
    /// Any other failure, carried back to the caller as data
    Rejected(Value),
}

/// Native notification permission and subscription state.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    async fn notification_permission(&self) -> PermissionState;

    async fn show_http_permission_request(
        &self,
        options: Value,
    ) -> Result<Value, PermissionRequestError>;

    async fn is_showing_http_permission_request(&self) -> bool;

    fn mark_prompt_dismissed(&self);

    async fn unsubscribe_from_push(&self) -> Result<(), SdkError>;

    /// Re-show the HTTP prompt, e.g. after the user unsubscribed with permission still granted.
    async fn show_http_prompt(&self, options: Value) -> Result<(), SdkError>;

    async fn set_subscription(&self, enabled: bool) -> Result<(), SdkError>;

    /// Register the subscription a popup produced with the push service.
    async fn finish_remote_registration(&self, subscription_info: Value) -> Result<(), SdkError>;

    async fn is_push_enabled(&self) -> bool;
}

/// Sandbox applied to hidden proxy frames
pub const PROXY_FRAME_SANDBOX: &str =
    "allow-popups allow-popups-to-escape-sandbox allow-same-origin allow-scripts allow-top-navigation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Hidden helper iframe
    Proxy,
    /// Prompt iframe inside a hidden modal container
    Modal,
}

/// How to create an iframe element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub src: Url,
    pub kind: FrameKind,
    pub sandbox: Option<&'static str>,
    /// DOM id of the container the frame goes into
    pub container_id: Option<String>,
    pub hidden: bool,
}

impl FrameSpec {
    pub fn proxy(src: Url) -> Self {
        Self {
            src,
            kind: FrameKind::Proxy,
            sandbox: Some(PROXY_FRAME_SANDBOX),
            container_id: None,
            hidden: true,
        }
    }

    pub fn modal(src: Url, container_id: &str) -> Self {
        Self {
            src,
            kind: FrameKind::Modal,
            sandbox: None,
            container_id: Some(container_id.to_string()),
            hidden: true,
        }
    }
}

/// An iframe element attached to the document
pub trait FrameElement: Send + Sync {
    fn src(&self) -> Url;

    /// The frame's window, for posting into
    fn content_window(&self) -> Arc<dyn WindowTarget>;

    /// Detach from the document. Idempotent.
    fn remove(&self);

    fn is_attached(&self) -> bool;
}

/// A freshly appended frame and its one-shot native load signal
pub struct MountedFrame {
    pub element: Arc<dyn FrameElement>,
    /// Resolves when the frame fires its load event; dropped if it never will
    pub loaded: oneshot::Receiver<()>,
}

/// The DOM operations the core needs.
pub trait Document: Send + Sync {
    /// Remove every frame whose src equals `src`; returns how many were removed.
    fn remove_frames_with_src(&self, src: &Url) -> usize;

    fn append_frame(&self, spec: FrameSpec) -> MountedFrame;

    /// Append a 1x1 image element with the given id.
    fn append_pixel(&self, dom_id: &str, src: &str);

    fn remove_element(&self, dom_id: &str) -> bool;

    fn has_element(&self, dom_id: &str) -> bool;

    /// Make a hidden element visible.
    fn reveal_element(&self, dom_id: &str);
}

/// Popup window size and placement overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGeometry {
    pub child_width: i64,
    pub child_height: i64,
    pub left: i64,
    pub top: i64,
}

impl PopupGeometry {
    /// Off-screen placement used for HTTP permission requests
    pub fn offscreen() -> Self {
        Self {
            child_width: 250,
            child_height: 150,
            left: -99_999_999,
            top: 9_999_999,
        }
    }
}

/// Opens popup windows.
pub trait PopupOpener: Send + Sync {
    fn open(
        &self,
        url: &Url,
        post_data: &Map<String, Value>,
        geometry: Option<PopupGeometry>,
    ) -> Result<Arc<dyn WindowTarget>, SdkError>;
}

/// Collaborators protocol handlers delegate to
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn Storage>,
    pub platform: Arc<dyn PushPlatform>,
    pub page: Arc<dyn HostPage>,
}
