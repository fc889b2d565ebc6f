//! Command vocabulary shared by every browsing context.
//!
//! The wire strings are a contract between contexts that may run different
//! SDK versions; never rename them.

use std::fmt;

/// Reply payload signalling that a remote operation finished
pub const REMOTE_OPERATION_COMPLETE: &str = "REMOTE_OPERATION_COMPLETE";

/// A named operation carried inside a message envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Connected,
    RetriggerEvent,
    IframePopupInitialize,
    RemoteDatabaseGet,
    RemoteDatabasePut,
    RemoteDatabaseRemove,
    RemoteNotificationPermission,
    RemoteNotificationPermissionChanged,
    ShowHttpPermissionRequest,
    IsShowingHttpPermissionRequest,
    UnsubscribeFromPush,
    MarkPromptDismissed,
    RequestHostUrl,
    ServiceWorkerCommandRedirect,
    HttpPermissionRequestResubscribe,
    // Popup only
    PopupBeginMessageportComms,
    PopupLoaded,
    PopupAccepted,
    PopupRejected,
    PopupClosing,
    BeginBrowsingSession,
    WindowTimeout,
    FinishRemoteRegistration,
    // Modal only
    ModalPromptLoaded,
    ModalPromptAccepted,
    ModalPromptRejected,
    /// Application-defined command outside the SDK vocabulary
    Custom(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Connected => "CONNECTED",
            Command::RetriggerEvent => "RETRIGGER_EVENT",
            Command::IframePopupInitialize => "IFRAME_POPUP_INITIALIZE",
            Command::RemoteDatabaseGet => "REMOTE_DATABASE_GET",
            Command::RemoteDatabasePut => "REMOTE_DATABASE_PUT",
            Command::RemoteDatabaseRemove => "REMOTE_DATABASE_REMOVE",
            Command::RemoteNotificationPermission => "REMOTE_NOTIFICATION_PERMISSION",
            Command::RemoteNotificationPermissionChanged => "REMOTE_NOTIFICATION_PERMISSION_CHANGED",
            Command::ShowHttpPermissionRequest => "SHOW_HTTP_PERMISSION_REQUEST",
            Command::IsShowingHttpPermissionRequest => "IS_SHOWING_HTTP_PERMISSION_REQUEST",
            Command::UnsubscribeFromPush => "UNSUBSCRIBE_FROM_PUSH",
            Command::MarkPromptDismissed => "MARK_PROMPT_DISMISSED",
            Command::RequestHostUrl => "REQUEST_HOST_URL",
            Command::ServiceWorkerCommandRedirect => "SERVICEWORKER_COMMAND_REDIRECT",
            Command::HttpPermissionRequestResubscribe => "HTTP_PERMISSION_REQUEST_RESUBSCRIBE",
            Command::PopupBeginMessageportComms => "POPUP_BEGIN_MESSAGEPORT_COMMS",
            Command::PopupLoaded => "POPUP_LOADED",
            Command::PopupAccepted => "POPUP_ACCEPTED",
            Command::PopupRejected => "POPUP_REJECTED",
            Command::PopupClosing => "POPUP_CLOSING",
            Command::BeginBrowsingSession => "BEGIN_BROWSING_SESSION",
            Command::WindowTimeout => "WINDOW_TIMEOUT",
            Command::FinishRemoteRegistration => "FINISH_REMOTE_REGISTRATION",
            Command::ModalPromptLoaded => "MODAL_PROMPT_LOADED",
            Command::ModalPromptAccepted => "MODAL_PROMPT_ACCEPTED",
            Command::ModalPromptRejected => "MODAL_PROMPT_REJECTED",
            Command::Custom(name) => name,
        }
    }

    /// Commands dispatched even before the connect handshake completes
    pub fn is_handshake_exempt(&self) -> bool {
        matches!(self, Command::Connected | Command::PopupBeginMessageportComms)
    }

    /// One-way notifications the receiver acknowledges with
    /// [`REMOTE_OPERATION_COMPLETE`] unless a handler takes over the reply
    pub fn expects_ack(&self) -> bool {
        matches!(
            self,
            Command::PopupLoaded
                | Command::PopupAccepted
                | Command::PopupRejected
                | Command::PopupClosing
                | Command::BeginBrowsingSession
                | Command::WindowTimeout
                | Command::ModalPromptLoaded
                | Command::ModalPromptAccepted
                | Command::ModalPromptRejected
        )
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        match name {
            "CONNECTED" => Command::Connected,
            "RETRIGGER_EVENT" => Command::RetriggerEvent,
            "IFRAME_POPUP_INITIALIZE" => Command::IframePopupInitialize,
            "REMOTE_DATABASE_GET" => Command::RemoteDatabaseGet,
            "REMOTE_DATABASE_PUT" => Command::RemoteDatabasePut,
            "REMOTE_DATABASE_REMOVE" => Command::RemoteDatabaseRemove,
            "REMOTE_NOTIFICATION_PERMISSION" => Command::RemoteNotificationPermission,
            "REMOTE_NOTIFICATION_PERMISSION_CHANGED" => Command::RemoteNotificationPermissionChanged,
            "SHOW_HTTP_PERMISSION_REQUEST" => Command::ShowHttpPermissionRequest,
            "IS_SHOWING_HTTP_PERMISSION_REQUEST" => Command::IsShowingHttpPermissionRequest,
            "UNSUBSCRIBE_FROM_PUSH" => Command::UnsubscribeFromPush,
            "MARK_PROMPT_DISMISSED" => Command::MarkPromptDismissed,
            "REQUEST_HOST_URL" => Command::RequestHostUrl,
            "SERVICEWORKER_COMMAND_REDIRECT" => Command::ServiceWorkerCommandRedirect,
            "HTTP_PERMISSION_REQUEST_RESUBSCRIBE" => Command::HttpPermissionRequestResubscribe,
            "POPUP_BEGIN_MESSAGEPORT_COMMS" => Command::PopupBeginMessageportComms,
            "POPUP_LOADED" => Command::PopupLoaded,
            "POPUP_ACCEPTED" => Command::PopupAccepted,
            "POPUP_REJECTED" => Command::PopupRejected,
            "POPUP_CLOSING" => Command::PopupClosing,
            "BEGIN_BROWSING_SESSION" => Command::BeginBrowsingSession,
            "WINDOW_TIMEOUT" => Command::WindowTimeout,
            "FINISH_REMOTE_REGISTRATION" => Command::FinishRemoteRegistration,
            "MODAL_PROMPT_LOADED" => Command::ModalPromptLoaded,
            "MODAL_PROMPT_ACCEPTED" => Command::ModalPromptAccepted,
            "MODAL_PROMPT_REJECTED" => Command::ModalPromptRejected,
            other => Command::Custom(other.to_string()),
        }
    }
}

impl From<String> for Command {
    fn from(name: String) -> Self {
        Command::from(name.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
