//! Commands a host answers for the proxy frame it created.

use super::HandlerDeps;
use crate::collaborators::PermissionState;
use crate::events::{EventKind, RetriggerPayload};
use crate::messenger::{Command, HandlerId, HandlerOutcome, Messenger};
use crate::storage::OPTIONS_TABLE;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionChanged {
    #[serde(default)]
    force_update_permission: bool,
}

pub fn install(messenger: &Messenger, deps: &HandlerDeps) -> Vec<HandlerId> {
    vec![
        install_retrigger(messenger, deps),
        install_permission_changed(messenger, deps),
        install_request_host_url(messenger, deps),
        install_redirect(messenger, deps),
        install_resubscribe(messenger, deps),
    ]
}

/// Re-fire events a remote context forwarded, labelled with its role
pub(crate) fn install_retrigger(messenger: &Messenger, deps: &HandlerDeps) -> HandlerId {
    let deps = deps.clone();
    messenger.on(Command::RetriggerEvent, move |message| {
        let payload: RetriggerPayload = match message.data_as() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Dropping malformed retrigger payload: {}", e);
                return HandlerOutcome::Handled;
            }
        };
        match EventKind::from_name(&payload.event_name) {
            Some(kind) => {
                let source = payload.source_role.unwrap_or(deps.remote_role);
                deps.context
                    .bus()
                    .trigger_remote(kind, payload.event_data, source);
            }
            None => debug!(
                "Dropping retriggered event with unknown name {:?}",
                payload.event_name
            ),
        }
        HandlerOutcome::Handled
    })
}

fn install_permission_changed(messenger: &Messenger, deps: &HandlerDeps) -> HandlerId {
    let deps = deps.clone();
    messenger.on(Command::RemoteNotificationPermissionChanged, move |message| {
        let force = message
            .data_as::<PermissionChanged>()
            .unwrap_or_default()
            .force_update_permission;
        let deps = deps.clone();
        tokio::spawn(async move {
            let permission = deps.collaborators.platform.notification_permission().await;
            let storage = &deps.collaborators.storage;
            let stored = match storage.get(OPTIONS_TABLE, "notificationPermission").await {
                Ok(stored) => stored.and_then(|v| serde_json::from_value::<PermissionState>(v).ok()),
                Err(e) => {
                    warn!("Could not read the stored notification permission: {}", e);
                    None
                }
            };
            if !force && stored == Some(permission) {
                return;
            }
            let record = json!({"key": "notificationPermission", "value": permission});
            if let Err(e) = storage.put(OPTIONS_TABLE, record).await {
                warn!("Could not store the notification permission: {}", e);
            }
            deps.context.bus().trigger(
                EventKind::NotificationPermissionChange,
                Some(json!({"to": permission})),
            );
        });
        HandlerOutcome::Handled
    })
}

fn install_request_host_url(messenger: &Messenger, deps: &HandlerDeps) -> HandlerId {
    let page = deps.collaborators.page.clone();
    messenger.on(Command::RequestHostUrl, move |message| {
        message.reply(page.location_href());
        HandlerOutcome::Handled
    })
}

fn install_redirect(messenger: &Messenger, deps: &HandlerDeps) -> HandlerId {
    let page = deps.collaborators.page.clone();
    messenger.on(Command::ServiceWorkerCommandRedirect, move |message| {
        match message.data() {
            Value::String(url) => page.navigate(url),
            other => debug!("Ignoring redirect without a URL: {}", other),
        }
        HandlerOutcome::Handled
    })
}

fn install_resubscribe(messenger: &Messenger, deps: &HandlerDeps) -> HandlerId {
    let platform = deps.collaborators.platform.clone();
    messenger.on(Command::HttpPermissionRequestResubscribe, move |_| {
        debug!("(Reposted from iFrame -> Host) Showing HTTP permission request.");
        let platform = platform.clone();
        tokio::spawn(async move {
            let options = json!({"__sdkCall": true, "__useHttpPermissionRequestStyle": true});
            if let Err(e) = platform.show_http_prompt(options).await {
                debug!("Failed to show HTTP permission request: {}", e);
            }
        });
        HandlerOutcome::Handled
    })
}
