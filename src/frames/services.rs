//! Protocol responders.
//!
//! Each responder answers one request command with exactly one reply once
//! its collaborator work settles. Application failures travel back as
//! `{status: "reject", result}` payloads.

use super::HandlerDeps;
use crate::collaborators::PermissionRequestError;
use crate::messenger::{Command, HandlerId, HandlerOutcome, IncomingMessage, Messenger, REMOTE_OPERATION_COMPLETE};
use crate::storage::remote::{rejection, Insertion, Removal, Retrieval};
use crate::storage::OPTIONS_TABLE;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

/// Payload of `IFRAME_POPUP_INITIALIZE`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePayload {
    #[serde(default)]
    pub host_init_options: Value,
    #[serde(default)]
    pub default_url: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
}

impl InitializePayload {
    /// Host options, overlaid by the receiver's own, overlaid by the page fields
    pub fn merge_over(&self, own_options: &Value) -> Value {
        let mut merged = Map::new();
        for source in [&self.host_init_options, own_options] {
            if let Value::Object(fields) = source {
                merged.extend(fields.clone());
            }
        }
        for (field, value) in [
            ("defaultUrl", &self.default_url),
            ("pageUrl", &self.page_url),
            ("pageTitle", &self.page_title),
        ] {
            if let Some(value) = value {
                merged.insert(field.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(merged)
    }
}

/// Everything a remote context answers for its creator
pub fn install_all(messenger: &Messenger, deps: &HandlerDeps, own_options: Value) -> Vec<HandlerId> {
    let mut ids = vec![install_config_handshake(messenger, deps, own_options)];
    ids.extend(install_storage_proxy(messenger, deps));
    ids.extend(install_permission_proxy(messenger, deps));
    ids.extend(install_prompt_commands(messenger, deps));
    ids
}

/// `IFRAME_POPUP_INITIALIZE`: adopt the creator's options and persist page URLs
pub fn install_config_handshake(
    messenger: &Messenger,
    deps: &HandlerDeps,
    own_options: Value,
) -> HandlerId {
    let deps = deps.clone();
    messenger.on(Command::IframePopupInitialize, move |message| {
        info!(
            "({}) The iFrame has just received initOptions from the host page!",
            deps.context.role()
        );
        let payload: InitializePayload = match message.data_as() {
            Ok(payload) => payload,
            Err(e) => {
                message.reply(rejection(e));
                return HandlerOutcome::Handled;
            }
        };
        let merged = payload.merge_over(&own_options);
        deps.context.set_init_options(merged.clone());

        let deps = deps.clone();
        let message = message.clone();
        tokio::spawn(async move {
            let storage = &deps.collaborators.storage;
            let mut failures = Vec::new();

            if merged.get("continuePressed").and_then(Value::as_bool) == Some(true) {
                if let Err(e) = deps.collaborators.platform.set_subscription(true).await {
                    failures.push(e.to_string());
                }
            }

            let default_origin = payload
                .default_url
                .as_deref()
                .and_then(|u| Url::parse(u).ok())
                .map(|u| u.origin().ascii_serialization());
            match storage.get(OPTIONS_TABLE, "defaultUrl").await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if let Some(origin) = default_origin {
                        let record = json!({"key": "defaultUrl", "value": origin});
                        if let Err(e) = storage.put(OPTIONS_TABLE, record).await {
                            failures.push(e.to_string());
                        }
                    }
                }
                Err(e) => failures.push(e.to_string()),
            }

            if let Some(page_url) = &payload.page_url {
                let record = json!({"key": "lastKnownHostUrl", "value": page_url});
                if let Err(e) = storage.put(OPTIONS_TABLE, record).await {
                    failures.push(e.to_string());
                }
            }

            if failures.is_empty() {
                deps.context.mark_ready();
                message.reply(REMOTE_OPERATION_COMPLETE);
            } else {
                warn!("Initialization side effects failed: {}", failures.join("; "));
                message.reply(rejection(failures.join("; ")));
            }
        });
        HandlerOutcome::Handled
    })
}

/// `REMOTE_DATABASE_GET` / `PUT` / `REMOVE`
pub fn install_storage_proxy(messenger: &Messenger, deps: &HandlerDeps) -> Vec<HandlerId> {
    let get = {
        let deps = deps.clone();
        messenger.on(Command::RemoteDatabaseGet, move |message| {
            let Some(retrievals) = parse_batch::<Retrieval>(message) else {
                return HandlerOutcome::Handled;
            };
            let storage = deps.collaborators.storage.clone();
            let message = message.clone();
            tokio::spawn(async move {
                // join_all yields in input order whatever order the lookups settle in
                let lookups = retrievals
                    .iter()
                    .map(|r| storage.get(&r.table, &r.key));
                let mut results = Vec::with_capacity(retrievals.len());
                for outcome in join_all(lookups).await {
                    match outcome {
                        Ok(value) => results.push(value.unwrap_or(Value::Null)),
                        Err(e) => {
                            message.reply(rejection(e));
                            return;
                        }
                    }
                }
                message.reply(results);
            });
            HandlerOutcome::Handled
        })
    };

    let put = {
        let deps = deps.clone();
        messenger.on(Command::RemoteDatabasePut, move |message| {
            let Some(insertions) = parse_batch::<Insertion>(message) else {
                return HandlerOutcome::Handled;
            };
            let storage = deps.collaborators.storage.clone();
            let message = message.clone();
            tokio::spawn(async move {
                let writes = insertions
                    .into_iter()
                    .map(|i| {
                        let storage = storage.clone();
                        async move { storage.put(&i.table, i.keypath).await }
                    });
                reply_completion(&message, join_all(writes).await);
            });
            HandlerOutcome::Handled
        })
    };

    let remove = {
        let deps = deps.clone();
        messenger.on(Command::RemoteDatabaseRemove, move |message| {
            let Some(removals) = parse_batch::<Removal>(message) else {
                return HandlerOutcome::Handled;
            };
            let storage = deps.collaborators.storage.clone();
            let message = message.clone();
            tokio::spawn(async move {
                let deletes = removals.into_iter().map(|r| {
                    let storage = storage.clone();
                    async move {
                        let key = r.key()?;
                        storage.remove(&r.table, &key).await
                    }
                });
                reply_completion(&message, join_all(deletes).await);
            });
            HandlerOutcome::Handled
        })
    };

    vec![get, put, remove]
}

/// Permission query and HTTP permission request
pub fn install_permission_proxy(messenger: &Messenger, deps: &HandlerDeps) -> Vec<HandlerId> {
    let query = {
        let deps = deps.clone();
        messenger.on(Command::RemoteNotificationPermission, move |message| {
            let platform = deps.collaborators.platform.clone();
            let message = message.clone();
            tokio::spawn(async move {
                message.reply(platform.notification_permission().await);
            });
            HandlerOutcome::Handled
        })
    };

    let request = {
        let deps = deps.clone();
        messenger.on(Command::ShowHttpPermissionRequest, move |message| {
            debug!(
                "({}) Calling showHttpPermissionRequest(), proxied from the other context",
                deps.context.role()
            );
            let options = match message.data() {
                Value::Null => json!({}),
                data => data.clone(),
            };
            let platform = deps.collaborators.platform.clone();
            let message = message.clone();
            tokio::spawn(async move {
                match platform.show_http_permission_request(options).await {
                    Ok(result) => message.reply(json!({"status": "resolve", "result": result})),
                    Err(PermissionRequestError::AlreadyGranted) => {
                        debug!("Permission already granted; not showing the HTTP permission request");
                        message.reply(json!({"status": "resolve", "result": "granted"}));
                    }
                    Err(PermissionRequestError::Rejected(reason)) => {
                        message.reply(json!({"status": "reject", "result": reason}))
                    }
                }
            });
            HandlerOutcome::Handled
        })
    };

    let showing = {
        let deps = deps.clone();
        messenger.on(Command::IsShowingHttpPermissionRequest, move |message| {
            let platform = deps.collaborators.platform.clone();
            let message = message.clone();
            tokio::spawn(async move {
                message.reply(platform.is_showing_http_permission_request().await);
            });
            HandlerOutcome::Handled
        })
    };

    vec![query, request, showing]
}

/// Prompt bookkeeping and unsubscribe
pub fn install_prompt_commands(messenger: &Messenger, deps: &HandlerDeps) -> Vec<HandlerId> {
    let dismissed = {
        let deps = deps.clone();
        messenger.on(Command::MarkPromptDismissed, move |message| {
            debug!("(Reposted from iFrame -> Host) Marking prompt as dismissed.");
            deps.collaborators.platform.mark_prompt_dismissed();
            message.reply(REMOTE_OPERATION_COMPLETE);
            HandlerOutcome::Handled
        })
    };

    let unsubscribe = {
        let deps = deps.clone();
        messenger.on(Command::UnsubscribeFromPush, move |message| {
            debug!("({}) Received the unsubscribe from push command", deps.context.role());
            let platform = deps.collaborators.platform.clone();
            let message = message.clone();
            tokio::spawn(async move {
                match platform.unsubscribe_from_push().await {
                    Ok(()) => message.reply(REMOTE_OPERATION_COMPLETE),
                    Err(e) => {
                        debug!("Failed to unsubscribe from push remotely: {}", e);
                        message.reply(rejection(e));
                    }
                }
            });
            HandlerOutcome::Handled
        })
    };

    vec![dismissed, unsubscribe]
}

fn parse_batch<T: serde::de::DeserializeOwned>(message: &IncomingMessage) -> Option<Vec<T>> {
    match message.data_as::<Vec<T>>() {
        Ok(batch) => Some(batch),
        Err(e) => {
            debug!(command = %message.command(), "Malformed batch: {}", e);
            message.reply(rejection(e));
            None
        }
    }
}

fn reply_completion<E: std::fmt::Display>(message: &IncomingMessage, outcomes: Vec<Result<(), E>>) {
    match outcomes.into_iter().find_map(Result::err) {
        None => message.reply(REMOTE_OPERATION_COMPLETE),
        Some(e) => message.reply(rejection(e)),
    }
}
