use parking_lot::Mutex;
use pushlink::collaborators::PermissionState;
use pushlink::environment::WindowRole;
use pushlink::events::EventKind;
use pushlink::frames::FrameLifecycle;
use pushlink::messenger::Command;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use crate::integration::support::{settle, Page, RemoteSlot};

async fn connected_frame() -> (Page, RemoteSlot, FrameLifecycle) {
    let host = Page::host();
    let slot = RemoteSlot::new();
    let booter = slot.clone();
    host.document.on_frame_boot(move |frame, parent| {
        booter.boot(WindowRole::ProxyFrame, frame, parent);
    });
    let lifecycle = FrameLifecycle::new(
        &Url::parse("https://shop.os.tc").unwrap(),
        Arc::clone(&host.context),
        host.collaborators(),
        host.document.clone(),
        host.window.as_source(),
    );
    lifecycle.load().await.unwrap();
    (host, slot, lifecycle)
}

fn record(page: &Page, kind: EventKind) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    page.context.bus().on(kind, move |data| sink.lock().push(data.clone()));
    seen
}

#[tokio::test(start_paused = true)]
async fn allow_listed_event_reaches_host_with_legacy_alias() {
    let (host, slot, _lifecycle) = connected_frame().await;
    let changes = record(&host, EventKind::SubscriptionChange);
    let legacy = record(&host, EventKind::LegacySubscriptionChanged);

    let triggered = slot
        .get()
        .context()
        .bus()
        .trigger(EventKind::SubscriptionChange, Some(json!(true)));
    settle().await;

    assert!(triggered.forwarded);
    assert_eq!(*changes.lock(), vec![json!(true)]);
    assert_eq!(*legacy.lock(), vec![json!(true)]);
}

#[tokio::test(start_paused = true)]
async fn event_outside_allow_list_stays_local() {
    let (host, slot, lifecycle) = connected_frame().await;
    let clicks = record(&host, EventKind::CustomPromptClick);
    let remote = slot.get();
    let local_clicks = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&local_clicks);
    remote
        .context()
        .bus()
        .on(EventKind::CustomPromptClick, move |_| *counter.lock() += 1);

    let before = host_received_retriggers(&host);
    let triggered = remote
        .context()
        .bus()
        .trigger(EventKind::CustomPromptClick, Some(json!({"result": "granted"})));
    settle().await;

    assert!(!triggered.forwarded);
    assert_eq!(*local_clicks.lock(), 1);
    assert!(clicks.lock().is_empty());
    assert_eq!(host_received_retriggers(&host), before);
    assert!(lifecycle.messenger().is_some());
}

fn host_received_retriggers(host: &Page) -> usize {
    host.window
        .received()
        .iter()
        .filter(|e| e.data["command"] == "RETRIGGER_EVENT")
        .count()
}

#[tokio::test(start_paused = true)]
async fn unknown_retriggered_name_is_dropped() {
    let (host, slot, _lifecycle) = connected_frame().await;
    let changes = record(&host, EventKind::SubscriptionChange);

    slot.get()
        .channel()
        .message(
            Command::RetriggerEvent,
            json!({"eventName": "notAnEvent", "eventData": 1}),
        )
        .unwrap();
    slot.get()
        .channel()
        .message(
            Command::RetriggerEvent,
            json!({"eventName": "subscriptionChange", "eventData": false}),
        )
        .unwrap();
    settle().await;

    assert_eq!(host_received_retriggers(&host), 2);
    assert_eq!(*changes.lock(), vec![json!(false)]);
}

#[tokio::test(start_paused = true)]
async fn permission_change_is_stored_and_announced_once() {
    let (host, slot, _lifecycle) = connected_frame().await;
    let changes = record(&host, EventKind::NotificationPermissionChange);
    host.platform.set_permission(PermissionState::Granted);
    let channel = slot.get().channel().clone();

    channel
        .message(Command::RemoteNotificationPermissionChanged, json!({}))
        .unwrap();
    settle().await;
    channel
        .message(Command::RemoteNotificationPermissionChanged, json!({}))
        .unwrap();
    settle().await;
    channel
        .message(
            Command::RemoteNotificationPermissionChanged,
            json!({"forceUpdatePermission": true}),
        )
        .unwrap();
    settle().await;

    assert_eq!(
        *changes.lock(),
        vec![json!({"to": "granted"}), json!({"to": "granted"})]
    );
}

#[tokio::test(start_paused = true)]
async fn remote_initialize_is_never_forwarded() {
    let (host, slot, _lifecycle) = connected_frame().await;
    let before = host_received_retriggers(&host);

    let triggered = slot
        .get()
        .context()
        .bus()
        .trigger(EventKind::SdkInitialized, None);
    settle().await;

    assert!(triggered.suppressed);
    assert!(!triggered.forwarded);
    assert_eq!(host_received_retriggers(&host), before);
}
