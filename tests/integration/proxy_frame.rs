use parking_lot::Mutex;
use pushlink::collaborators::Storage;
use pushlink::environment::WindowRole;
use pushlink::error::SdkError;
use pushlink::events::EventKind;
use pushlink::frames::{FrameLifecycle, FrameState};
use pushlink::messenger::Command;
use pushlink::sim::LoadBehavior;
use pushlink::storage::{remote::RemoteStorage, OPTIONS_TABLE};
use serde_json::json;
use std::sync::Arc;
use url::Url;

use crate::integration::support::{settle, Page, RemoteSlot, APP_ID, HOST_URL};

const SERVICE_ORIGIN: &str = "https://shop.os.tc";

/// Host page whose proxy frames boot a remote context when they load
fn host_with_frame_boot() -> (Page, RemoteSlot, FrameLifecycle) {
    let host = Page::host();
    let slot = RemoteSlot::new();
    let booter = slot.clone();
    host.document.on_frame_boot(move |frame, parent| {
        booter.boot(WindowRole::ProxyFrame, frame, parent);
    });
    let lifecycle = FrameLifecycle::new(
        &Url::parse(SERVICE_ORIGIN).unwrap(),
        Arc::clone(&host.context),
        host.collaborators(),
        host.document.clone(),
        host.window.as_source(),
    );
    (host, slot, lifecycle)
}

fn count_events(page: &Page, kind: EventKind) -> Arc<Mutex<Vec<serde_json::Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    page.context.bus().on(kind, move |data| sink.lock().push(data.clone()));
    seen
}

#[tokio::test(start_paused = true)]
async fn load_connects_initializes_and_fires_initialize_once() {
    let (host, slot, lifecycle) = host_with_frame_boot();
    let initialized = count_events(&host, EventKind::SdkInitialized);

    lifecycle.load().await.unwrap();

    assert_eq!(lifecycle.state(), FrameState::Connected);
    assert!(host.context.is_ready());
    assert_eq!(initialized.lock().len(), 1);
    assert_eq!(host.document.attached_frames(lifecycle.url()), 1);

    let remote = slot.get();
    assert!(remote.context().is_ready());
    let options = remote.context().init_options();
    assert_eq!(options["appId"], APP_ID);
    assert_eq!(options["subdomainName"], "shop");
    assert_eq!(options["pageUrl"], HOST_URL);
    assert_eq!(options["origin"], "https://shop.example");

    let stored_default = slot.storage.get(OPTIONS_TABLE, "defaultUrl").await.unwrap();
    assert_eq!(stored_default, Some(json!("https://shop.example")));
    let last_known = slot.storage.get(OPTIONS_TABLE, "lastKnownHostUrl").await.unwrap();
    assert_eq!(last_known, Some(json!(HOST_URL)));
}

#[tokio::test(start_paused = true)]
async fn reload_replaces_frame_without_refiring_initialize() {
    let (host, _slot, lifecycle) = host_with_frame_boot();
    let initialized = count_events(&host, EventKind::SdkInitialized);

    lifecycle.load().await.unwrap();
    let first = lifecycle.messenger().unwrap();
    lifecycle.load().await.unwrap();

    assert!(first.is_destroyed());
    assert_eq!(host.document.attached_frames(lifecycle.url()), 1);
    assert_eq!(initialized.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn existing_default_url_is_kept() {
    let (_host, slot, lifecycle) = host_with_frame_boot();
    slot.storage
        .put(OPTIONS_TABLE, json!({"key": "defaultUrl", "value": "https://landing.example"}))
        .await
        .unwrap();

    lifecycle.load().await.unwrap();

    let stored_default = slot.storage.get(OPTIONS_TABLE, "defaultUrl").await.unwrap();
    assert_eq!(stored_default, Some(json!("https://landing.example")));
}

#[tokio::test(start_paused = true)]
async fn unreachable_frame_times_out_without_channel() {
    let (host, slot, lifecycle) = host_with_frame_boot();
    host.document.set_load_behavior(LoadBehavior::Never);
    let initialized = count_events(&host, EventKind::SdkInitialized);

    let err = lifecycle.load().await.unwrap_err();

    assert!(matches!(err, SdkError::Timeout { after_ms: 5_000, .. }));
    assert!(lifecycle.messenger().is_none());
    assert!(!slot.is_booted());
    assert_eq!(lifecycle.state(), FrameState::Disposed);
    assert_eq!(host.document.attached_frames(lifecycle.url()), 0);
    assert!(initialized.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_load_after_manual_fire_completes() {
    let (host, slot, lifecycle) = host_with_frame_boot();
    host.document.set_load_behavior(LoadBehavior::Manual);
    let url = lifecycle.url().clone();
    let document = host.document.clone();

    let loading = lifecycle.load();
    let fire = async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(document.fire_load(&url));
    };
    let (result, ()) = tokio::join!(loading, fire);

    result.unwrap();
    assert!(slot.is_booted());
}

#[tokio::test(start_paused = true)]
async fn host_reads_and_writes_frame_storage() {
    let (_host, slot, lifecycle) = host_with_frame_boot();
    lifecycle.load().await.unwrap();

    let remote = RemoteStorage::new(lifecycle.messenger().unwrap());
    remote
        .put("Ids", json!({"type": "userId", "id": "u-1"}))
        .await
        .unwrap();
    assert_eq!(remote.get("Ids", "userId").await.unwrap(), Some(json!("u-1")));
    assert_eq!(slot.storage.get("Ids", "userId").await.unwrap(), Some(json!("u-1")));

    remote.remove("Ids", "userId").await.unwrap();
    assert_eq!(remote.get("Ids", "userId").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn frame_asks_host_for_page_state() {
    let (host, slot, lifecycle) = host_with_frame_boot();
    lifecycle.load().await.unwrap();
    let channel = slot.get().channel().clone();

    let href = channel.request(Command::RequestHostUrl, ()).await.unwrap();
    assert_eq!(href, json!(HOST_URL));

    let permission = channel
        .request(Command::RemoteNotificationPermission, ())
        .await
        .unwrap();
    assert_eq!(permission, json!("default"));

    channel
        .message(Command::ServiceWorkerCommandRedirect, "https://shop.example/welcome")
        .unwrap();
    channel
        .message(Command::HttpPermissionRequestResubscribe, ())
        .unwrap();
    settle().await;
    assert_eq!(host.page.navigations(), vec!["https://shop.example/welcome"]);
    assert_eq!(host.platform.prompts().len(), 1);
    assert_eq!(host.platform.prompts()[0]["__useHttpPermissionRequestStyle"], true);
}

#[tokio::test(start_paused = true)]
async fn dispose_tears_down_frame_and_channel() {
    let (host, _slot, lifecycle) = host_with_frame_boot();
    lifecycle.load().await.unwrap();
    let messenger = lifecycle.messenger().unwrap();

    lifecycle.dispose();
    lifecycle.dispose();

    assert!(messenger.is_destroyed());
    assert!(lifecycle.messenger().is_none());
    assert_eq!(host.document.attached_frames(lifecycle.url()), 0);
    assert!(matches!(
        lifecycle.request(Command::RequestHostUrl, ()).await,
        Err(SdkError::NotConnected)
    ));
}
