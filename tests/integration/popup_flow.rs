use parking_lot::Mutex;
use pushlink::environment::WindowRole;
use pushlink::events::EventKind;
use pushlink::frames::{PopupHost, PopupOptions};
use pushlink::messenger::{Command, HandlerOutcome};
use pushlink::sim::SimPopupOpener;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::integration::support::{settle, Page, RemoteSlot};

struct PopupFixture {
    host: Page,
    slot: RemoteSlot,
    opener: Arc<SimPopupOpener>,
    popup_host: PopupHost,
    seen: Arc<Mutex<Vec<Value>>>,
}

fn fixture() -> PopupFixture {
    let host = Page::host();
    let slot = RemoteSlot::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let opener = Arc::new(SimPopupOpener::new(host.window.clone()));

    let booter = slot.clone();
    let sink = Arc::clone(&seen);
    opener.on_popup_boot(move |popup, opener_window| {
        let remote = booter.boot(WindowRole::SubscriptionPopup, popup, opener_window);
        let sink = Arc::clone(&sink);
        remote.channel().on("x", move |message| {
            sink.lock().push(message.data().clone());
            HandlerOutcome::Continue
        });
    });

    let popup_host = PopupHost::new(
        host.deps(WindowRole::SubscriptionPopup),
        opener.clone(),
        host.window.as_source(),
    );
    PopupFixture {
        host,
        slot,
        opener,
        popup_host,
        seen,
    }
}

#[tokio::test(start_paused = true)]
async fn popup_begins_comms_and_host_connects() {
    let f = fixture();
    let http_initialized = Arc::new(Mutex::new(0usize));

    let messenger = f.popup_host.open(PopupOptions::default(), &Map::new()).unwrap();
    let counter = Arc::clone(&http_initialized);
    f.slot
        .get()
        .context()
        .bus()
        .on(EventKind::HttpInitialize, move |_| *counter.lock() += 1);
    settle().await;

    assert!(messenger.is_connected());
    assert!(f.slot.get().channel().is_connected());
    assert_eq!(*http_initialized.lock(), 1);

    messenger.message("x", json!({"v": 1})).unwrap();
    settle().await;
    assert_eq!(*f.seen.lock(), vec![json!({"v": 1})]);
}

#[tokio::test(start_paused = true)]
async fn popup_is_opened_with_prompt_post_data() {
    let f = fixture();
    let mut prompt = Map::new();
    prompt.insert("actionMessage".to_string(), json!("Get updates"));

    f.popup_host
        .open(
            PopupOptions {
                auto_accept: true,
                http_permission_request: true,
            },
            &prompt,
        )
        .unwrap();

    let opened = f.opener.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].url.as_str(), "https://shop.onesignal.com/subscribe");
    assert_eq!(opened[0].post_data["promptType"], "popup");
    assert_eq!(opened[0].post_data["parentHostname"], "shop.example");
    assert_eq!(opened[0].post_data["actionMessage"], "Get updates");
    assert_eq!(opened[0].post_data["autoAccept"], true);
    assert_eq!(opened[0].post_data["httpPermissionRequest"], true);
    let geometry = opened[0].geometry.unwrap();
    assert_eq!(geometry.left, -99_999_999);
}

#[tokio::test(start_paused = true)]
async fn popup_notifications_fire_host_events() {
    let f = fixture();
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&clicks);
    f.host
        .context
        .bus()
        .on(EventKind::CustomPromptClick, move |data| sink.lock().push(data.clone()));
    let loads = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&loads);
    f.host
        .context
        .bus()
        .on(EventKind::PopupLoad, move |_| *counter.lock() += 1);

    f.popup_host.open(PopupOptions::default(), &Map::new()).unwrap();
    settle().await;
    let channel = f.slot.get().channel().clone();

    assert_eq!(
        channel.request(Command::PopupLoaded, ()).await.unwrap(),
        json!("REMOTE_OPERATION_COMPLETE")
    );
    channel.request(Command::PopupAccepted, ()).await.unwrap();
    channel.request(Command::BeginBrowsingSession, ()).await.unwrap();

    assert_eq!(*loads.lock(), 1);
    assert_eq!(*clicks.lock(), vec![json!({"result": "granted"})]);
    assert_eq!(f.host.page.browser_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn remote_registration_finishes_on_host() {
    let f = fixture();
    f.host.platform.set_push_enabled(true);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    f.host
        .context
        .bus()
        .on(EventKind::SubscriptionChange, move |data| sink.lock().push(data.clone()));

    let messenger = f.popup_host.open(PopupOptions::default(), &Map::new()).unwrap();
    settle().await;
    let channel = f.slot.get().channel().clone();

    let reply = channel
        .request(
            Command::FinishRemoteRegistration,
            json!({"subscriptionInfo": {"endpoint": "https://push.example/abc"}}),
        )
        .await
        .unwrap();
    settle().await;

    assert_eq!(reply, json!({"progress": true}));
    assert!(!messenger.is_listening());
    assert_eq!(
        f.host.platform.registrations(),
        vec![json!({"endpoint": "https://push.example/abc"})]
    );
    assert_eq!(*changes.lock(), vec![json!(true)]);
}

#[tokio::test(start_paused = true)]
async fn popup_closing_destroys_host_channel() {
    let f = fixture();
    let closes = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&closes);
    f.host
        .context
        .bus()
        .on(EventKind::PopupClose, move |_| *counter.lock() += 1);

    let messenger = f.popup_host.open(PopupOptions::default(), &Map::new()).unwrap();
    settle().await;

    let ack = f
        .slot
        .get()
        .channel()
        .request(Command::PopupClosing, ())
        .await
        .unwrap();

    assert_eq!(ack, json!("REMOTE_OPERATION_COMPLETE"));
    assert!(messenger.is_destroyed());
    assert_eq!(*closes.lock(), 1);
}

#[tokio::test(start_paused = true)]
async fn blocked_popup_reports_error() {
    let f = fixture();
    f.opener.set_blocked(true);
    assert!(f.popup_host.open(PopupOptions::default(), &Map::new()).is_err());
    assert!(f.popup_host.messenger().is_none());
    assert!(!f.slot.is_booted());
}

#[tokio::test(start_paused = true)]
async fn popup_events_are_retriggered_on_host() {
    let f = fixture();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    f.host
        .context
        .bus()
        .on(EventKind::SubscriptionChange, move |data| sink.lock().push(data.clone()));

    f.popup_host.open(PopupOptions::default(), &Map::new()).unwrap();
    settle().await;
    let forwarded = f
        .slot
        .get()
        .context()
        .bus()
        .trigger(EventKind::SubscriptionChange, Some(json!(true)));
    settle().await;

    assert!(forwarded.forwarded);
    assert_eq!(*changes.lock(), vec![json!(true)]);
}
