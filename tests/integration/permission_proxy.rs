use pushlink::collaborators::{Collaborators, PermissionRequestError};
use pushlink::context::SdkContext;
use pushlink::environment::{BuildMode, WindowRole};
use pushlink::frames::{services, HandlerDeps};
use pushlink::messenger::{Command, Messenger, OriginPattern};
use pushlink::sim::{SimHostPage, SimPushPlatform, SimWindow};
use pushlink::storage::MemoryStorage;
use serde_json::json;
use std::sync::Arc;

struct Proxied {
    _windows: (SimWindow, SimWindow),
    requester: Messenger,
    _responder: Messenger,
    platform: Arc<SimPushPlatform>,
}

fn proxied() -> Proxied {
    let popup = SimWindow::open_str("https://shop.onesignal.com/subscribe").unwrap();
    let host = SimWindow::open_str("https://shop.example/").unwrap();
    let to_host = OriginPattern::exact(&host.location()).unwrap();
    let to_popup = OriginPattern::exact(&popup.location()).unwrap();
    let requester = Messenger::new(popup.as_source(), popup.handle_to(&host), to_host.clone(), to_host).unwrap();
    let responder = Messenger::new(host.as_source(), host.handle_to(&popup), to_popup.clone(), to_popup).unwrap();

    let platform = Arc::new(SimPushPlatform::new());
    let deps = HandlerDeps {
        context: SdkContext::with_role(WindowRole::Host, BuildMode::Production),
        collaborators: Collaborators {
            storage: Arc::new(MemoryStorage::new()),
            platform: platform.clone(),
            page: Arc::new(SimHostPage::new("https://shop.example/", "Shop")),
        },
        remote_role: WindowRole::SubscriptionPopup,
    };
    services::install_permission_proxy(&responder, &deps);
    services::install_prompt_commands(&responder, &deps);
    responder.start_post_message_receive();
    requester.start_post_message_receive();
    Proxied {
        _windows: (popup, host),
        requester,
        _responder: responder,
        platform,
    }
}

#[tokio::test(start_paused = true)]
async fn permission_request_resolves_with_result() {
    let p = proxied();
    let reply = p
        .requester
        .request(Command::ShowHttpPermissionRequest, ())
        .await
        .unwrap();
    assert_eq!(reply, json!({"status": "resolve", "result": "granted"}));
}

#[tokio::test(start_paused = true)]
async fn already_granted_is_not_a_failure() {
    let p = proxied();
    p.platform
        .set_request_outcome(Err(PermissionRequestError::AlreadyGranted));

    let reply = p
        .requester
        .request(Command::ShowHttpPermissionRequest, json!({"x": 1}))
        .await
        .unwrap();

    assert_eq!(reply["status"], "resolve");
}

#[tokio::test(start_paused = true)]
async fn other_permission_failures_travel_as_data() {
    let p = proxied();
    p.platform.set_request_outcome(Err(PermissionRequestError::Rejected(json!(
        "blocked by user agent"
    ))));

    let reply = p
        .requester
        .request(Command::ShowHttpPermissionRequest, ())
        .await
        .unwrap();

    assert_eq!(
        reply,
        json!({"status": "reject", "result": "blocked by user agent"})
    );
}

#[tokio::test(start_paused = true)]
async fn showing_state_and_prompt_bookkeeping() {
    let p = proxied();
    p.platform.set_showing_request(true);

    let showing = p
        .requester
        .request(Command::IsShowingHttpPermissionRequest, ())
        .await
        .unwrap();
    let dismissed = p
        .requester
        .request(Command::MarkPromptDismissed, ())
        .await
        .unwrap();

    assert_eq!(showing, json!(true));
    assert_eq!(dismissed, json!("REMOTE_OPERATION_COMPLETE"));
    assert_eq!(p.platform.dismissals(), 1);
}

#[tokio::test(start_paused = true)]
async fn unsubscribe_reports_completion_or_rejection() {
    let p = proxied();

    let ok = p
        .requester
        .request(Command::UnsubscribeFromPush, ())
        .await
        .unwrap();
    assert_eq!(ok, json!("REMOTE_OPERATION_COMPLETE"));
    assert_eq!(p.platform.unsubscribes(), 1);

    p.platform.set_fail_unsubscribe(true);
    let failed = p
        .requester
        .request(Command::UnsubscribeFromPush, ())
        .await
        .unwrap();
    assert_eq!(failed["status"], "reject");
    assert_eq!(p.platform.unsubscribes(), 1);
}
