use parking_lot::Mutex;
use pushlink::error::SdkError;
use pushlink::messenger::{HandlerOutcome, MessageEnvelope, Messenger, OriginPattern, WindowTarget};
use pushlink::sim::SimWindow;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::support::settle;

/// Two windows on different origins with a channel bound in each direction
fn pair() -> (SimWindow, SimWindow, Messenger, Messenger) {
    let host = SimWindow::open_str("https://shop.example/").unwrap();
    let frame = SimWindow::open_str("https://shop.os.tc/webPushIframe").unwrap();
    let to_frame = OriginPattern::exact(&frame.location()).unwrap();
    let to_host = OriginPattern::exact(&host.location()).unwrap();
    let host_side = Messenger::new(
        host.as_source(),
        host.handle_to(&frame),
        to_frame.clone(),
        to_frame,
    )
    .unwrap();
    let frame_side = Messenger::new(
        frame.as_source(),
        frame.handle_to(&host),
        to_host.clone(),
        to_host,
    )
    .unwrap();
    (host, frame, host_side, frame_side)
}

fn connect_requests(window: &SimWindow) -> usize {
    window
        .sent()
        .iter()
        .filter(|m| m["command"] == "CONNECTED" && m["isReply"] == false)
        .count()
}

#[tokio::test(start_paused = true)]
async fn handshake_sends_connect_once_and_connects_both_sides() {
    let (host, _frame, host_side, frame_side) = pair();
    frame_side.listen();

    host_side.connect().unwrap();
    host_side.connect().unwrap();
    settle().await;
    host_side.connect().unwrap();
    settle().await;

    assert!(host_side.is_connected());
    assert!(frame_side.is_connected());
    assert_eq!(connect_requests(&host), 1);
    host_side.wait_connected().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn messages_sent_before_handshake_are_held_until_connect() {
    let (_host, _frame, host_side, frame_side) = pair();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    frame_side.on("greeting", move |message| {
        sink.lock().push((message.data().clone(), message.channel().is_connected()));
        HandlerOutcome::Continue
    });
    frame_side.listen();
    host_side.start_post_message_receive();

    host_side.message("greeting", json!({"n": 1})).unwrap();
    settle().await;
    assert!(seen.lock().is_empty());

    host_side.connect().unwrap();
    settle().await;
    assert_eq!(*seen.lock(), vec![(json!({"n": 1}), true)]);
}

#[tokio::test(start_paused = true)]
async fn messages_from_other_origins_never_reach_handlers() {
    let (_host, frame, _host_side, frame_side) = pair();
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    frame_side.on("steal", move |_| {
        *counter.lock() += 1;
        HandlerOutcome::Continue
    });
    frame_side.start_post_message_receive();

    let evil = SimWindow::open_str("https://evil.example/").unwrap();
    let envelope = serde_json::to_value(MessageEnvelope::request(&"steal".into(), Value::Null)).unwrap();
    evil.handle_to(&frame)
        .post_message(envelope.clone(), &OriginPattern::Any);
    frame.post_from("https://shop.example.evil.test", envelope.clone());
    frame.post_from("null", envelope);
    settle().await;

    assert_eq!(*calls.lock(), 0);
    assert_eq!(frame.received().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn replies_resolve_their_own_requests_out_of_order() {
    let (_host, _frame, host_side, frame_side) = pair();
    frame_side.on("slow", |message| {
        let message = message.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            message.reply("slow answer");
        });
        HandlerOutcome::Handled
    });
    frame_side.on("fast", |message| {
        message.reply(json!({"echo": message.data().clone()}));
        HandlerOutcome::Handled
    });
    frame_side.start_post_message_receive();
    host_side.start_post_message_receive();

    let slow = host_side.request("slow", ());
    let fast = host_side.request("fast", 7);
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), json!("slow answer"));
    assert_eq!(fast.unwrap(), json!({"echo": 7}));
    assert_eq!(host_side.pending_replies(), 0);
}

#[tokio::test(start_paused = true)]
async fn reply_is_sent_at_most_once() {
    let (_host, frame, host_side, frame_side) = pair();
    frame_side.on("twice", |message| {
        message.reply(1);
        message.reply(2);
        HandlerOutcome::Handled
    });
    frame_side.start_post_message_receive();
    host_side.start_post_message_receive();

    assert_eq!(host_side.request("twice", ()).await.unwrap(), json!(1));
    let replies = frame
        .sent()
        .iter()
        .filter(|m| m["command"] == "twice" && m["isReply"] == true)
        .count();
    assert_eq!(replies, 1);
}

#[tokio::test(start_paused = true)]
async fn popup_notifications_are_acknowledged_automatically() {
    let (_host, _frame, host_side, frame_side) = pair();
    let loaded = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&loaded);
    host_side.once("POPUP_LOADED", move |_| {
        *flag.lock() = true;
        HandlerOutcome::Continue
    });
    host_side.start_post_message_receive();
    frame_side.start_post_message_receive();

    let ack = frame_side.request("POPUP_LOADED", ()).await.unwrap();
    assert_eq!(ack, json!("REMOTE_OPERATION_COMPLETE"));
    assert!(*loaded.lock());
}

#[tokio::test(start_paused = true)]
async fn once_handler_runs_for_first_message_only() {
    let (_host, _frame, host_side, frame_side) = pair();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    frame_side.once("ping", move |message| {
        sink.lock().push(message.data().clone());
        HandlerOutcome::Continue
    });
    frame_side.start_post_message_receive();
    assert_eq!(frame_side.handler_count(&"ping".into()), 1);

    host_side.message("ping", 1).unwrap();
    host_side.message("ping", 2).unwrap();
    settle().await;

    assert_eq!(*calls.lock(), vec![json!(1)]);
    assert_eq!(frame_side.handler_count(&"ping".into()), 0);
}

#[tokio::test(start_paused = true)]
async fn handled_outcome_suppresses_acknowledgement() {
    let (host, frame, host_side, frame_side) = pair();
    let loaded = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&loaded);
    host_side.on("POPUP_LOADED", move |_| {
        *counter.lock() += 1;
        HandlerOutcome::Handled
    });
    host_side.start_post_message_receive();
    frame_side.start_post_message_receive();

    frame_side.message("POPUP_LOADED", ()).unwrap();
    settle().await;

    assert_eq!(*loaded.lock(), 1);
    assert!(host.sent().is_empty());
    assert!(frame.received().is_empty());
}

#[tokio::test(start_paused = true)]
async fn destroy_abandons_pending_requests() {
    let (_host, _frame, host_side, frame_side) = pair();
    frame_side.start_post_message_receive();
    host_side.start_post_message_receive();

    let unanswered = host_side.request("nobody-handles-this", ());
    settle().await;
    host_side.destroy();
    host_side.destroy();

    assert!(matches!(unanswered.await, Err(SdkError::ChannelDestroyed)));
    assert!(matches!(host_side.message("late", ()), Err(SdkError::ChannelDestroyed)));
    assert!(matches!(host_side.connect(), Err(SdkError::ChannelDestroyed)));
}

#[tokio::test]
async fn wildcard_receive_origin_is_refused() {
    let host = SimWindow::open_str("https://shop.example/").unwrap();
    let frame = SimWindow::open_str("https://shop.os.tc/").unwrap();
    let result = Messenger::new(
        host.as_source(),
        host.handle_to(&frame),
        OriginPattern::Any,
        OriginPattern::Any,
    );
    assert!(matches!(result, Err(SdkError::UntrustedOrigin)));
}
