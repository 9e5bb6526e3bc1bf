//! Engine integration tests
//!
//! End-to-end scenarios against an in-process engine. Timer behavior runs
//! under paused tokio time, so the 10 s presence timeout and 2 s typing
//! quiet window elapse instantly in wall-clock terms.
//!
//! Run with: cargo test -p integration-tests --test engine_tests

use std::time::Duration;

use integration_tests::{start_engine_with, test_config, SessionPair};
use sync_core::{MessageId, SyncEvent};
use sync_engine::{ConversationView, SyncError};

// ============================================================================
// Message Delivery Tests
// ============================================================================

#[tokio::test]
async fn test_send_reaches_both_subscribers() {
    let pair = SessionPair::connect().await.unwrap();
    let mut fs_stream = pair.fs.messages(None).await.unwrap();
    let mut mg_stream = pair.mg.messages(None).await.unwrap();

    let accepted = pair.fs.send("hello").await.unwrap();
    assert_eq!(accepted.id, MessageId::new(1));

    // Round-trip confirmation for the sender, live delivery for the peer.
    let to_fs = fs_stream.recv().await.unwrap();
    let to_mg = mg_stream.recv().await.unwrap();
    assert_eq!(to_fs, accepted);
    assert_eq!(to_mg, accepted);
    assert_eq!(to_mg.text, "hello");
    assert_eq!(to_mg.user_name.as_str(), "Fs");

    pair.close().await;
}

#[tokio::test]
async fn test_ids_are_strictly_increasing_across_senders() {
    let pair = SessionPair::connect().await.unwrap();

    let first = pair.fs.send("one").await.unwrap();
    let second = pair.mg.send("two").await.unwrap();
    let third = pair.fs.send("three").await.unwrap();

    assert!(first.id < second.id);
    assert!(second.id < third.id);

    pair.close().await;
}

#[tokio::test]
async fn test_replay_from_cursor_is_exact() {
    let pair = SessionPair::connect().await.unwrap();

    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(pair.fs.send(format!("m{i}")).await.unwrap().id);
    }

    // Everything after the third message, ascending, no gaps.
    let mut stream = pair.mg.messages(Some(ids[2])).await.unwrap();
    for expected in &ids[3..] {
        assert_eq!(stream.recv().await.unwrap().id, *expected);
    }
    assert_eq!(stream.cursor(), ids[5]);

    pair.close().await;
}

#[tokio::test]
async fn test_duplicate_sends_collapse_in_the_view() {
    let pair = SessionPair::connect().await.unwrap();
    let mut stream = pair.mg.messages(None).await.unwrap();

    // A retried send lands twice in the log with send instants 1 s apart.
    pair.fs.send("hi").await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    pair.fs.send("hi").await.unwrap();

    let mut view = ConversationView::new(pair.engine.config().duplicate_window_chrono());
    for _ in 0..2 {
        view.push(stream.recv().await.unwrap());
    }

    // The log keeps both (ground truth); the renderer shows one.
    assert_eq!(pair.engine.message_count(), 2);
    assert_eq!(view.len(), 1);
    assert_eq!(view.last().unwrap().text, "hi");

    pair.close().await;
}

#[tokio::test]
async fn test_slow_subscriber_is_dropped_and_recovers_by_resubscribing() {
    let mut config = test_config();
    config.subscriber_buffer = 4;
    let engine = start_engine_with(config);

    let fs = engine
        .connect(integration_tests::conversation(), integration_tests::fs())
        .await
        .unwrap();
    let mg = engine
        .connect(integration_tests::conversation(), integration_tests::mg())
        .await
        .unwrap();

    let mut stream = mg.messages(None).await.unwrap();
    for i in 0..32 {
        fs.send(format!("m{i}")).await.unwrap();
    }

    // Drain until the bounded queue gives out.
    let mut view = ConversationView::new(engine.config().duplicate_window_chrono());
    let cursor = loop {
        match stream.recv().await {
            Ok(message) => {
                view.push(message);
            }
            Err(SyncError::SubscriptionOverflow { skipped }) => {
                assert!(skipped > 0);
                break stream.cursor();
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    };

    // Resubscribing with the replay cursor closes the gap.
    let mut replacement = mg.resume(Some(cursor)).await.unwrap();
    while view.len() < 32 {
        view.push(replacement.recv().await.unwrap());
    }

    let texts: Vec<&str> = view.messages().iter().map(|m| m.text.as_str()).collect();
    let expected: Vec<String> = (0..32).map(|i| format!("m{i}")).collect();
    assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());

    fs.close().await;
    mg.close().await;
}

// ============================================================================
// Typing Indicator Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typing_flows_to_the_other_side_and_expires() {
    let pair = SessionPair::connect().await.unwrap();
    let mut typing = pair.fs.typing_updates();
    assert!(!typing.current());

    pair.mg.set_typing(true).await.unwrap();
    assert_eq!(typing.next().await, Some(true));

    // No further writes: the quiet window clears the flag by itself.
    let idle_from = tokio::time::Instant::now();
    assert_eq!(typing.next().await, Some(false));
    let waited = idle_from.elapsed();
    assert!(waited >= Duration::from_secs(2), "cleared after {waited:?}");
    assert!(waited <= Duration::from_millis(2300), "cleared after {waited:?}");

    pair.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_keep_renewing_the_quiet_window() {
    let pair = SessionPair::connect().await.unwrap();
    let mut typing = pair.fs.typing_updates();

    pair.mg.keystroke("h").await.unwrap();
    assert_eq!(typing.next().await, Some(true));

    // Keep typing at 1 s intervals for 4 s; each keystroke resets the window.
    for text in ["he", "hel", "hell", "hello"] {
        tokio::time::sleep(Duration::from_secs(1)).await;
        pair.mg.keystroke(text).await.unwrap();
        assert!(pair.fs.remote_typing().await);
    }

    // Then send: the flag clears immediately, not after the window.
    pair.mg.send("hello").await.unwrap();
    assert_eq!(typing.next().await, Some(false));

    pair.close().await;
}

#[tokio::test]
async fn test_emptied_text_clears_typing() {
    let pair = SessionPair::connect().await.unwrap();

    pair.mg.keystroke("h").await.unwrap();
    assert!(pair.fs.remote_typing().await);

    pair.mg.keystroke("").await.unwrap();
    assert!(!pair.fs.remote_typing().await);

    pair.close().await;
}

// ============================================================================
// Presence Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_heartbeats_outlive_the_timeout() {
    let pair = SessionPair::connect().await.unwrap();

    // Three full timeouts pass; the 5 s heartbeat keeps both online.
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(pair.fs.remote_status().await.0);
    assert!(pair.mg.remote_status().await.0);

    pair.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_silent_disconnect_expires_within_the_timeout() {
    let pair = SessionPair::connect().await.unwrap();
    let mut presence = pair.fs.presence_updates();
    assert!(presence.current());

    // Mg vanishes without an offline write (transport died).
    let vanished_at = tokio::time::Instant::now();
    drop(pair.mg);

    assert_eq!(presence.next().await, Some(false));
    let waited = vanished_at.elapsed();
    assert!(waited <= Duration::from_millis(10_200), "expired after {waited:?}");

    let (online, label) = pair.fs.remote_status().await;
    assert!(!online);
    assert_eq!(label, "offline");

    pair.fs.close().await;
}

#[tokio::test]
async fn test_explicit_offline_write_is_immediate() {
    let pair = SessionPair::connect().await.unwrap();
    let mut presence = pair.fs.presence_updates();
    assert!(presence.current());

    pair.mg.set_online(false).await.unwrap();
    assert_eq!(presence.next().await, Some(false));

    pair.mg.set_online(true).await.unwrap();
    assert_eq!(presence.next().await, Some(true));

    pair.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_resume_reasserts_presence() {
    let pair = SessionPair::connect().await.unwrap();

    // Fs's transport drops long enough for the claim to expire, but the
    // session object survives for a resume.
    pair.fs.set_online(false).await.unwrap();
    tokio::time::advance(Duration::from_secs(3)).await;
    assert!(!pair.mg.remote_status().await.0);

    let mut stream = pair.fs.resume(None).await.unwrap();
    assert!(pair.mg.remote_status().await.0);

    // The resumed stream replays history.
    pair.mg.send("welcome back").await.unwrap();
    assert_eq!(stream.recv().await.unwrap().text, "welcome back");

    pair.close().await;
}

// ============================================================================
// Event Feed Tests
// ============================================================================

#[tokio::test]
async fn test_event_feed_carries_all_change_kinds() {
    let pair = SessionPair::connect().await.unwrap();
    let mut feed = pair.engine.events();

    pair.fs.send("hello").await.unwrap();
    pair.mg.set_typing(true).await.unwrap();
    pair.mg.set_online(false).await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(feed.recv().await.unwrap().event_type());
    }
    assert!(seen.contains(&"MESSAGE_ACCEPTED"));
    assert!(seen.contains(&"TYPING_CHANGED"));
    assert!(seen.contains(&"PRESENCE_CHANGED"));

    pair.close().await;
}

#[tokio::test]
async fn test_events_serialize_for_the_wire() {
    let pair = SessionPair::connect().await.unwrap();
    let mut feed = pair.engine.events();

    pair.fs.send("hello").await.unwrap();

    let event = feed.recv().await.unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "MESSAGE_ACCEPTED");
    assert_eq!(json["id"], "1");
    assert_eq!(json["userName"], "Fs");

    let parsed: SyncEvent = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.event_type(), "MESSAGE_ACCEPTED");

    pair.close().await;
}
