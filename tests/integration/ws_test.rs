//! Integration tests for the relay over real WebSocket connections.

mod helpers;

use serde_json::json;

use proctor_core::config::AppConfig;
use proctor_realtime::RelayClient;
use proctor_realtime::message::{InboundMessage, OutboundMessage, StudentSummary};

use helpers::{TestApp, assert_silent, next_event};

fn frame(student_id: &str, timestamp: Option<i64>) -> InboundMessage {
    InboundMessage::ScreenFrame {
        student_id: student_id.to_string(),
        frame: json!("data:image/jpeg;base64,AAAA"),
        timestamp,
    }
}

fn terminate(student_id: &str, reason: Option<&str>) -> InboundMessage {
    InboundMessage::TerminateExam {
        student_id: student_id.to_string(),
        reason: reason.map(str::to_string),
    }
}

#[tokio::test]
async fn test_exam_session_end_to_end() {
    let app = TestApp::spawn().await;

    let (mut admin, list) = app.admin().await;
    assert_eq!(list, OutboundMessage::StudentList { students: vec![] });

    let mut alice = app.student("s1", "Alice").await;
    assert_eq!(
        next_event(&mut admin).await,
        OutboundMessage::StudentJoined {
            student_id: "s1".to_string(),
            student_name: "Alice".to_string(),
        }
    );

    alice.send(&frame("s1", Some(1000))).await.expect("send frame");
    assert_eq!(
        next_event(&mut admin).await,
        OutboundMessage::ScreenFrame {
            student_id: "s1".to_string(),
            frame: json!("data:image/jpeg;base64,AAAA"),
            timestamp: 1000,
        }
    );

    admin
        .send(&terminate("s1", Some("test")))
        .await
        .expect("send terminate");
    assert_eq!(
        next_event(&mut alice).await,
        OutboundMessage::ExamTerminated {
            reason: "test".to_string()
        }
    );

    alice.close().await.expect("close");
    assert_eq!(
        next_event(&mut admin).await,
        OutboundMessage::StudentLeft {
            student_id: "s1".to_string()
        }
    );
    app.wait_for_student("s1", false).await;
}

#[tokio::test]
async fn test_late_admin_receives_roster_in_registration_order() {
    let app = TestApp::spawn().await;
    let _bob = app.student("s2", "Bob").await;
    let _alice = app.student("s1", "Alice").await;

    let (_admin, list) = app.admin().await;

    assert_eq!(
        list,
        OutboundMessage::StudentList {
            students: vec![
                StudentSummary {
                    id: "s2".to_string(),
                    name: "Bob".to_string()
                },
                StudentSummary {
                    id: "s1".to_string(),
                    name: "Alice".to_string()
                },
            ]
        }
    );
}

#[tokio::test]
async fn test_frames_reach_every_admin_and_no_student() {
    let app = TestApp::spawn().await;
    let (mut a1, _) = app.admin().await;
    let (mut a2, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;
    let mut bob = app.student("s2", "Bob").await;
    for admin in [&mut a1, &mut a2] {
        next_event(admin).await;
        next_event(admin).await;
    }

    alice.send(&frame("s1", Some(42))).await.expect("send frame");

    for admin in [&mut a1, &mut a2] {
        assert!(matches!(
            next_event(admin).await,
            OutboundMessage::ScreenFrame { timestamp: 42, .. }
        ));
    }
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_frame_without_timestamp_is_stamped() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;
    next_event(&mut admin).await;

    alice.send(&frame("s1", None)).await.expect("send frame");

    match next_event(&mut admin).await {
        OutboundMessage::ScreenFrame { timestamp, .. } => assert!(timestamp > 0),
        other => panic!("expected screen-frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_messages_keep_connection_open() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;
    next_event(&mut admin).await;

    admin.send_raw("not json at all").await.expect("send");
    admin
        .send_raw(r#"{"type":"screen-frame","frame":"x"}"#)
        .await
        .expect("send");
    admin
        .send_raw(r#"{"type":"no-such-message"}"#)
        .await
        .expect("send");

    // Messages on one connection are handled in order, so once this lands
    // the three above have been processed.
    admin
        .send(&terminate("s1", Some("still here")))
        .await
        .expect("send terminate");
    assert_eq!(
        next_event(&mut alice).await,
        OutboundMessage::ExamTerminated {
            reason: "still here".to_string()
        }
    );
    assert_eq!(app.state.relay.metrics.snapshot().messages_malformed, 2);

    alice.send(&frame("s1", Some(5))).await.expect("send frame");
    assert!(matches!(
        next_event(&mut admin).await,
        OutboundMessage::ScreenFrame { timestamp: 5, .. }
    ));
}

#[tokio::test]
async fn test_terminate_unknown_student_is_a_no_op() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;
    next_event(&mut admin).await;

    admin
        .send(&terminate("ghost", None))
        .await
        .expect("send terminate");

    assert_silent(&mut alice).await;
    assert_silent(&mut admin).await;
    assert_eq!(app.state.relay.registry.student_count().await, 1);
}

#[tokio::test]
async fn test_terminate_without_reason_uses_default() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;

    admin.send(&terminate("s1", None)).await.expect("send");

    assert_eq!(
        next_event(&mut alice).await,
        OutboundMessage::ExamTerminated {
            reason: "Exam terminated by proctor".to_string()
        }
    );
}

#[tokio::test]
async fn test_explicit_leave_matches_disconnect() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let mut alice = app.student("s1", "Alice").await;
    next_event(&mut admin).await;

    alice
        .send(&InboundMessage::StudentLeft {
            student_id: "s1".to_string(),
        })
        .await
        .expect("send leave");

    assert_eq!(
        next_event(&mut admin).await,
        OutboundMessage::StudentLeft {
            student_id: "s1".to_string()
        }
    );
    app.wait_for_student("s1", false).await;

    // Already gone from the registry: closing produces no second notice.
    alice.close().await.expect("close");
    assert_silent(&mut admin).await;
}

#[tokio::test]
async fn test_reregistration_routes_to_newest_connection() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;
    let first = app.student("s1", "Alice").await;
    next_event(&mut admin).await;

    let mut second = app.connect().await;
    second
        .register_student("s1", "Alice")
        .await
        .expect("register");
    assert!(matches!(
        next_event(&mut admin).await,
        OutboundMessage::StudentJoined { .. }
    ));

    // The orphaned first connection closing must not evict the second.
    first.close().await.expect("close");
    assert_silent(&mut admin).await;
    assert_eq!(app.state.relay.registry.student_count().await, 1);

    admin
        .send(&terminate("s1", Some("bye")))
        .await
        .expect("send");
    assert_eq!(
        next_event(&mut second).await,
        OutboundMessage::ExamTerminated {
            reason: "bye".to_string()
        }
    );
}

#[tokio::test]
async fn test_closed_admin_is_dropped_and_others_keep_receiving() {
    let app = TestApp::spawn().await;
    let (mut staying, _) = app.admin().await;
    let (leaving, _) = app.admin().await;
    leaving.close().await.expect("close");

    let mut alice = app.student("s1", "Alice").await;
    assert!(matches!(
        next_event(&mut staying).await,
        OutboundMessage::StudentJoined { .. }
    ));
    alice.send(&frame("s1", Some(7))).await.expect("send");
    assert!(matches!(
        next_event(&mut staying).await,
        OutboundMessage::ScreenFrame { timestamp: 7, .. }
    ));

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while app.state.relay.registry.admin_count().await != 1 {
        assert!(tokio::time::Instant::now() < deadline, "closed admin lingered");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_admin_key_gates_admin_registration() {
    let mut config = AppConfig::default();
    config.relay.admin_key = Some("secret".to_string());
    let app = TestApp::spawn_with(config).await;

    let mut anonymous = app.connect().await;
    anonymous.register_admin().await.expect("send");
    assert_silent(&mut anonymous).await;

    let mut keyed = RelayClient::connect(&format!("{}?token=secret", app.ws_url()))
        .await
        .expect("connect");
    keyed.register_admin().await.expect("send");
    assert_eq!(
        next_event(&mut keyed).await,
        OutboundMessage::StudentList { students: vec![] }
    );

    // Students are unaffected by the key.
    let _alice = app.student("s1", "Alice").await;
    assert!(matches!(
        next_event(&mut keyed).await,
        OutboundMessage::StudentJoined { .. }
    ));
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let app = TestApp::spawn().await;
    let (mut admin, _) = app.admin().await;

    app.state.relay.shutdown().await;

    let closed = tokio::time::timeout(std::time::Duration::from_secs(5), admin.next_event())
        .await
        .expect("connection should close");
    assert!(matches!(closed, Ok(None) | Err(_)));
    assert_eq!(app.state.relay.registry.admin_count().await, 0);
}
