//! Builder helpers for constructing outbound messages.

use chrono::Utc;

use super::types::{OutboundMessage, StudentSummary};

/// Build the `student-list` seed sent to a newly registered admin.
pub fn build_student_list(students: &[StudentSummary]) -> OutboundMessage {
    OutboundMessage::StudentList {
        students: students.to_vec(),
    }
}

/// Build a `student-joined` event.
pub fn build_student_joined(student_id: &str, student_name: &str) -> OutboundMessage {
    OutboundMessage::StudentJoined {
        student_id: student_id.to_string(),
        student_name: student_name.to_string(),
    }
}

/// Build a `student-left` event.
pub fn build_student_left(student_id: &str) -> OutboundMessage {
    OutboundMessage::StudentLeft {
        student_id: student_id.to_string(),
    }
}

/// Build a forwarded `screen-frame`, stamping receive time when the
/// student supplied none.
pub fn build_screen_frame(
    student_id: String,
    frame: serde_json::Value,
    timestamp: Option<i64>,
) -> OutboundMessage {
    OutboundMessage::ScreenFrame {
        student_id,
        frame,
        timestamp: timestamp.unwrap_or_else(|| Utc::now().timestamp_millis()),
    }
}

/// Build an `exam-terminated` notice. Blank reasons fall back to `default_reason`.
pub fn build_exam_terminated(reason: Option<String>, default_reason: &str) -> OutboundMessage {
    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| default_reason.to_string());
    OutboundMessage::ExamTerminated { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_terminated_defaults_blank_reason() {
        let msg = build_exam_terminated(Some("  ".to_string()), "Ended by proctor");
        assert_eq!(
            msg,
            OutboundMessage::ExamTerminated {
                reason: "Ended by proctor".to_string()
            }
        );
    }

    #[test]
    fn test_exam_terminated_keeps_given_reason() {
        let msg = build_exam_terminated(Some("test".to_string()), "Ended by proctor");
        assert_eq!(
            msg,
            OutboundMessage::ExamTerminated {
                reason: "test".to_string()
            }
        );
    }

    #[test]
    fn test_screen_frame_keeps_client_timestamp() {
        let msg = build_screen_frame("s1".to_string(), serde_json::json!("f"), Some(1000));
        assert!(matches!(msg, OutboundMessage::ScreenFrame { timestamp: 1000, .. }));
    }

    #[test]
    fn test_screen_frame_stamps_missing_timestamp() {
        let before = Utc::now().timestamp_millis();
        let msg = build_screen_frame("s1".to_string(), serde_json::json!("f"), None);
        match msg {
            OutboundMessage::ScreenFrame { timestamp, .. } => assert!(timestamp >= before),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
