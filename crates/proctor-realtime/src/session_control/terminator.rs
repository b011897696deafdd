//! Exam termination requested by a proctor.

use tracing::info;

use crate::connection::handle::DeliveryError;
use crate::message::builder;
use crate::metrics::RelayMetrics;

use super::broadcast::Broadcaster;

/// Sends `exam-terminated` to the student registered under `student_id`.
///
/// An absent or unreachable student is logged and otherwise ignored; the
/// requesting admin gets no failure signal. Returns whether the notice was
/// enqueued.
pub async fn terminate_exam(
    broadcaster: &Broadcaster,
    metrics: &RelayMetrics,
    student_id: &str,
    reason: Option<String>,
    default_reason: &str,
) -> bool {
    let message = builder::build_exam_terminated(reason, default_reason);

    let delivered = match broadcaster.to_student(student_id, &message).await {
        Ok(()) => {
            info!(student_id = %student_id, "Exam termination delivered");
            true
        }
        Err(DeliveryError::NotRegistered) => {
            info!(student_id = %student_id, "Termination requested for student not found or disconnected");
            false
        }
        Err(e) => {
            info!(student_id = %student_id, error = %e, "Termination notice not delivered");
            false
        }
    };

    metrics.termination(delivered);
    delivered
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connection::handle::ConnectionHandle;
    use crate::registry::Registry;

    #[tokio::test]
    async fn test_terminate_registered_student() {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(RelayMetrics::new());
        let broadcaster = Broadcaster::new(registry.clone(), metrics.clone());
        let (student, mut rx) = ConnectionHandle::channel(4, None);
        registry.register_student("s1", "Alice", &student).await;

        let delivered =
            terminate_exam(&broadcaster, &metrics, "s1", Some("test".into()), "default").await;

        assert!(delivered);
        assert_eq!(
            rx.recv().await.as_deref(),
            Some(r#"{"type":"exam-terminated","reason":"test"}"#)
        );
    }

    #[tokio::test]
    async fn test_terminate_missing_student_is_noop() {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(RelayMetrics::new());
        let broadcaster = Broadcaster::new(registry, metrics.clone());

        assert!(!terminate_exam(&broadcaster, &metrics, "ghost", None, "default").await);
        assert_eq!(metrics.snapshot().terminations_missed, 1);
    }
}
