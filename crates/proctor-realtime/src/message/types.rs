//! Inbound and outbound WebSocket message type definitions.
//!
//! Every message is a JSON object tagged by `type` (kebab-case) with
//! camelCase fields. Frame payloads are carried as opaque JSON values and
//! are never inspected by the relay.

use serde::{Deserialize, Serialize};

/// Messages sent by students and admins to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Classify this connection as a proctor.
    RegisterAdmin,
    /// Classify this connection as a student.
    #[serde(rename_all = "camelCase")]
    RegisterStudent {
        /// Client-asserted student identity.
        student_id: String,
        /// Display name shown to proctors.
        student_name: String,
    },
    /// A captured screen frame to forward to every proctor.
    #[serde(rename_all = "camelCase")]
    ScreenFrame {
        /// Student the frame belongs to.
        student_id: String,
        /// Encoded image payload, forwarded untouched.
        frame: serde_json::Value,
        /// Capture time in milliseconds since the Unix epoch.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    /// The student is leaving the exam.
    #[serde(rename_all = "camelCase")]
    StudentLeft {
        /// Departing student.
        student_id: String,
    },
    /// A proctor ends a student's exam.
    #[serde(rename_all = "camelCase")]
    TerminateExam {
        /// Target student.
        student_id: String,
        /// Reason shown to the student.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Any `type` the relay does not recognise. Ignored.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Wire name of this message's `type`, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterAdmin => "register-admin",
            Self::RegisterStudent { .. } => "register-student",
            Self::ScreenFrame { .. } => "screen-frame",
            Self::StudentLeft { .. } => "student-left",
            Self::TerminateExam { .. } => "terminate-exam",
            Self::Unknown => "unknown",
        }
    }
}

/// Messages sent by the relay to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Students present when an admin registered. Admin only.
    StudentList {
        /// Registered students in registration order.
        students: Vec<StudentSummary>,
    },
    /// A student registered. Admins only.
    #[serde(rename_all = "camelCase")]
    StudentJoined {
        /// Student identity.
        student_id: String,
        /// Display name.
        student_name: String,
    },
    /// A forwarded screen frame. Admins only.
    #[serde(rename_all = "camelCase")]
    ScreenFrame {
        /// Student the frame belongs to.
        student_id: String,
        /// Encoded image payload exactly as the student sent it.
        frame: serde_json::Value,
        /// Capture time in milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// A student left or disconnected. Admins only.
    #[serde(rename_all = "camelCase")]
    StudentLeft {
        /// Departed student.
        student_id: String,
    },
    /// The proctor ended this student's exam. Targeted student only.
    ExamTerminated {
        /// Reason supplied by the proctor (or the relay default).
        reason: String,
    },
    /// A message type this client build does not know.
    #[serde(other)]
    Unknown,
}

/// One entry of a `student-list` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    /// Student identity.
    pub id: String,
    /// Display name.
    pub name: String,
}
