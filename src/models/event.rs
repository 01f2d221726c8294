//! 会话事件
//!
//! 事件是瞬态的：只投递给当前在线的观察者，不排队、不回放

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::question::{AnsweredQuestion, Question};

/// 事件载荷（按 type 区分的自描述记录）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Info {
        message: String,
    },
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
    /// 答题进度（index 从 1 开始）
    Progress {
        current: usize,
        total: usize,
        question: Question,
    },
    /// 终态事件（成功或失败都会发出）
    Complete {
        success: bool,
        answered: usize,
        answers: Vec<AnsweredQuestion>,
        message: String,
    },
}

/// 一条会话事件
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub session_id: String,
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl SessionEvent {
    pub fn new(session_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Local::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SessionEvent::new(
            "quiz-1",
            EventPayload::Info {
                message: "会话已创建".to_string(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "info");
        assert_eq!(json["sessionId"], "quiz-1");
        assert_eq!(json["message"], "会话已创建");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_complete_event_carries_summary() {
        let event = SessionEvent::new(
            "quiz-2",
            EventPayload::Complete {
                success: true,
                answered: 3,
                answers: Vec::new(),
                message: "完成".to_string(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["success"], true);
        assert_eq!(json["answered"], 3);
    }
}
