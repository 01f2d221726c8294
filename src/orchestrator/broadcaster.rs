//! 事件广播器 - 编排层
//!
//! 进程级发布点：事件在发出瞬间扇出给所有在线观察者。
//! 不排队、不持久化、不回放，晚连接的观察者收不到更早的事件；
//! 投递是尽力而为，观察者掉线不会影响发出事件的会话。

use tokio::sync::broadcast;

use crate::models::{AnsweredQuestion, EventPayload, Question, SessionEvent};

/// 广播通道容量（慢观察者超过后丢弃最旧事件）
const CHANNEL_CAPACITY: usize = 256;

/// 事件广播器
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// 订阅后续所有事件
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// 发出一条事件（没有观察者时静默丢弃）
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn info(&self, session_id: &str, message: impl Into<String>) {
        self.emit(SessionEvent::new(
            session_id,
            EventPayload::Info {
                message: message.into(),
            },
        ));
    }

    pub fn warning(&self, session_id: &str, message: impl Into<String>) {
        self.emit(SessionEvent::new(
            session_id,
            EventPayload::Warning {
                message: message.into(),
            },
        ));
    }

    pub fn error(&self, session_id: &str, message: impl Into<String>) {
        self.emit(SessionEvent::new(
            session_id,
            EventPayload::Error {
                message: message.into(),
            },
        ));
    }

    /// 答题进度（current 从 1 开始）
    pub fn progress(&self, session_id: &str, current: usize, total: usize, question: &Question) {
        self.emit(SessionEvent::new(
            session_id,
            EventPayload::Progress {
                current,
                total,
                question: question.clone(),
            },
        ));
    }

    /// 终态事件（成功与失败都会发出）
    pub fn complete(
        &self,
        session_id: &str,
        success: bool,
        answers: Vec<AnsweredQuestion>,
        message: impl Into<String>,
    ) {
        self.emit(SessionEvent::new(
            session_id,
            EventPayload::Complete {
                success,
                answered: answers.len(),
                answers,
                message: message.into(),
            },
        ));
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.info("quiz-1", "开始");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id, "quiz-1");
        assert!(matches!(event.payload, EventPayload::Info { .. }));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_panic() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.error("quiz-1", "没有人在听");
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let broadcaster = EventBroadcaster::new();
        // 先保持一个订阅者，确保事件真的被发送
        let mut early = broadcaster.subscribe();
        broadcaster.info("quiz-1", "早期事件");

        let mut late = broadcaster.subscribe();
        broadcaster.info("quiz-1", "后续事件");

        // 早订阅者两条都收到
        assert!(early.recv().await.is_ok());
        assert!(early.recv().await.is_ok());

        // 晚订阅者只收到后续事件
        let event = late.recv().await.unwrap();
        match event.payload {
            EventPayload::Info { message } => assert_eq!(message, "后续事件"),
            other => panic!("意外的事件: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_subscribers() {
        let broadcaster = EventBroadcaster::new();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        broadcaster.warning("quiz-2", "注意");

        assert_eq!(rx1.recv().await.unwrap().session_id, "quiz-2");
        assert_eq!(rx2.recv().await.unwrap().session_id, "quiz-2");
    }
}
