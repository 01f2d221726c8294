//! 会话注册表 - 编排层
//!
//! 进程级状态 + 显式生命周期：会话启动时插入，到达终态时删除。
//! 在进程启动时构造一次，按引用传给需要的组件，绝不做环境全局变量。
//! 多个会话可能在同一瞬间启动/结束，访问必须经过互斥锁。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing::debug;

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// 注册表中的会话条目
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: String,
    pub target_url: String,
    pub started_at: DateTime<Local>,
}

/// 会话注册表
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 生成会话标识
    ///
    /// 纳秒时间戳 + 进程内单调序号，进程内绝不重复
    pub fn next_session_id(&self) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
        format!("quiz-{}-{}", nanos, seq)
    }

    /// 注册新会话
    pub fn register(&self, entry: SessionEntry) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        debug!("注册会话: {}", entry.id);
        map.insert(entry.id.clone(), entry);
    }

    /// 注销会话（成功或失败的终态都会调用）
    pub fn unregister(&self, session_id: &str) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let removed = map.remove(session_id).is_some();
        debug!("注销会话: {} (存在: {})", session_id, removed);
        removed
    }

    /// 当前活跃会话数量（健康检查用）
    pub fn snapshot_size(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(session_id)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(registry: &SessionRegistry, target: &str) -> SessionEntry {
        SessionEntry {
            id: registry.next_session_id(),
            target_url: target.to_string(),
            started_at: Local::now(),
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.next_session_id();
        let b = registry.next_session_id();
        let c = registry.next_session_id();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_three_sessions_then_remove_one() {
        let registry = SessionRegistry::new();
        let e1 = entry(&registry, "https://a.example/quiz/1");
        let e2 = entry(&registry, "https://b.example/quiz/2");
        let e3 = entry(&registry, "https://c.example/quiz/3");
        let id2 = e2.id.clone();

        registry.register(e1.clone());
        registry.register(e2);
        registry.register(e3.clone());
        assert_eq!(registry.snapshot_size(), 3);

        // 完成一个只移除那一个
        assert!(registry.unregister(&id2));
        assert_eq!(registry.snapshot_size(), 2);
        assert!(registry.contains(&e1.id));
        assert!(registry.contains(&e3.id));
        assert!(!registry.contains(&id2));
    }

    #[test]
    fn test_unregister_missing_returns_false() {
        let registry = SessionRegistry::new();
        assert!(!registry.unregister("quiz-does-not-exist"));
    }
}
