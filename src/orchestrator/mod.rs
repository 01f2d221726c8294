//! 编排层
//!
//! 管理进程级状态与会话生命周期：
//! - `registry` - 活跃会话注册表（启动登记 / 终态注销）
//! - `broadcaster` - 事件广播器（即时扇出，不回放）
//! - `quiz_session` - 单个答题会话的阶段状态机

pub mod broadcaster;
pub mod quiz_session;
pub mod registry;

pub use broadcaster::EventBroadcaster;
pub use quiz_session::{QuizSession, SessionStage};
pub use registry::{SessionEntry, SessionRegistry};
