//! # Quiz Auto Answer
//!
//! 浏览器驱动的自动答题会话服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 浏览器进程的启动与参数
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `BrowserSession` - 唯一的 page owner，提供 goto / eval 能力
//! - `element_locator` - 有序能力探测 + 可见性判定 + 标记回找
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `extractor` - 页面题目结构提取与题型分类
//! - `prompt` / `answer_parser` - 提示词构建与回答解析
//! - `ReasoningClient` - 推理服务调用能力
//! - `injector` - 答案写回页面能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionFlow` - 流程编排（prompt → 推理 → 延迟 → 注入）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/quiz_session` - 单个会话的阶段状态机，管理浏览器生命周期
//! - `orchestrator/registry` - 活跃会话注册表
//! - `orchestrator/broadcaster` - 会话事件的即时扇出
//!
//! ### ⑤ 接口层（API）
//! - `api/` - HTTP 路由（启动会话 / 健康检查 / SSE 事件流）
//!
//! ## 模块结构

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use browser::launch_browser;
pub use config::Config;
pub use error::SessionError;
pub use infrastructure::BrowserSession;
pub use models::{AnsweredQuestion, Question, QuestionKind, SessionConfig, SessionEvent};
pub use orchestrator::{EventBroadcaster, QuizSession, SessionRegistry};
pub use workflow::QuestionFlow;
