//! HTTP 接口层
//!
//! 职责刻意收窄：解析请求、套默认值、校验、创建会话后立即返回。
//! 流水线在后台任务里运行，进度通过 `/api/events` 的 SSE 流观察。

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::info;

use crate::config::Config;
use crate::models::SessionConfig;
use crate::orchestrator::{EventBroadcaster, QuizSession, SessionRegistry};

/// HTTP 层共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: SessionRegistry,
    pub broadcaster: EventBroadcaster,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            broadcaster: EventBroadcaster::new(),
            started_at: Instant::now(),
        }
    }
}

/// 启动会话请求体
///
/// 可选字段缺省时落到进程配置的默认值
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizRequest {
    #[serde(default)]
    pub reasoning_api_key: String,
    #[serde(default)]
    pub target_url: String,
    pub auth_entry_url: Option<String>,
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub delay_min_secs: Option<f64>,
    pub delay_max_secs: Option<f64>,
    pub headless: Option<bool>,
    pub auto_submit: Option<bool>,
}

impl StartQuizRequest {
    /// 套上进程默认值，得到完整的会话配置
    pub fn into_session_config(self, defaults: &Config) -> SessionConfig {
        SessionConfig {
            reasoning_api_key: self.reasoning_api_key,
            target_url: self.target_url,
            auth_entry_url: self.auth_entry_url,
            identity: self.identity,
            secret: self.secret,
            delay_min_secs: self.delay_min_secs.unwrap_or(defaults.default_delay_min_secs),
            delay_max_secs: self.delay_max_secs.unwrap_or(defaults.default_delay_max_secs),
            headless: self.headless.unwrap_or(defaults.default_headless),
            auto_submit: self.auto_submit.unwrap_or(false),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/quiz/start", post(start_quiz))
        .route("/api/health", get(health))
        .route("/api/events", get(events))
        .with_state(state)
}

/// 创建并启动一个答题会话
///
/// 校验通过即返回会话 ID，不等待流水线结束
async fn start_quiz(
    State(state): State<AppState>,
    Json(request): Json<StartQuizRequest>,
) -> impl IntoResponse {
    let session_config = request.into_session_config(&state.config);
    if let Err(reason) = session_config.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })));
    }

    let session = QuizSession::new(
        session_config,
        state.config.clone(),
        state.registry.clone(),
        state.broadcaster.clone(),
    );
    let session_id = session.id().to_string();
    info!("📥 接受会话请求: {}", session_id);

    tokio::spawn(session.run());

    (StatusCode::OK, Json(json!({ "sessionId": session_id })))
}

/// 健康检查
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "activeSessions": state.registry.snapshot_size(),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}

/// 事件流（SSE）
///
/// 连接后只收到后续事件，掉队的观察者丢弃最旧事件后继续
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Event::default().json_data(&event).ok().map(Ok),
        // 掉队导致的 Lagged 直接跳过，继续接后续事件
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_applies_process_defaults() {
        let request: StartQuizRequest = serde_json::from_str(
            r#"{"reasoningApiKey": "sk-test", "targetUrl": "https://x.example/quiz/1"}"#,
        )
        .unwrap();
        let defaults = Config::default();
        let config = request.into_session_config(&defaults);

        assert_eq!(config.delay_min_secs, defaults.default_delay_min_secs);
        assert_eq!(config.delay_max_secs, defaults.default_delay_max_secs);
        assert_eq!(config.headless, defaults.default_headless);
        assert!(!config.auto_submit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let request: StartQuizRequest = serde_json::from_str(
            r#"{
                "reasoningApiKey": "sk-test",
                "targetUrl": "https://x.example/quiz/1",
                "identity": "student",
                "secret": "p@ss",
                "delayMinSecs": 0.5,
                "delayMaxSecs": 0.8,
                "headless": false,
                "autoSubmit": true
            }"#,
        )
        .unwrap();
        let config = request.into_session_config(&Config::default());

        assert_eq!(config.delay_min_secs, 0.5);
        assert_eq!(config.delay_max_secs, 0.8);
        assert!(!config.headless);
        assert!(config.auto_submit);
        assert!(config.wants_authentication());
    }

    #[test]
    fn test_missing_required_fields_fail_validation() {
        let request: StartQuizRequest = serde_json::from_str(r#"{}"#).unwrap();
        let config = request.into_session_config(&Config::default());
        assert!(config.validate().is_err());
    }
}
