//! 答题会话 - 编排层
//!
//! 严格线性的阶段状态机：
//!
//! `created → initializing → authenticating(可选) → locating-quiz →
//!  extracting → answering(×N) → submitting(可选) → completed`
//!
//! 任何阶段的不可恢复错误都直接转入 failed。除登录阶段显式的一次重试外，
//! 不会回退到更早的阶段。无论终态是成功还是失败：
//! - 浏览器句柄无条件释放
//! - 注册表条目被移除
//! - 发出 complete 终态事件

use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::infrastructure::{element_locator, BrowserSession, MatchRule};
use crate::models::{AnsweredQuestion, Question, SessionConfig};
use crate::orchestrator::broadcaster::EventBroadcaster;
use crate::orchestrator::registry::{SessionEntry, SessionRegistry};
use crate::services::extractor;
use crate::workflow::QuestionFlow;

/// 定位输入框的超时（每条规则）
const FIELD_TIMEOUT: Duration = Duration::from_secs(5);
/// 定位按钮的超时（每条规则）
const BUTTON_TIMEOUT: Duration = Duration::from_secs(3);
/// 等待登录跳转的超时
const LOGIN_NAV_TIMEOUT: Duration = Duration::from_secs(10);
/// 等待进入测验页面的超时
const QUIZ_NAV_TIMEOUT: Duration = Duration::from_secs(8);

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Created,
    Initializing,
    Authenticating,
    LocatingQuiz,
    Extracting,
    Answering,
    Submitting,
    Completed,
    Failed,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStage::Created => "created",
            SessionStage::Initializing => "initializing",
            SessionStage::Authenticating => "authenticating",
            SessionStage::LocatingQuiz => "locating-quiz",
            SessionStage::Extracting => "extracting",
            SessionStage::Answering => "answering",
            SessionStage::Submitting => "submitting",
            SessionStage::Completed => "completed",
            SessionStage::Failed => "failed",
        }
    }
}

/// 一次端到端的答题会话
///
/// 整个生命周期独占一个浏览器句柄；题目列表和作答记录都归它所有
pub struct QuizSession {
    id: String,
    config: SessionConfig,
    app_config: Config,
    registry: SessionRegistry,
    events: EventBroadcaster,
    answers: Vec<AnsweredQuestion>,
}

impl QuizSession {
    /// 创建会话并登记到注册表
    ///
    /// 配置校验应在调用前完成（HTTP 层拒绝非法请求）
    pub fn new(
        config: SessionConfig,
        app_config: Config,
        registry: SessionRegistry,
        events: EventBroadcaster,
    ) -> Self {
        let id = registry.next_session_id();
        registry.register(SessionEntry {
            id: id.clone(),
            target_url: config.target_url.clone(),
            started_at: Local::now(),
        });
        Self {
            id,
            config,
            app_config,
            registry,
            events,
            answers: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 运行整条流水线直到终态
    ///
    /// 不支持中途取消：要么跑完，要么因致命错误直接进入收尾
    pub async fn run(mut self) {
        info!("[会话 {}] 🚀 流水线启动: {}", self.id, self.config.target_url);
        self.events.info(&self.id, "会话已创建，流水线启动");

        let result = self.execute().await;

        match result {
            Ok(()) => {
                let answered = self
                    .answers
                    .iter()
                    .filter(|a| a.outcome.is_answered())
                    .count();
                info!(
                    "[会话 {}] ✅ 会话完成: 成功 {}/{} 道题",
                    self.id,
                    answered,
                    self.answers.len()
                );
                self.stage_event(SessionStage::Completed);
                self.events.complete(
                    &self.id,
                    true,
                    self.answers.clone(),
                    format!("会话完成，共作答 {} 道题", self.answers.len()),
                );
            }
            Err(e) => {
                error!("[会话 {}] ❌ 会话失败: {:#}", self.id, e);
                self.stage_event(SessionStage::Failed);
                self.events.error(&self.id, format!("会话失败: {:#}", e));
                self.events.complete(
                    &self.id,
                    false,
                    self.answers.clone(),
                    format!("会话失败: {:#}", e),
                );
            }
        }

        // 终态统一注销，成功失败一视同仁
        self.registry.unregister(&self.id);
    }

    /// 获取浏览器句柄并运行各阶段；句柄在两条路径上都保证释放
    async fn execute(&mut self) -> Result<()> {
        self.stage_event(SessionStage::Initializing);
        let session = BrowserSession::launch(self.config.headless)
            .await
            .map_err(|e| SessionError::Setup(format!("{:#}", e)))?;

        let outcome = self.run_stages(&session).await;
        if outcome.is_err() {
            self.capture_failure_screenshot(&session).await;
        }
        session.close().await;
        outcome
    }

    /// 失败时留一张页面截图，便于事后排查
    async fn capture_failure_screenshot(&self, session: &BrowserSession) {
        let path = format!("{}-failure.png", self.id);
        match session.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&path, &bytes).await {
                    warn!("[会话 {}] ⚠️ 写入失败截图失败: {}", self.id, e);
                } else {
                    info!("[会话 {}] 📊 失败截图已保存: {}", self.id, path);
                }
            }
            Err(e) => warn!("[会话 {}] ⚠️ 截取失败页面失败: {:#}", self.id, e),
        }
    }

    async fn run_stages(&mut self, session: &BrowserSession) -> Result<()> {
        if self.config.wants_authentication() {
            self.stage_authenticate(session).await?;
        }
        self.stage_locate_quiz(session).await?;
        let questions = self.stage_extract(session).await?;
        self.stage_answer_all(session, &questions).await;
        if self.config.auto_submit {
            self.stage_submit(session).await;
        }
        Ok(())
    }

    // ========== 阶段实现 ==========

    /// 登录阶段
    ///
    /// 入口 URL：显式提供，否则由目标 URL 的源站拼常规登录路径。
    /// 落地后 URL 已是登录后形态则短路成功（不触发元素定位）。
    /// 密码提交后仍停留在登录页时，按多步登录流程重试一次；
    /// 重试后仍是登录页才算登录失败。
    async fn stage_authenticate(&mut self, session: &BrowserSession) -> Result<()> {
        self.stage_event(SessionStage::Authenticating);

        let target = self.config.target_url.clone();
        let explicit_entry = self.config.auth_entry_url.clone();
        let entry = explicit_entry
            .clone()
            .unwrap_or_else(|| derive_login_url(&target));

        session
            .goto(&entry)
            .await
            .map_err(|e| SessionError::Navigation(format!("无法到达登录入口 {}: {:#}", entry, e)))?;

        let landed = session.current_url().await.unwrap_or_default();
        if looks_like_authenticated(&landed) {
            info!("[会话 {}] ✓ 已处于登录状态，跳过登录流程", self.id);
            self.events.info(&self.id, "已处于登录状态，跳过登录流程");
            if explicit_entry.is_some() {
                self.goto_target(session).await?;
            }
            return Ok(());
        }

        let identity = self.config.identity.clone().unwrap_or_default();
        let identity_field = element_locator::locate(session, &login_identity_rules(), FIELD_TIMEOUT)
            .await?
            .ok_or_else(|| SessionError::Authentication("未找到账号输入框".to_string()))?;
        identity_field.clear(session).await?;
        identity_field.fill(session, &identity).await?;

        self.submit_secret(session).await?;

        let mut now_url = session.current_url().await.unwrap_or_default();
        if looks_like_auth_url(&now_url) {
            warn!("[会话 {}] ⚠️ 仍在登录页，按多步登录流程重试一次", self.id);
            self.events
                .warning(&self.id, "仍在登录页，按多步登录流程重试一次");
            self.submit_secret(session).await?;
            now_url = session.current_url().await.unwrap_or_default();
            if looks_like_auth_url(&now_url) {
                return Err(SessionError::Authentication(format!(
                    "重试后仍停留在登录页: {}",
                    now_url
                ))
                .into());
            }
        }

        info!("[会话 {}] ✓ 登录成功: {}", self.id, now_url);
        self.events.info(&self.id, "登录成功");

        // 用了独立登录入口时，回到原始目标页面
        if explicit_entry.is_some() {
            self.goto_target(session).await?;
        }
        Ok(())
    }

    /// 密码输入 + 提交子流程（多步登录时会被重试一次）
    async fn submit_secret(&self, session: &BrowserSession) -> Result<()> {
        let secret = self.config.secret.clone().unwrap_or_default();
        let secret_field = element_locator::locate(session, &login_secret_rules(), FIELD_TIMEOUT)
            .await?
            .ok_or_else(|| SessionError::Authentication("未找到密码输入框".to_string()))?;
        secret_field.clear(session).await?;
        secret_field.fill(session, &secret).await?;

        match element_locator::locate(session, &login_submit_rules(), BUTTON_TIMEOUT).await? {
            Some(button) => button.click(session).await?,
            None => {
                warn!("[会话 {}] ⚠️ 未找到登录按钮，回退为回车提交", self.id);
                self.events
                    .warning(&self.id, "未找到登录按钮，回退为回车提交");
                secret_field.press_enter(session).await?;
            }
        }

        // 部分登录流程没有完整的导航事件，超时只记警告、假定成功，
        // 真正的判定靠之后的 URL 检查
        if !session.wait_for_navigation(LOGIN_NAV_TIMEOUT).await {
            warn!("[会话 {}] ⚠️ 等待登录跳转超时，假定登录已完成", self.id);
            self.events
                .warning(&self.id, "等待登录跳转超时，假定登录已完成");
        }
        Ok(())
    }

    /// 定位测验阶段：找不到开始按钮不算失败，视为已在试题页面
    async fn stage_locate_quiz(&mut self, session: &BrowserSession) -> Result<()> {
        self.stage_event(SessionStage::LocatingQuiz);

        let current = session.current_url().await.unwrap_or_default();
        if current != self.config.target_url {
            self.goto_target(session).await?;
        }

        match element_locator::locate(session, &start_quiz_rules(), BUTTON_TIMEOUT).await? {
            Some(button) => {
                button.click(session).await?;
                info!("[会话 {}] ✓ 已点击开始/继续按钮", self.id);
                self.events.info(&self.id, "已点击开始/继续按钮");
                session.wait_for_navigation(QUIZ_NAV_TIMEOUT).await;
            }
            None => {
                warn!("[会话 {}] ⚠️ 未找到开始按钮，假定已在试题页面", self.id);
                self.events
                    .warning(&self.id, "未找到开始按钮，假定已在试题页面");
            }
        }
        Ok(())
    }

    /// 提取阶段：0 道题是合法的退化结果，脚本抛异常才是致命错误
    async fn stage_extract(&mut self, session: &BrowserSession) -> Result<Vec<Question>> {
        self.stage_event(SessionStage::Extracting);

        let questions = extractor::extract_questions(session)
            .await
            .map_err(|e| SessionError::Extraction(format!("{:#}", e)))?;

        if questions.is_empty() {
            warn!("[会话 {}] ⚠️ 未提取到任何题目", self.id);
            self.events.warning(&self.id, "未提取到任何题目");
        } else {
            info!("[会话 {}] ✓ 提取到 {} 道题目", self.id, questions.len());
            self.events
                .info(&self.id, format!("提取到 {} 道题目", questions.len()));
        }
        Ok(questions)
    }

    /// 答题阶段：严格按提取顺序逐题处理，每题一条记录，单题失败不中止
    async fn stage_answer_all(&mut self, session: &BrowserSession, questions: &[Question]) {
        self.stage_event(SessionStage::Answering);

        let flow = QuestionFlow::new(&self.config, &self.app_config);
        let total = questions.len();
        for (index, question) in questions.iter().enumerate() {
            self.events.progress(&self.id, index + 1, total, question);
            info!("[会话 {}] 处理第 {}/{} 道题目", self.id, index + 1, total);

            let record = flow.run(session, question).await;
            if let crate::models::AnswerOutcome::Failed(reason) = &record.outcome {
                self.events.error(
                    &self.id,
                    format!("题目 {} 作答失败: {}", question.id, reason),
                );
            }
            self.answers.push(record);
        }
    }

    /// 提交阶段：任何问题都只是警告，此时题目已经答完了
    async fn stage_submit(&mut self, session: &BrowserSession) {
        self.stage_event(SessionStage::Submitting);

        let button = match element_locator::locate(session, &submit_rules(), BUTTON_TIMEOUT).await {
            Ok(Some(button)) => button,
            Ok(None) => {
                warn!("[会话 {}] ⚠️ 未找到提交按钮，跳过提交", self.id);
                self.events.warning(&self.id, "未找到提交按钮，跳过提交");
                return;
            }
            Err(e) => {
                warn!("[会话 {}] ⚠️ 定位提交按钮出错: {:#}", self.id, e);
                self.events
                    .warning(&self.id, format!("定位提交按钮出错: {:#}", e));
                return;
            }
        };

        if let Err(e) = button.click(session).await {
            warn!("[会话 {}] ⚠️ 点击提交按钮失败: {:#}", self.id, e);
            self.events
                .warning(&self.id, format!("点击提交按钮失败: {:#}", e));
            return;
        }
        info!("[会话 {}] 📤 已点击提交按钮", self.id);
        self.events.info(&self.id, "已点击提交按钮");

        // 可能出现二次确认对话框；没有出现是正常情况
        match element_locator::locate(session, &confirm_rules(), BUTTON_TIMEOUT).await {
            Ok(Some(confirm)) => match confirm.click(session).await {
                Ok(()) => {
                    info!("[会话 {}] ✓ 已点击确认对话框", self.id);
                    self.events.info(&self.id, "已点击确认对话框");
                }
                Err(e) => {
                    warn!("[会话 {}] ⚠️ 点击确认对话框失败: {:#}", self.id, e);
                    self.events
                        .warning(&self.id, format!("点击确认对话框失败: {:#}", e));
                }
            },
            Ok(None) => {
                info!("[会话 {}] 未出现确认对话框（正常）", self.id);
            }
            Err(e) => {
                warn!("[会话 {}] ⚠️ 定位确认对话框出错: {:#}", self.id, e);
            }
        }
    }

    // ========== 辅助方法 ==========

    async fn goto_target(&self, session: &BrowserSession) -> Result<()> {
        session.goto(&self.config.target_url).await.map_err(|e| {
            SessionError::Navigation(format!(
                "无法到达目标页面 {}: {:#}",
                self.config.target_url, e
            ))
            .into()
        })
    }

    fn stage_event(&self, stage: SessionStage) {
        info!("[会话 {}] 进入阶段: {}", self.id, stage.as_str());
        self.events
            .info(&self.id, format!("进入阶段: {}", stage.as_str()));
    }
}

// ========== 元素匹配规则 ==========
// 规则顺序是各调用点的调优项：
// 登录输入框用通用结构优先（兼容面最大），
// 提交/开始按钮用文本优先（避免点中页面上别的通用按钮）

fn login_identity_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::css("input[type='text']"),
        MatchRule::css("input[type='email']"),
        MatchRule::css("input[name='username']"),
        MatchRule::css("#username"),
    ]
}

fn login_secret_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::css("input[type='password']"),
        MatchRule::css("input[name='password']"),
        MatchRule::css("#password"),
    ]
}

fn login_submit_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::text_contains("button", "log in"),
        MatchRule::text_contains("button", "登录"),
        MatchRule::css("#loginbtn"),
        MatchRule::css("button[type='submit']"),
        MatchRule::css("input[type='submit']"),
    ]
}

fn start_quiz_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::text_contains("button", "attempt quiz"),
        MatchRule::text_contains("button", "continue your attempt"),
        MatchRule::text_contains("button", "re-attempt"),
        MatchRule::text_contains("button", "开始答题"),
        MatchRule::text_contains("button", "继续答题"),
        MatchRule::text_contains("a", "attempt quiz"),
    ]
}

fn submit_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::text_contains("button", "finish attempt"),
        MatchRule::text_contains("button", "submit all"),
        MatchRule::text_contains("button", "提交"),
        MatchRule::text_contains("input[type='submit']", "submit"),
        MatchRule::css("button[type='submit']"),
    ]
}

fn confirm_rules() -> Vec<MatchRule> {
    vec![
        MatchRule::text_contains("button", "submit all and finish"),
        MatchRule::text_contains("button", "确认"),
        MatchRule::text_contains("button", "yes"),
        MatchRule::text_contains("button", "ok"),
    ]
}

// ========== URL 判定 ==========

/// 取 URL 的源站部分（scheme://host[:port]）
fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    match url[scheme_end..].find('/') {
        Some(pos) => Some(&url[..scheme_end + pos]),
        None => Some(url),
    }
}

/// 未显式提供登录入口时，从目标 URL 推导常规登录路径
fn derive_login_url(target_url: &str) -> String {
    match origin_of(target_url) {
        Some(origin) => format!("{}/login/index.php", origin),
        None => target_url.to_string(),
    }
}

/// URL 是否仍是登录页形态
fn looks_like_auth_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("/login") || lower.contains("signin") || lower.contains("sign-in")
}

/// URL 是否已是登录后形态（测验路径、课程+测验组合、或仪表盘标记）
fn looks_like_authenticated(url: &str) -> bool {
    let lower = url.to_lowercase();
    if looks_like_auth_url(&lower) {
        return false;
    }
    lower.contains("/mod/quiz/")
        || (lower.contains("/course/") && lower.contains("/quiz/"))
        || lower.contains("/my/")
        || lower.contains("dashboard")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://moodle.example.com/mod/quiz/view.php?id=3"),
            Some("https://moodle.example.com")
        );
        assert_eq!(
            origin_of("http://host:8080/path"),
            Some("http://host:8080")
        );
        assert_eq!(origin_of("https://host"), Some("https://host"));
        assert_eq!(origin_of("no-scheme"), None);
    }

    #[test]
    fn test_derive_login_url() {
        assert_eq!(
            derive_login_url("https://moodle.example.com/mod/quiz/view.php?id=3"),
            "https://moodle.example.com/login/index.php"
        );
    }

    #[test]
    fn test_auth_url_detection() {
        assert!(looks_like_auth_url("https://x.example/login/index.php"));
        assert!(looks_like_auth_url("https://x.example/auth/signin"));
        assert!(!looks_like_auth_url("https://x.example/mod/quiz/view.php"));
    }

    #[test]
    fn test_authenticated_short_circuit_on_course_and_quiz_path() {
        // 落地 URL 同时包含课程路径和测验路径 ⇒ 无需触发元素定位
        assert!(looks_like_authenticated(
            "https://x.example/course/12/quiz/3/attempt"
        ));
        assert!(looks_like_authenticated(
            "https://x.example/mod/quiz/attempt.php?attempt=9"
        ));
        assert!(looks_like_authenticated("https://x.example/my/"));
        assert!(looks_like_authenticated("https://x.example/dashboard"));
    }

    #[test]
    fn test_login_page_not_authenticated() {
        assert!(!looks_like_authenticated("https://x.example/login/index.php"));
        // 登录页 URL 即使带 quiz 参数也不算登录成功
        assert!(!looks_like_authenticated(
            "https://x.example/login/index.php?next=/mod/quiz/view.php"
        ));
        assert!(!looks_like_authenticated("https://x.example/course/12"));
    }

    #[test]
    fn test_rule_orderings_match_call_site_policy() {
        // 登录输入框：通用结构优先
        let identity = login_identity_rules();
        assert_eq!(identity[0], MatchRule::css("input[type='text']"));

        // 提交按钮：文本优先，通用选择器殿后
        let submit = submit_rules();
        assert!(matches!(submit[0], MatchRule::TextContains { .. }));
        assert!(matches!(submit.last(), Some(MatchRule::Css(_))));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(SessionStage::LocatingQuiz.as_str(), "locating-quiz");
        assert_eq!(SessionStage::Answering.as_str(), "answering");
    }
}
