//! 单题处理流程 - 流程层
//!
//! 流程顺序：构建提示词 → 推理服务 → 随机延迟 → 滚动定位 → 注入答案
//!
//! 部分失败累加器：无论哪一步失败，都产出一条 AnsweredQuestion 记录，
//! 单题失败绝不会中止整个会话

use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::BrowserSession;
use crate::logger::truncate_text;
use crate::models::{AnswerOutcome, AnsweredQuestion, Question, SessionConfig};
use crate::services::{injector, prompt, ReasoningClient};

/// 单题处理流程
///
/// - 编排一道题的完整处理
/// - 不持有任何浏览器资源
/// - 只依赖业务能力（reasoning / prompt / injector）
pub struct QuestionFlow {
    reasoning: ReasoningClient,
    delay_min_secs: f64,
    delay_max_secs: f64,
}

impl QuestionFlow {
    /// 创建新的单题流程
    ///
    /// 推理端点和模型来自进程配置，API Key 来自会话配置
    pub fn new(session_config: &SessionConfig, app_config: &Config) -> Self {
        Self {
            reasoning: ReasoningClient::new(
                &session_config.reasoning_api_key,
                &app_config.llm_api_base_url,
                &app_config.llm_model_name,
            ),
            delay_min_secs: session_config.delay_min_secs,
            delay_max_secs: session_config.delay_max_secs,
        }
    }

    /// 处理一道题目，总是返回一条记录
    pub async fn run(&self, session: &BrowserSession, question: &Question) -> AnsweredQuestion {
        info!(
            "题目 {}: {} ({:?})",
            question.id,
            truncate_text(&question.text, 80),
            question.kind
        );

        let outcome = match self.try_answer(session, question).await {
            Ok(reply) => {
                info!("✓ 题目 {} 已作答: {}", question.id, truncate_text(&reply, 60));
                AnswerOutcome::Answered(reply)
            }
            Err(e) => {
                error!("❌ 题目 {} 作答失败: {:#}", question.id, e);
                AnswerOutcome::Failed(format!("{:#}", e))
            }
        };

        AnsweredQuestion::new(question, outcome)
    }

    async fn try_answer(&self, session: &BrowserSession, question: &Question) -> Result<String> {
        let prompt_text = prompt::build_question_prompt(question);
        let reply = self
            .reasoning
            .answer(&prompt_text)
            .await
            .context("推理服务调用失败")?;

        // 触碰页面前先随机延迟，避免非人类速度的交互
        let delay = pick_delay(self.delay_min_secs, self.delay_max_secs);
        debug!("注入前延迟 {:.2} 秒", delay.as_secs_f64());
        sleep(delay).await;

        if let Err(e) = injector::scroll_to_question(session, question).await {
            warn!("⚠️ 滚动到题目 {} 失败: {:#}", question.id, e);
        }
        injector::inject_answer(session, question, &reply).await?;

        Ok(reply)
    }
}

/// 在 [min, max] 区间内均匀抽取延迟
///
/// 创建时校验保证 min <= max
pub fn pick_delay(min_secs: f64, max_secs: f64) -> Duration {
    let secs = if max_secs > min_secs {
        rand::thread_rng().gen_range(min_secs..=max_secs)
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs.max(0.0))
}
