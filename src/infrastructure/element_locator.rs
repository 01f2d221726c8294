//! 元素定位器 - 基础设施层
//!
//! 目标页面的标记结构不受本系统控制，同一应用族的不同版本/主题差异很大。
//! 因此定位采用"有序能力探测"：调用方提供一组按优先级排列的匹配规则，
//! 逐条等待，第一条命中**可见**元素的规则胜出。
//! 规则顺序是每个调用点自己的调优项（登录框倾向通用优先，提交按钮倾向文本优先），
//! 不是全局策略。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::infrastructure::browser_session::BrowserSession;

/// 命中元素的标记属性名（写入页面 DOM，后续操作按它回找）
const MARK_ATTR: &str = "data-qa-mark";
/// 单条规则内的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

static MARK_SEQ: AtomicU64 = AtomicU64::new(0);

/// 一条元素匹配规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// 按 CSS 选择器匹配
    Css(String),
    /// CSS 选择器 + 可见文本包含（忽略大小写）
    TextContains { selector: String, text: String },
}

impl MatchRule {
    pub fn css(selector: impl Into<String>) -> Self {
        MatchRule::Css(selector.into())
    }

    pub fn text_contains(selector: impl Into<String>, text: impl Into<String>) -> Self {
        MatchRule::TextContains {
            selector: selector.into(),
            text: text.into(),
        }
    }

    /// 生成探测脚本：找到第一个可见匹配则打上标记并返回 true
    fn probe_js(&self, marker: &str) -> Result<String> {
        let (selector, text_filter) = match self {
            MatchRule::Css(selector) => (selector.as_str(), String::new()),
            MatchRule::TextContains { selector, text } => (
                selector.as_str(),
                format!(
                    " && (el.innerText || '').toLowerCase().includes({})",
                    serde_json::to_string(&text.to_lowercase())?
                ),
            ),
        };
        let selector_json = serde_json::to_string(selector)?;
        let marker_json = serde_json::to_string(marker)?;
        Ok(format!(
            r#"(() => {{
    const isVisible = (el) => {{
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') return false;
        if (style.opacity !== '' && parseFloat(style.opacity) === 0) return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    }};
    const nodes = Array.from(document.querySelectorAll({selector_json}));
    const hit = nodes.find((el) => isVisible(el){text_filter});
    if (!hit) return false;
    hit.setAttribute('{MARK_ATTR}', {marker_json});
    return true;
}})()"#
        ))
    }
}

/// 已定位的页面元素
///
/// 持有标记令牌，不持有任何浏览器资源
#[derive(Debug, Clone)]
pub struct LocatedElement {
    marker: String,
}

impl LocatedElement {
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// 生成针对已标记元素的操作脚本
    fn action_js(&self, body: &str) -> Result<String> {
        let marker_json = serde_json::to_string(&self.marker)?;
        Ok(format!(
            r#"(() => {{
    const el = document.querySelector('[{MARK_ATTR}="' + {marker_json} + '"]');
    if (!el) return false;
    {body}
    return true;
}})()"#
        ))
    }

    async fn run_action(&self, session: &BrowserSession, body: &str) -> Result<()> {
        let script = self.action_js(body)?;
        let ok: bool = session.eval_as(script).await?;
        if !ok {
            bail!("已定位的元素在页面上消失 (marker: {})", self.marker);
        }
        Ok(())
    }

    /// 点击元素
    pub async fn click(&self, session: &BrowserSession) -> Result<()> {
        self.run_action(session, "el.click();").await
    }

    /// 清空输入框内容
    pub async fn clear(&self, session: &BrowserSession) -> Result<()> {
        self.run_action(
            session,
            "el.focus();\n    if ('value' in el) { el.value = ''; }\n    \
             el.dispatchEvent(new Event('input', { bubbles: true }));",
        )
        .await
    }

    /// 输入文本并派发 input / change 事件
    pub async fn fill(&self, session: &BrowserSession, text: &str) -> Result<()> {
        let text_json = serde_json::to_string(text)?;
        let body = format!(
            "const value = {text_json};\n    el.focus();\n    \
             if ('value' in el) {{ el.value = value; }}\n    \
             el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n    \
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));"
        );
        self.run_action(session, &body).await
    }

    /// 模拟回车提交（兜底：没有提交按钮的表单）
    pub async fn press_enter(&self, session: &BrowserSession) -> Result<()> {
        self.run_action(
            session,
            "el.focus();\n    \
             const init = { key: 'Enter', code: 'Enter', bubbles: true, cancelable: true };\n    \
             el.dispatchEvent(new KeyboardEvent('keydown', init));\n    \
             el.dispatchEvent(new KeyboardEvent('keyup', init));\n    \
             if (el.form) { if (el.form.requestSubmit) { el.form.requestSubmit(); } else { el.form.submit(); } }",
        )
        .await
    }

    /// 滚动到元素可见位置
    pub async fn scroll_into_view(&self, session: &BrowserSession) -> Result<()> {
        self.run_action(
            session,
            "el.scrollIntoView({ behavior: 'smooth', block: 'center', inline: 'center' });",
        )
        .await
    }
}

/// 按顺序探测候选规则，返回第一个命中可见元素的规则结果
///
/// 每条规则最多等待 `timeout_per_candidate`；
/// 匹配到不可见元素视为未命中，继续下一条规则。
/// 全部未命中返回 Ok(None)，由调用方决定是错误还是警告。
pub async fn locate(
    session: &BrowserSession,
    candidates: &[MatchRule],
    timeout_per_candidate: Duration,
) -> Result<Option<LocatedElement>> {
    for rule in candidates {
        let marker = format!("qa-mark-{}", MARK_SEQ.fetch_add(1, Ordering::Relaxed));
        let script = rule.probe_js(&marker)?;
        let deadline = Instant::now() + timeout_per_candidate;
        loop {
            match session.eval_as::<bool>(script.as_str()).await {
                Ok(true) => {
                    debug!("✓ 规则命中: {:?} (marker: {})", rule, marker);
                    return Ok(Some(LocatedElement { marker }));
                }
                Ok(false) => {}
                Err(e) => {
                    // 选择器本身非法等情况，继续尝试下一条规则
                    debug!("探测脚本执行失败: {:#}", e);
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_js_embeds_selector_and_marker() {
        let rule = MatchRule::css("input[type='password']");
        let script = rule.probe_js("qa-mark-0").unwrap();
        assert!(script.contains("input[type='password']"));
        assert!(script.contains("qa-mark-0"));
        assert!(script.contains("data-qa-mark"));
        assert!(script.contains("isVisible"));
    }

    #[test]
    fn test_text_rule_lowercases_needle() {
        let rule = MatchRule::text_contains("button", "Log In");
        let script = rule.probe_js("qa-mark-1").unwrap();
        assert!(script.contains("\"log in\""));
        assert!(script.contains("toLowerCase()"));
    }

    #[test]
    fn test_css_rule_has_no_text_filter() {
        let rule = MatchRule::css("button");
        let script = rule.probe_js("qa-mark-2").unwrap();
        assert!(!script.contains("includes"));
    }

    #[test]
    fn test_action_js_targets_marker() {
        let element = LocatedElement {
            marker: "qa-mark-9".to_string(),
        };
        let script = element.action_js("el.click();").unwrap();
        assert!(script.contains("qa-mark-9"));
        assert!(script.contains("el.click()"));
        assert!(script.contains("data-qa-mark"));
    }

    #[test]
    fn test_markers_are_unique() {
        let a = MARK_SEQ.fetch_add(1, Ordering::Relaxed);
        let b = MARK_SEQ.fetch_add(1, Ordering::Relaxed);
        assert_ne!(a, b);
    }
}
