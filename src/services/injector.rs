//! 答案注入 - 业务能力层
//!
//! 按题型把推理服务的回答写回页面：
//! - 单选/判断：第一个大写字母 → 选项下标 → 点击；解析失败或越界是单题错误
//! - 多选：所有有效字母都点击，无效字母静默跳过
//! - 简答/论述：填充页面上最后一个可见文本框（见下方已知脆弱点说明）

use anyhow::{bail, Context, Result};

use crate::infrastructure::BrowserSession;
use crate::models::{Question, QuestionKind, QuestionOption};
use crate::services::answer_parser;

/// 把回答注入页面
///
/// 所有失败都是单题级的：调用方记录错误后继续下一题
pub async fn inject_answer(
    session: &BrowserSession,
    question: &Question,
    reply: &str,
) -> Result<()> {
    match question.kind {
        QuestionKind::SingleChoice | QuestionKind::Boolean => {
            let Some(index) = answer_parser::first_letter_index(reply) else {
                bail!("回答中没有可解析的选项字母: {}", reply);
            };
            if index >= question.options.len() {
                bail!(
                    "选项字母越界: 下标 {}，选项数 {}（回答: {}）",
                    index,
                    question.options.len(),
                    reply
                );
            }
            click_option(session, &question.options[index]).await
        }
        QuestionKind::MultiSelect => {
            // 部分正确可接受：逐个点击有效字母，无效字母不报错
            for index in answer_parser::letter_indices(reply, question.options.len()) {
                click_option(session, &question.options[index]).await?;
            }
            Ok(())
        }
        QuestionKind::ShortText | QuestionKind::LongText => {
            fill_last_text_field(session, reply).await
        }
        QuestionKind::Unknown => {
            bail!("未知题型，无法注入答案");
        }
    }
}

/// 滚动到题目容器（注入前调用，失败只作为单题警告）
pub async fn scroll_to_question(session: &BrowserSession, question: &Question) -> Result<()> {
    let script = build_scroll_js(&question.container_token)?;
    let ok: bool = session.eval_as(script).await?;
    if !ok {
        bail!("题目容器已不在页面上: {}", question.container_token);
    }
    Ok(())
}

async fn click_option(session: &BrowserSession, option: &QuestionOption) -> Result<()> {
    let script = build_click_option_js(&option.token)?;
    let ok: bool = session
        .eval_as(script)
        .await
        .context("点击选项脚本执行失败")?;
    if !ok {
        bail!("选项控件已不在页面上: {}", option.token);
    }
    Ok(())
}

async fn fill_last_text_field(session: &BrowserSession, value: &str) -> Result<()> {
    let script = build_fill_last_text_field_js(value)?;
    let ok: bool = session
        .eval_as(script)
        .await
        .context("填充文本脚本执行失败")?;
    if !ok {
        bail!("页面上没有可见的文本输入框");
    }
    Ok(())
}

fn build_click_option_js(token: &str) -> Result<String> {
    let token_json = serde_json::to_string(token)?;
    Ok(format!(
        r#"(() => {{
    const el = document.querySelector('[data-qa-option="' + {token_json} + '"]');
    if (!el) return false;
    el.click();
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()"#
    ))
}

/// 填充"页面上最后一个可见文本框"
///
/// 已知脆弱点：同屏渲染多道简答题时，"最后一个文本框"可能不属于
/// 当前题目。流水线在注入前会先滚动到当前题目容器。
fn build_fill_last_text_field_js(value: &str) -> Result<String> {
    let value_json = serde_json::to_string(value)?;
    Ok(format!(
        r#"(() => {{
    const value = {value_json};
    const isVisible = (el) => {{
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    }};
    const fields = Array.from(
        document.querySelectorAll("input[type='text'], input:not([type]), textarea")
    ).filter(isVisible);
    if (fields.length === 0) return false;
    const el = fields[fields.length - 1];
    el.focus();
    el.value = value;
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()"#
    ))
}

fn build_scroll_js(container_token: &str) -> Result<String> {
    let token_json = serde_json::to_string(container_token)?;
    Ok(format!(
        r#"(() => {{
    const el = document.querySelector('[data-qa-question="' + {token_json} + '"]');
    if (!el) return false;
    el.scrollIntoView({{ behavior: 'smooth', block: 'center' }});
    return true;
}})()"#
    ))
}
