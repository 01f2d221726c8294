//! 题目提取 - 业务能力层
//!
//! 一次页面内 JS 枚举所有题目容器，带回结构特征；
//! 分类在 Rust 侧完成，且只在提取时做一次，之后不再修改。
//! 提取顺序就是 DOM 顺序，后续所有阶段都按这个顺序处理，绝不重排。

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::infrastructure::BrowserSession;
use crate::models::{Question, QuestionKind, QuestionOption};

/// 页面枚举脚本
///
/// 依次尝试容器选择器，第一个有命中的选择器胜出；
/// 每个容器和每个选项控件都会被打上定位令牌（data-qa-question / data-qa-option），
/// 供后续滚动与注入回找
const EXTRACT_QUESTIONS_JS: &str = r#"
(() => {
    const containerSelectors = [
        '.que',
        '.question-container',
        '.quiz-question',
        "div[id^='question-']",
        "[class*='question']",
    ];
    let containers = [];
    for (const sel of containerSelectors) {
        const found = Array.from(document.querySelectorAll(sel));
        if (found.length > 0) { containers = found; break; }
    }
    const results = [];
    containers.forEach((container, idx) => {
        const containerToken = 'qa-q' + idx;
        container.setAttribute('data-qa-question', containerToken);
        const textSelectors = ['.qtext', '.question-text', '.stem', '.content', 'h3', 'legend'];
        let text = '';
        for (const sel of textSelectors) {
            const node = container.querySelector(sel);
            if (node && node.innerText && node.innerText.trim()) {
                text = node.innerText.trim();
                break;
            }
        }
        const radios = container.querySelectorAll("input[type='radio']");
        const checkboxes = container.querySelectorAll("input[type='checkbox']");
        const textInputs = container.querySelectorAll("input[type='text'], input:not([type])");
        const textAreas = container.querySelectorAll('textarea');
        const choiceInputs = radios.length > 0 ? radios : checkboxes;
        const options = [];
        Array.from(choiceInputs).forEach((input, j) => {
            const token = containerToken + '-o' + j;
            input.setAttribute('data-qa-option', token);
            let label = '';
            if (input.id) {
                const forLabel = container.querySelector("label[for='" + input.id + "']");
                if (forLabel) label = forLabel.innerText.trim();
            }
            if (!label) {
                const wrap = input.closest('label');
                if (wrap) label = wrap.innerText.trim();
            }
            if (!label && input.parentElement) {
                label = input.parentElement.innerText.trim();
            }
            if (!label) label = input.value || '';
            options.push({ text: label, token: token });
        });
        results.push({
            text: text,
            options: options,
            radios: radios.length,
            checkboxes: checkboxes.length,
            textInputs: textInputs.length,
            textAreas: textAreas.length,
            containerToken: containerToken,
        });
    });
    return results;
})()
"#;

/// 枚举脚本带回的原始结构特征
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub text: String,
    pub options: Vec<RawOption>,
    pub radios: usize,
    pub checkboxes: usize,
    pub text_inputs: usize,
    pub text_areas: usize,
    pub container_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOption {
    pub text: String,
    pub token: String,
}

/// 提取当前页面的全部题目
///
/// 枚举脚本本身抛异常才是错误；提取到 0 道题是合法的退化结果
pub async fn extract_questions(session: &BrowserSession) -> Result<Vec<Question>> {
    let raw: Vec<RawQuestion> = session
        .eval_as(EXTRACT_QUESTIONS_JS)
        .await
        .context("页面枚举脚本执行失败")?;
    debug!("枚举到 {} 个候选容器", raw.len());
    Ok(assemble(raw))
}

/// 原始容器 → 题目列表
///
/// 空题干容器被丢弃；编号按保留后的顺序从 1 开始
pub(crate) fn assemble(raw: Vec<RawQuestion>) -> Vec<Question> {
    let mut questions = Vec::new();
    for raw_q in raw {
        let text = raw_q.text.trim().to_string();
        if text.is_empty() {
            continue;
        }
        let kind = classify(&raw_q);
        questions.push(Question {
            id: questions.len() + 1,
            text,
            kind,
            options: raw_q
                .options
                .into_iter()
                .map(|o| QuestionOption {
                    text: o.text,
                    token: o.token,
                })
                .collect(),
            container_token: raw_q.container_token,
        });
    }
    questions
}

/// 按结构特征分类题型
///
/// 单选框 ⇒ 单选（恰好两个选项或选项文本是判断式 ⇒ 判断题）；
/// 多选框 ⇒ 多选；多行文本 ⇒ 论述；单行文本 ⇒ 简答；否则未知
pub(crate) fn classify(raw: &RawQuestion) -> QuestionKind {
    if raw.radios > 0 {
        if raw.options.len() == 2 || has_boolean_options(&raw.options) {
            QuestionKind::Boolean
        } else {
            QuestionKind::SingleChoice
        }
    } else if raw.checkboxes > 0 {
        QuestionKind::MultiSelect
    } else if raw.text_areas > 0 {
        QuestionKind::LongText
    } else if raw.text_inputs > 0 {
        QuestionKind::ShortText
    } else {
        QuestionKind::Unknown
    }
}

fn has_boolean_options(options: &[RawOption]) -> bool {
    const BOOL_WORDS: [&str; 8] = ["yes", "no", "true", "false", "对", "错", "正确", "错误"];
    !options.is_empty()
        && options
            .iter()
            .all(|o| BOOL_WORDS.contains(&o.text.trim().to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        text: &str,
        option_texts: &[&str],
        radios: usize,
        checkboxes: usize,
        text_inputs: usize,
        text_areas: usize,
    ) -> RawQuestion {
        RawQuestion {
            text: text.to_string(),
            options: option_texts
                .iter()
                .enumerate()
                .map(|(i, t)| RawOption {
                    text: t.to_string(),
                    token: format!("qa-q0-o{}", i),
                })
                .collect(),
            radios,
            checkboxes,
            text_inputs,
            text_areas,
            container_token: "qa-q0".to_string(),
        }
    }

    #[test]
    fn test_classify_radio_three_options_is_single_choice() {
        let q = raw("Is the sky blue?", &["Yes", "No", "Maybe"], 3, 0, 0, 0);
        assert_eq!(classify(&q), QuestionKind::SingleChoice);
    }

    #[test]
    fn test_classify_two_radio_options_is_boolean() {
        let q = raw("地球是圆的。", &["对", "错"], 2, 0, 0, 0);
        assert_eq!(classify(&q), QuestionKind::Boolean);
    }

    #[test]
    fn test_classify_boolean_styled_text() {
        let q = raw("判断", &["True", "False"], 2, 0, 0, 0);
        assert_eq!(classify(&q), QuestionKind::Boolean);
    }

    #[test]
    fn test_classify_checkboxes_is_multi_select() {
        let q = raw("多选", &["甲", "乙", "丙"], 0, 3, 0, 0);
        assert_eq!(classify(&q), QuestionKind::MultiSelect);
    }

    #[test]
    fn test_classify_textarea_is_long_text() {
        let q = raw("论述", &[], 0, 0, 0, 1);
        assert_eq!(classify(&q), QuestionKind::LongText);
    }

    #[test]
    fn test_classify_text_input_is_short_text() {
        let q = raw("简答", &[], 0, 0, 2, 0);
        assert_eq!(classify(&q), QuestionKind::ShortText);
    }

    #[test]
    fn test_classify_nothing_is_unknown() {
        let q = raw("？", &[], 0, 0, 0, 0);
        assert_eq!(classify(&q), QuestionKind::Unknown);
    }

    #[test]
    fn test_assemble_discards_empty_text_and_keeps_order() {
        let questions = assemble(vec![
            raw("第一题", &["A1", "B1", "C1"], 3, 0, 0, 0),
            raw("   ", &[], 0, 0, 1, 0),
            raw("第三题", &[], 0, 0, 1, 0),
        ]);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[0].text, "第一题");
        assert_eq!(questions[1].id, 2);
        assert_eq!(questions[1].text, "第三题");
        assert_eq!(questions[1].kind, QuestionKind::ShortText);
    }

    #[test]
    fn test_extract_script_stamps_markers() {
        assert!(EXTRACT_QUESTIONS_JS.contains("data-qa-question"));
        assert!(EXTRACT_QUESTIONS_JS.contains("data-qa-option"));
    }
}
