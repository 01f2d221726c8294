//! 题目数据模型
//!
//! 题目在"提取"阶段一次性分类，之后不再修改

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 题目类型
///
/// 分类依据是提取阶段观察到的结构特征（单选框/多选框/文本框等）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// 单选题
    SingleChoice,
    /// 多选题
    MultiSelect,
    /// 判断题
    Boolean,
    /// 简答题（单行文本）
    ShortText,
    /// 论述题（多行文本）
    LongText,
    /// 未知题型
    Unknown,
}

/// 题目选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    /// 选项显示文本
    pub text: String,
    /// 定位令牌（提取时写入页面的 data-qa-option 属性值，仅用于回找控件）
    pub token: String,
}

/// 一道题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 会话内稳定的题目编号（从 1 开始，按 DOM 顺序）
    pub id: usize,
    /// 题干文本（非空，空题干的容器在提取时被丢弃）
    pub text: String,
    /// 题目类型（提取时一次性分类）
    pub kind: QuestionKind,
    /// 选项列表（按页面顺序）
    pub options: Vec<QuestionOption>,
    /// 题目容器的定位令牌（data-qa-question 属性值，用于滚动定位）
    pub container_token: String,
}

/// 单题处理结果
///
/// 部分失败累加器：无论注入是否成功，每道题都会产出一条记录，
/// 下游不需要区分"缺失"和"失败"
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// 成功，携带推理服务产出的回答文本
    Answered(String),
    /// 失败，携带失败原因
    Failed(String),
}

impl AnswerOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerOutcome::Answered(_))
    }
}

/// 已作答题目记录（追加式，每题一条，按提取顺序）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: usize,
    pub question_text: String,
    pub outcome: AnswerOutcome,
    pub answered_at: DateTime<Local>,
}

impl AnsweredQuestion {
    pub fn new(question: &Question, outcome: AnswerOutcome) -> Self {
        Self {
            question_id: question.id,
            question_text: question.text.clone(),
            outcome,
            answered_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: 1,
            text: "天空是蓝色的吗？".to_string(),
            kind: QuestionKind::SingleChoice,
            options: vec![
                QuestionOption {
                    text: "Yes".to_string(),
                    token: "qa-q0-o0".to_string(),
                },
                QuestionOption {
                    text: "No".to_string(),
                    token: "qa-q0-o1".to_string(),
                },
            ],
            container_token: "qa-q0".to_string(),
        }
    }

    #[test]
    fn test_question_kind_serde_kebab_case() {
        let json = serde_json::to_string(&QuestionKind::SingleChoice).unwrap();
        assert_eq!(json, "\"single-choice\"");
        let json = serde_json::to_string(&QuestionKind::MultiSelect).unwrap();
        assert_eq!(json, "\"multi-select\"");
    }

    #[test]
    fn test_answer_outcome_tagging() {
        let ok = serde_json::to_value(AnswerOutcome::Answered("A".to_string())).unwrap();
        assert_eq!(ok["status"], "answered");
        assert_eq!(ok["text"], "A");

        let failed = serde_json::to_value(AnswerOutcome::Failed("无法解析".to_string())).unwrap();
        assert_eq!(failed["status"], "failed");
    }

    #[test]
    fn test_answered_question_keeps_question_identity() {
        let question = sample_question();
        let record = AnsweredQuestion::new(&question, AnswerOutcome::Answered("A".to_string()));
        assert_eq!(record.question_id, 1);
        assert_eq!(record.question_text, question.text);
        assert!(record.outcome.is_answered());
    }
}
