//! 提示词构建 - 业务能力层
//!
//! 每种题型一种固定的指令尾巴，选项用 A. B. C. 字母行渲染

use crate::models::{Question, QuestionKind};

/// 选项序号转字母（0 → A，1 → B，...）
pub fn option_letter(index: usize) -> char {
    (b'A' + (index as u8)) as char
}

/// 构建单题提示词
///
/// 选择类题型附带字母选项列表和"只返回字母"类指令；
/// 文本类题型不做字母包装，直接要求简洁作答
pub fn build_question_prompt(question: &Question) -> String {
    let mut prompt = format!("请回答下面的题目。\n\n题目：{}\n", question.text);

    let has_options = matches!(
        question.kind,
        QuestionKind::SingleChoice | QuestionKind::MultiSelect | QuestionKind::Boolean
    ) && !question.options.is_empty();

    if has_options {
        prompt.push_str("\n选项：\n");
        for (i, option) in question.options.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", option_letter(i), option.text));
        }
    }

    let instruction = match question.kind {
        QuestionKind::SingleChoice | QuestionKind::Boolean => {
            "只返回一个选项字母（例如：A），不要返回任何其他内容。"
        }
        QuestionKind::MultiSelect => {
            "返回所有正确选项的字母，用逗号分隔（例如：A,C），不要返回任何其他内容。"
        }
        QuestionKind::ShortText | QuestionKind::LongText | QuestionKind::Unknown => {
            "请直接给出简洁的答案。"
        }
    };
    prompt.push('\n');
    prompt.push_str(instruction);
    prompt
}
