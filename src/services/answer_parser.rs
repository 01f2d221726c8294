//! 回答解析 - 业务能力层
//!
//! 从推理服务的自由文本里提取选项字母并映射为选项下标

use std::sync::OnceLock;

use regex::Regex;

static LETTER_RE: OnceLock<Regex> = OnceLock::new();

fn letter_re() -> &'static Regex {
    LETTER_RE.get_or_init(|| Regex::new("[A-Z]").expect("固定正则必然合法"))
}

/// 提取回答中出现的第一个大写字母，映射为选项下标（A→0，B→1，...）
///
/// 没有大写字母时返回 None；下标是否越界由调用方结合选项数量判断
pub fn first_letter_index(reply: &str) -> Option<usize> {
    letter_re()
        .find(reply)
        .map(|m| (m.as_str().as_bytes()[0] - b'A') as usize)
}

/// 提取回答中出现的所有大写字母，保序去重后映射为有效选项下标
///
/// 越界字母静默跳过（多选题接受部分正确）；重复字母只保留一次，
/// 避免对同一个多选框点击两次造成反选
pub fn letter_indices(reply: &str, option_count: usize) -> Vec<usize> {
    let mut seen = Vec::new();
    for m in letter_re().find_iter(reply) {
        let index = (m.as_str().as_bytes()[0] - b'A') as usize;
        if index < option_count && !seen.contains(&index) {
            seen.push(index);
        }
    }
    seen
}
