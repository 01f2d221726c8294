//! 日志初始化与日志辅助函数

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 通过 RUST_LOG 环境变量控制级别，默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("短文本", 80), "短文本");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "很".repeat(100);
        let result = truncate_text(&long, 80);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 83);
    }
}
