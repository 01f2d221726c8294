//! 会话错误分类
//!
//! 只有这里列出的错误会终止整个会话；
//! 单题级错误（推理失败、回答无法解析、控件找不到）在流程层就地记录并继续。

use thiserror::Error;

/// 会话级致命错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 浏览器环境无法获取
    #[error("浏览器启动失败: {0}")]
    Setup(String),
    /// 登录失败（输入框/按钮找不到，或重试后仍停留在登录页）
    #[error("登录失败: {0}")]
    Authentication(String),
    /// 无法到达目标页面
    #[error("导航失败: {0}")]
    Navigation(String),
    /// 页面枚举脚本本身抛出异常（提取到 0 道题不是错误）
    #[error("题目提取失败: {0}")]
    Extraction(String),
    /// 配置错误（应在会话创建前被拦截）
    #[error("配置错误: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_detail() {
        let err = SessionError::Authentication("重试后仍停留在登录页".to_string());
        assert!(err.to_string().contains("登录失败"));
        assert!(err.to_string().contains("登录页"));
    }
}
