//! 会话配置
//!
//! 创建会话时一次性提供，运行期间不可变。
//! 必填字段缺失是"创建时错误"，绝不会进入流水线。

use serde::Deserialize;

/// 单个答题会话的配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// 推理服务 API Key（必填）
    pub reasoning_api_key: String,
    /// 目标测验页面 URL（必填）
    pub target_url: String,
    /// 独立的登录入口 URL（可选，缺省时由目标 URL 推导）
    pub auth_entry_url: Option<String>,
    /// 登录账号（可选，与 secret 同时提供时才执行登录阶段）
    pub identity: Option<String>,
    /// 登录密码（可选）
    pub secret: Option<String>,
    /// 每题注入前的最小延迟（秒）
    pub delay_min_secs: f64,
    /// 每题注入前的最大延迟（秒）
    pub delay_max_secs: f64,
    /// 是否无头模式
    pub headless: bool,
    /// 答完后是否自动提交
    pub auto_submit: bool,
}

impl SessionConfig {
    /// 创建时校验
    ///
    /// 校验失败的请求直接被 HTTP 层拒绝，不会创建会话
    pub fn validate(&self) -> Result<(), String> {
        if self.reasoning_api_key.trim().is_empty() {
            return Err("缺少必填字段 reasoningApiKey".to_string());
        }
        if self.target_url.trim().is_empty() {
            return Err("缺少必填字段 targetUrl".to_string());
        }
        if self.delay_min_secs < 0.0 || self.delay_max_secs < 0.0 {
            return Err("延迟时间不能为负数".to_string());
        }
        if self.delay_min_secs > self.delay_max_secs {
            return Err("delayMin 不能大于 delayMax".to_string());
        }
        Ok(())
    }

    /// 是否需要执行登录阶段（账号和密码都提供时才登录）
    pub fn wants_authentication(&self) -> bool {
        self.identity.as_deref().is_some_and(|s| !s.is_empty())
            && self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SessionConfig {
        SessionConfig {
            reasoning_api_key: "sk-test".to_string(),
            target_url: "https://example.com/mod/quiz/view.php?id=1".to_string(),
            auth_entry_url: None,
            identity: None,
            secret: None,
            delay_min_secs: 1.0,
            delay_max_secs: 3.0,
            headless: true,
            auto_submit: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut config = valid_config();
        config.reasoning_api_key = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("reasoningApiKey"));
    }

    #[test]
    fn test_missing_target_url_rejected() {
        let mut config = valid_config();
        config.target_url = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.contains("targetUrl"));
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let mut config = valid_config();
        config.delay_min_secs = 5.0;
        config.delay_max_secs = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_delay_bounds_allowed() {
        let mut config = valid_config();
        config.delay_min_secs = 2.0;
        config.delay_max_secs = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wants_authentication_requires_both_fields() {
        let mut config = valid_config();
        assert!(!config.wants_authentication());

        config.identity = Some("student".to_string());
        assert!(!config.wants_authentication());

        config.secret = Some("p@ss".to_string());
        assert!(config.wants_authentication());

        config.identity = Some(String::new());
        assert!(!config.wants_authentication());
    }
}
