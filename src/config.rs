/// 进程级配置
///
/// 会话本身的参数在每个启动请求里提供（见 `SessionConfig`），
/// 这里只保留服务端口、推理服务端点和各项默认值
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务监听端口
    pub server_port: u16,
    /// 推理服务 API 端点（兼容 OpenAI API 的服务）
    pub llm_api_base_url: String,
    /// 推理模型名称
    pub llm_model_name: String,
    /// 每题延迟下限默认值（秒）
    pub default_delay_min_secs: f64,
    /// 每题延迟上限默认值（秒）
    pub default_delay_max_secs: f64,
    /// 默认是否无头模式
    pub default_headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            default_delay_min_secs: 1.0,
            default_delay_max_secs: 3.0,
            default_headless: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            server_port: std::env::var("SERVER_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.server_port),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            default_delay_min_secs: std::env::var("DEFAULT_DELAY_MIN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_delay_min_secs),
            default_delay_max_secs: std::env::var("DEFAULT_DELAY_MAX_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_delay_max_secs),
            default_headless: std::env::var("DEFAULT_HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_headless),
        }
    }
}
