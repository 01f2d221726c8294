//! 推理服务客户端 - 业务能力层
//!
//! 无状态的请求/响应包装：每道题一次独立调用，不跨题携带上下文
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型，兼容 OpenAI API 的服务

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

/// 角色指令（system 消息），约束回答格式
const SYSTEM_INSTRUCTION: &str =
    "你是一个专业的答题助手。请严格按照题目末尾的格式指令作答，不要输出解释。";

/// 推理服务客户端
///
/// 职责：
/// - 调用推理服务获取单题回答
/// - 不认识 QuizSession / 流程顺序
pub struct ReasoningClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl ReasoningClient {
    /// 创建新的推理客户端
    pub fn new(api_key: &str, api_base_url: &str, model_name: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: model_name.to_string(),
        }
    }

    /// 提交提示词，返回去除首尾空白的自由文本回答
    pub async fn answer(&self, prompt: &str) -> Result<String> {
        debug!("调用推理服务，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_INSTRUCTION)
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.2)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("推理服务调用失败: {}", e);
            anyhow::anyhow!("推理服务调用失败: {}", e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("推理服务返回内容为空"))?;

        debug!("推理服务调用成功");

        Ok(content.trim().to_string())
    }
}
