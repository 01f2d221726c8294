//! 浏览器会话句柄 - 基础设施层
//!
//! 每个答题会话独占一个浏览器上下文；
//! 句柄只暴露能力（导航 / 执行 JS / 等待 / 截图），不认识 Question

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::launch_browser;

/// 浏览器会话句柄
///
/// 职责：
/// - 独占持有 Browser 和 Page 资源
/// - 暴露 navigate / eval / wait / screenshot / close 能力
/// - 不处理业务流程
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// 启动一个新的浏览器会话
    pub async fn launch(headless: bool) -> Result<Self> {
        let (browser, page, handler_task) = launch_browser(headless).await?;
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到指定 URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    /// 获取当前页面 URL（获取失败时返回空字符串）
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 等待页面导航完成（软超时）
    ///
    /// 超时返回 false，由调用方决定是否视为失败；
    /// 部分登录流程不会触发完整的导航事件
    pub async fn wait_for_navigation(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("等待导航出错: {}", e);
                false
            }
            Err(_) => false,
        }
    }

    /// 截取当前页面
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let bytes = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await?;
        Ok(bytes)
    }

    /// 关闭浏览器并释放资源
    ///
    /// 会话终态（成功或失败）都必须调用
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
        self.handler_task.abort();
        debug!("浏览器资源已释放");
    }
}
