//! 浏览器启动
//!
//! 每个会话独占一个浏览器实例，固定视口 + 桌面 UA

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 固定视口宽度
const VIEWPORT_WIDTH: u32 = 1366;
/// 固定视口高度
const VIEWPORT_HEIGHT: u32 = 768;
/// 桌面浏览器 UA（避免被识别为自动化客户端）
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 启动浏览器并创建空白页面
///
/// 返回 (浏览器, 页面, 事件处理任务)；事件处理任务在浏览器关闭时退出
pub async fn launch_browser(headless: bool) -> Result<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (headless: {})...", headless);

    let mut builder = BrowserConfig::builder()
        .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--remote-debugging-port=0",
        ])
        .arg(format!("--user-agent={}", USER_AGENT));
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 浏览器就绪");

    Ok((browser, page, handler_task))
}
