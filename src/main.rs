use anyhow::Result;
use tracing::info;

use quiz_auto_answer::api::{router, AppState};
use quiz_auto_answer::{logger, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    info!("{}", "=".repeat(60));
    info!("🚀 Quiz Auto Answer 服务启动");
    info!("   监听端口: {}", config.server_port);
    info!("   推理端点: {}", config.llm_api_base_url);
    info!("   推理模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(config);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✓ 服务就绪: http://{}", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
