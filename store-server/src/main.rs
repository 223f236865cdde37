use std::sync::Arc;
use store_server::{AppState, BackgroundTasks, Config, LogMailer, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境与日志
    dotenv::dotenv().ok();
    init_logger();

    tracing::info!("🛒 Store server starting...");

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 初始化状态（数据库、迁移、设置缓存、通知队列）
    let (state, receiver) = AppState::initialize(&config).await?;

    // 4. 启动后台任务（通知 worker、reaper、库存监控）
    let mut tasks = BackgroundTasks::new();
    state.start_background_tasks(&mut tasks, receiver, Arc::new(LogMailer));

    // 5. 等待关闭信号，优雅退出
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tasks.shutdown().await;

    Ok(())
}
