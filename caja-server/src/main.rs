use caja_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env();

    let log_level = std::env::var("LOG_LEVEL").ok();
    if config.log_to_file {
        config.ensure_work_dir_structure()?;
        let log_dir = config.log_dir();
        caja_server::init_logger_with_file(log_level.as_deref(), log_dir.to_str());
    } else {
        caja_server::init_logger_with_file(log_level.as_deref(), None);
    }

    tracing::info!("Caja server starting...");

    // 3. 初始化服务器状态
    let state = ServerState::initialize(&config).await?;

    // 4. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
