use ehr_server::{Config, Server, cleanup_old_logs, init_logger_with_file, print_banner};

/// Rolled log files older than this are removed at startup
const LOG_RETENTION_DAYS: u64 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置 (JWT_SECRET 缺失时生产环境直接失败)
    let config = Config::from_env()?;

    // 3. 日志
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );

    if let Some(dir) = config.log_dir.as_deref() {
        match cleanup_old_logs(dir, LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Old log files removed"),
            Err(e) => tracing::warn!("Log cleanup failed: {}", e),
        }
    }

    print_banner();
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        database = %config.database_path,
        "EHR access server starting..."
    );

    // 4. 启动 HTTP 服务器 (打开数据库、迁移、种子数据)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
