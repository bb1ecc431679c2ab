use crate::auth::{JwtConfig, JwtError};

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (`.env` 由 `dotenv` 预先加载)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | ehr.db | SQLite 数据库文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志目录 (设置后按天滚动写文件) |
/// | LOG_JSON | false | JSON 格式日志 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | JWT_SECRET | - | JWT 密钥 (≥32 字符，非开发环境必填) |
/// | JWT_EXPIRATION_MINUTES | 1440 | 令牌有效期 |
/// | JWT_ISSUER / JWT_AUDIENCE | ehr-server / ehr-clients | 令牌签发者/受众 |
/// | ADMIN_USERNAME / ADMIN_PASSWORD | - | 启动时创建的管理员账号 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/data/ehr.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库路径 (`:memory:` 使用内存库)
    pub database_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// JSON 格式日志
    pub log_json: bool,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// Bootstrap administrator, created at startup when both are set
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值。Fails only on an unusable JWT secret.
    pub fn from_env() -> Result<Self, JwtError> {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(environment == "development")?;

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "ehr.db".into()),
            environment,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: non_empty_var("LOG_DIR"),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            jwt,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        })
    }

    /// Bootstrap admin credentials, if both halves are configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

impl Default for Config {
    /// Development defaults with an in-memory database
    fn default() -> Self {
        Self {
            http_port: 3000,
            database_path: ":memory:".into(),
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            log_json: false,
            request_timeout_ms: 30000,
            jwt: JwtConfig::default(),
            admin_username: None,
            admin_password: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_development_in_memory() {
        let config = Config::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.database_path, ":memory:");
        assert!(config.jwt.secret.len() >= 32);
    }

    #[test]
    fn test_bootstrap_admin_needs_both_halves() {
        let mut config = Config::default();
        assert!(config.bootstrap_admin().is_none());

        config.admin_username = Some("admin".into());
        assert!(config.bootstrap_admin().is_none());

        config.admin_password = Some("changeme".into());
        assert_eq!(config.bootstrap_admin(), Some(("admin", "changeme")));
    }
}
