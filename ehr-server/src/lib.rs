//! EHR Access Server - 电子病历系统的访问控制服务
//!
//! # 架构概述
//!
//! Every protected endpoint declares a required (screen, action) pair. A
//! request passes only if the caller is authenticated and their role grants
//! that pair at the moment of the request.
//!
//! - **认证** (`auth`): JWT + Argon2, 权限网关
//! - **数据库** (`db`): SQLite (sqlx), 权限目录、角色、用户
//! - **服务** (`services`): 权限查询
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! ehr-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── auth/          # JWT 认证、密码、权限网关
//! ├── services/      # 权限查询 (PermissionLookup)
//! ├── api/           # HTTP 路由和处理器
//! ├── middleware/    # 请求日志
//! ├── utils/         # 日志、校验、响应工具
//! └── db/            # 连接池、迁移、种子数据、仓储
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod middleware;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use services::{PermissionLookup, SqlitePermissionLookup};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
 ______ _    _ _____
|  ____| |  | |  __ \
| |__  | |__| | |__) |
|  __| |  __  |  _  /
| |____| |  | | | \ \
|______|_|  |_|_|  \_\
      access server v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
