use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::{DbService, seed};
use crate::services::{PermissionLookup, SqlitePermissionLookup};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Arc<Config> | 配置项 (不可变) |
/// | pool | SqlitePool | 数据库连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | permission_lookup | Arc<dyn PermissionLookup> | 授权网关的权限数据源 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    permission_lookup: Arc<dyn PermissionLookup>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("jwt_service", &self.jwt_service)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Assemble state over an open pool, backed by the SQLite permission lookup
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let permission_lookup = Arc::new(SqlitePermissionLookup::new(pool.clone()));

        Self {
            config: Arc::new(config),
            pool,
            jwt_service,
            permission_lookup,
        }
    }

    /// 初始化服务器状态
    ///
    /// 打开数据库、执行迁移并写入默认权限目录和管理员账号。
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        seed::run(&db.pool, config)
            .await
            .map_err(|e| anyhow::anyhow!("Seeding failed: {e}"))?;

        Ok(Self::new(config.clone(), db.pool))
    }

    /// Swap the permission source, e.g. for a test double
    pub fn with_permission_lookup(mut self, lookup: Arc<dyn PermissionLookup>) -> Self {
        self.permission_lookup = lookup;
        self
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn permission_lookup(&self) -> &dyn PermissionLookup {
        self.permission_lookup.as_ref()
    }
}
