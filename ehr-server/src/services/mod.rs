//! 服务层 - 服务器核心服务
//!
//! # 服务列表
//!
//! - [`PermissionLookup`] - 用户有效权限解析 (授权网关的数据源)

pub mod permission_lookup;

pub use permission_lookup::{PermissionLookup, SqlitePermissionLookup};
