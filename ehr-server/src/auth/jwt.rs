//! JWT 令牌服务
//!
//! 处理 JWT 令牌的生成、验证和解析。
//!
//! Tokens identify a user and nothing more. Permissions are never embedded;
//! the authorization gate resolves them from the database on every request.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum secret length accepted from `JWT_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (应至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl JwtConfig {
    /// Load from `JWT_*` environment variables.
    ///
    /// Without `JWT_SECRET` a random printable secret is generated, but only
    /// when `allow_generated_secret` is set (development). Otherwise a missing
    /// or short secret is a configuration error.
    pub fn from_env(allow_generated_secret: bool) -> Result<Self, JwtError> {
        let secret = load_jwt_secret(allow_generated_secret)?;
        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440), // 默认 24 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ehr-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ehr-clients".to_string()),
        })
    }
}

impl Default for JwtConfig {
    /// Development defaults with a freshly generated secret
    fn default() -> Self {
        Self {
            secret: generate_secure_printable_jwt_secret(),
            expiration_minutes: 1440,
            issuer: "ehr-server".to_string(),
            audience: "ehr-clients".to_string(),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject)
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// 生成可打印的安全 JWT 密钥 (用于开发环境)
pub fn generate_secure_printable_jwt_secret() -> String {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}|;:,.<>?";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    if rng.fill(&mut bytes).is_err() {
        // 如果随机数生成失败，使用固定的开发密钥
        return "EhrServerDevelopmentOnlySecretKeyDoNotUse!".to_string();
    }

    bytes
        .iter()
        .map(|b| ALLOWED[(*b as usize) % ALLOWED.len()] as char)
        .collect()
}

/// 从环境变量安全地加载 JWT 密钥
fn load_jwt_secret(allow_generated_secret: bool) -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < MIN_SECRET_LEN {
                return Err(JwtError::ConfigError(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
            Ok(secret)
        }
        Err(_) if allow_generated_secret => {
            tracing::warn!("JWT_SECRET not set! Generating temporary key for development.");
            Ok(generate_secure_printable_jwt_secret())
        }
        Err(_) => Err(JwtError::ConfigError(
            "JWT_SECRET environment variable must be set outside development".to_string(),
        )),
    }
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("expiration_minutes", &self.config.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// 使用指定配置创建新的 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为用户生成新令牌
    pub fn generate_token(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Token lifetime in seconds, as reported to clients at login
    pub fn expires_in_seconds(&self) -> i64 {
        self.config.expiration_minutes * 60
    }
}

/// 当前用户上下文 (从 JWT Claims 解析)
///
/// 由认证中间件创建，注入到请求扩展。Carries identity only; what the user
/// may do is decided by the gate against live role data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// 用户 ID
    pub id: i64,
    /// 用户名
    pub username: String,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    /// Fails when `sub` does not hold a user id
    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .trim()
            .parse::<i64>()
            .map_err(|_| JwtError::InvalidToken(format!("subject '{}' is not a user id", claims.sub)))?;

        Ok(Self {
            id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "unit-test-secret-that-is-long-enough-0123".to_string(),
            expiration_minutes: 60,
            issuer: "ehr-server".to_string(),
            audience: "ehr-clients".to_string(),
        })
    }

    fn claims_for(sub: &str, exp_offset_secs: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: sub.to_string(),
            username: "nurse".to_string(),
            exp: now + exp_offset_secs,
            iat: now,
            iss: "ehr-server".to_string(),
            aud: "ehr-clients".to_string(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = test_service();
        let token = service
            .generate_token(42, "john_doe")
            .expect("Failed to generate test token");

        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "john_doe");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let token = service.encode_claims(&claims_for("1", -3600)).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtService::with_config(JwtConfig {
            secret: "a-completely-different-secret-value-9876".to_string(),
            ..test_service().config.clone()
        });
        let token = other.generate_token(1, "mallory").unwrap();

        assert!(matches!(
            test_service().validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let service = test_service();
        let mut claims = claims_for("1", 3600);
        claims.aud = "someone-else".to_string();
        let token = service.encode_claims(&claims).unwrap();

        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_current_user_requires_numeric_subject() {
        let user = CurrentUser::try_from(claims_for("7", 60)).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "nurse");

        assert!(CurrentUser::try_from(claims_for("not-a-number", 60)).is_err());
        assert!(CurrentUser::try_from(claims_for("", 60)).is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_generated_secret_is_printable_and_long() {
        let a = generate_secure_printable_jwt_secret();
        let b = generate_secure_printable_jwt_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_graphic()));
        assert_ne!(a, b);
    }
}
