//! 설정 관리.
//!
//! TOML 파일(선택)과 `BIZCARD__` 접두사 환경 변수에서 설정을 로드합니다.
//! 예: `BIZCARD__AUTH__MAX_FAILED_ATTEMPTS=3`

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::LockoutPolicy;
use crate::error::{CoreError, CoreResult};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub audit: AuditConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8181,
            request_timeout_secs: 30,
        }
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 인메모리 저장소로 동작합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
        }
    }
}

/// 인증 및 로그인 잠금 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 키
    pub jwt_secret: String,
    /// 토큰 유효 시간 (분). `None`이면 만료 클레임을 넣지 않습니다.
    pub token_ttl_minutes: Option<i64>,
    /// 잠금까지 허용되는 연속 실패 횟수
    pub max_failed_attempts: usize,
    /// 잠금 유지 시간 (시간)
    pub block_hours: f64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-key-change-in-production".to_string(),
            token_ttl_minutes: None,
            max_failed_attempts: 5,
            block_hours: 24.0,
        }
    }
}

impl AuthConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.max_failed_attempts, self.block_hours)
    }

    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        self.token_ttl_minutes.map(chrono::Duration::minutes)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty, json, compact
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 요청 실패 감사 로그 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 일자별 로그 파일이 쌓이는 디렉터리
    pub directory: String,
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            enabled: true,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("BIZCARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// 기본 경로(`config/default.toml`)에서 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    /// TOML 문자열에서 로드합니다. 환경 변수는 적용하지 않습니다.
    pub fn from_toml_str(raw: &str) -> CoreResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.auth.max_failed_attempts == 0 {
            return Err(CoreError::InvalidInput(
                "auth.max_failed_attempts must be greater than 0".to_string(),
            ));
        }
        if !(self.auth.block_hours.is_finite() && self.auth.block_hours >= 0.0) {
            return Err(CoreError::InvalidInput(
                "auth.block_hours must be a non-negative number".to_string(),
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(CoreError::InvalidInput(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8181);
        assert_eq!(config.auth.max_failed_attempts, 5);
        assert_eq!(config.auth.block_hours, 24.0);
        assert!(config.auth.token_ttl_minutes.is_none());
        assert!(config.database.url.is_none());
        assert_eq!(config.audit.directory, "logs");
        assert_eq!(config.auth.lockout_policy(), LockoutPolicy::default());
        assert!(config.auth.token_ttl().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "another-secret"
            max_failed_attempts = 3
            token_ttl_minutes = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.max_failed_attempts, 3);
        assert_eq!(config.auth.token_ttl_minutes, Some(60));
        assert_eq!(config.auth.block_hours, 24.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [auth]
            max_failed_attempts = 0
            "#,
        );
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.auth.max_failed_attempts, 5);
    }
}
