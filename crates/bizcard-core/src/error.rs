//! 코어 에러 타입.

use thiserror::Error;

/// 코어 크레이트 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 로드 실패
    #[error("설정 에러: {0}")]
    Config(#[from] config::ConfigError),

    /// 로깅 초기화 실패
    #[error("로깅 초기화 실패: {0}")]
    Logging(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 코어 작업용 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
