//! # Bizcard Core
//!
//! 명함 디렉터리 서비스의 핵심 도메인 모델과 정책을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자/명함 도메인 모델
//! - 로그인 잠금 정책 (순수 결정 로직)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
