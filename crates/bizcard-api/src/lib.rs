//! 명함 디렉터리 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (사용자, 명함)
//! - JWT 인증과 로그인 잠금
//! - 권한 추출기 체인 (관리자/본인/사업자)
//! - 요청 실패 기록 (일자별 파일)
//! - 헬스 체크 및 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰, 비밀번호, 로그인 서비스, 권한 추출기
//! - [`repository`]: 사용자/명함 저장소
//! - [`observability`]: 실패 기록 싱크와 미들웨어
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{hash_password, verify_password, AuthError, AuthService, Claims, Principal};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
