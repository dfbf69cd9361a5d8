//! 애플리케이션 공유 상태.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::SecretString;

use bizcard_core::AuthConfig;

use crate::auth::{AuthService, JwtCodec, TokenCodec};
use crate::observability::ObservabilitySink;
use crate::repository::{CardStore, UserStore};

/// 모든 핸들러와 추출기가 공유하는 상태.
///
/// 라우터에는 `Arc<AppState>`로 주입됩니다.
pub struct AppState {
    /// 사용자 자격증명 저장소
    pub users: Arc<dyn UserStore>,

    pub cards: Arc<dyn CardStore>,

    /// 세션 토큰 서명/검증
    pub tokens: Arc<dyn TokenCodec>,

    pub auth: Arc<AuthService>,

    /// 실패 기록 싱크 (일자별 파일 또는 tracing)
    pub sink: Arc<dyn ObservabilitySink>,

    /// `/metrics` 렌더링 핸들. 레코더 미설치 시 `None`
    pub metrics: Option<PrometheusHandle>,

    pub started_at: chrono::DateTime<chrono::Utc>,

    pub version: String,
}

impl AppState {
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        cards: Arc<dyn CardStore>,
        sink: Arc<dyn ObservabilitySink>,
    ) -> Self {
        let tokens: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(&SecretString::from(
            config.jwt_secret.clone(),
        )));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            tokens.clone(),
            config.lockout_policy(),
            config.token_ttl(),
        ));

        Self {
            users,
            cards,
            tokens,
            auth,
            sink,
            metrics: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 저장소와 메모리 싱크를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::observability::MemorySink;
    use crate::repository::{MemoryCardStore, MemoryUserStore};

    AppState::new(
        &AuthConfig::default(),
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryCardStore::new()),
        Arc::new(MemorySink::new()),
    )
}
