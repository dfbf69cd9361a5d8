//! 인증 서비스.
//!
//! 로그인 한 번의 처리 순서:
//!
//! 1. 이메일로 사용자 조회 (없으면 `InvalidCredentials`)
//! 2. 잠겨 있으면 잠금 해제 시도 (해제 안 되면 `AccountLocked`)
//! 3. 비밀번호 비교 (불일치 시 실패 기록, 한도 도달 시 `AccountLocked`)
//! 4. 성공 시 실패 이력 초기화 후 토큰 발급
//!
//! 잠금 상태를 바꾸는 모든 분기는 반환 전에 저장합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use bizcard_core::{FailureDecision, LockoutPolicy, UnblockDecision, User};

use super::jwt::{Claims, TokenCodec};
use super::password::{verify_password, PasswordError};
use super::AuthError;
use crate::metrics::record_login;
use crate::repository::UserStore;

/// 로그인 성공 결과.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// 인증 서비스.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenCodec>,
    policy: LockoutPolicy,
    token_ttl: Option<Duration>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenCodec>,
        policy: LockoutPolicy,
        token_ttl: Option<Duration>,
    ) -> Self {
        Self {
            users,
            tokens,
            policy,
            token_ttl,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// 자격 증명을 검증하고 세션 토큰을 발급합니다.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let Some(mut user) = self.users.find_by_email(email).await? else {
            record_login("unknown_email");
            return Err(AuthError::InvalidCredentials);
        };

        if LockoutPolicy::is_currently_blocked(&user) {
            match self.policy.attempt_unblock(&mut user, now) {
                UnblockDecision::StillBlocked => {
                    warn!(user_id = %user.id, "Login rejected: account locked");
                    record_login("locked");
                    return Err(self.locked(&user, now));
                }
                UnblockDecision::Unblocked => {
                    self.users.save(&user).await?;
                    info!(user_id = %user.id, "Account unblocked after lockout window");
                }
            }
        }

        match verify_password(password, &user.password_hash) {
            Ok(()) => {}
            Err(PasswordError::VerificationFailed) => {
                let decision = self.policy.record_failure(&mut user, now);
                self.users.save(&user).await?;

                return match decision {
                    FailureDecision::NowBlocked => {
                        warn!(
                            user_id = %user.id,
                            attempts = user.failed_attempts().len(),
                            "Account locked after repeated failures"
                        );
                        record_login("now_blocked");
                        Err(self.locked(&user, now))
                    }
                    FailureDecision::AttemptRecorded => {
                        info!(
                            user_id = %user.id,
                            attempts = user.failed_attempts().len(),
                            "Login failed: wrong password"
                        );
                        record_login("wrong_password");
                        Err(AuthError::InvalidCredentials)
                    }
                };
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                record_login("error");
                return Err(AuthError::Internal(e.to_string()));
            }
        }

        LockoutPolicy::clear_failures(&mut user);
        let user = self.users.save(&user).await?;

        let claims = Claims::for_user(&user, now, self.token_ttl);
        let token = self.tokens.sign(&claims)?;

        info!(user_id = %user.id, "Login succeeded");
        record_login("success");

        Ok(LoginOutcome { token, user })
    }

    fn locked(&self, user: &User, now: DateTime<Utc>) -> AuthError {
        AuthError::AccountLocked {
            block_hours: self.policy.block_hours(),
            remaining_hours: self
                .policy
                .remaining_block_hours(user, now)
                .unwrap_or(self.policy.block_hours()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{hash_password, JwtCodec};
    use crate::repository::MemoryUserStore;
    use secrecy::SecretString;

    const PASSWORD: &str = "s3cret-pass";

    struct Fixture {
        users: Arc<MemoryUserStore>,
        tokens: Arc<JwtCodec>,
        service: AuthService,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(JwtCodec::new(&SecretString::from(
            "service-test-secret-0123456789abcdef".to_string(),
        )));
        let service = AuthService::new(
            users.clone(),
            tokens.clone(),
            LockoutPolicy::new(5, 24.0),
            None,
        );
        Fixture {
            users,
            tokens,
            service,
        }
    }

    async fn seed(users: &MemoryUserStore) -> User {
        let user = User::new("lock@example.com", hash_password(PASSWORD).unwrap());
        users.save(&user).await.unwrap()
    }

    async fn fail_times(fx: &Fixture, times: usize, at: DateTime<Utc>) {
        for _ in 0..times {
            let _ = fx.service.login("lock@example.com", "wrong", at).await;
        }
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let fx = fixture();
        let result = fx.service.login("nobody@example.com", PASSWORD, Utc::now()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_success_clears_history_and_signs_token() {
        let fx = fixture();
        let user = seed(&fx.users).await;
        let now = Utc::now();
        fail_times(&fx, 2, now).await;

        let outcome = fx.service.login("lock@example.com", PASSWORD, now).await.unwrap();

        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.failed_attempts().is_empty());
        assert!(!stored.is_blocked());

        let claims = fx.tokens.verify(&outcome.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "lock@example.com");
    }

    #[tokio::test]
    async fn test_fifth_failure_locks_account() {
        let fx = fixture();
        let user = seed(&fx.users).await;
        let now = Utc::now();
        fail_times(&fx, 4, now).await;

        let result = fx.service.login("lock@example.com", "wrong", now).await;
        assert!(matches!(result, Err(AuthError::AccountLocked { .. })));

        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_blocked());
        assert_eq!(stored.failed_attempts().len(), 5);
    }

    #[tokio::test]
    async fn test_locked_account_rejects_correct_password() {
        let fx = fixture();
        seed(&fx.users).await;
        let now = Utc::now();
        fail_times(&fx, 5, now - Duration::hours(1)).await;

        let result = fx.service.login("lock@example.com", PASSWORD, now).await;
        match result {
            Err(AuthError::AccountLocked {
                block_hours,
                remaining_hours,
            }) => {
                assert_eq!(block_hours, 24.0);
                assert!((remaining_hours - 23.0).abs() < 1e-6);
            }
            other => panic!("expected AccountLocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unblocks_after_window() {
        let fx = fixture();
        let user = seed(&fx.users).await;
        let now = Utc::now();
        fail_times(&fx, 5, now - Duration::hours(25)).await;

        let outcome = fx.service.login("lock@example.com", PASSWORD, now).await;
        assert!(outcome.is_ok());

        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_blocked());
        assert!(stored.failed_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_after_unblock_starts_fresh_count() {
        let fx = fixture();
        let user = seed(&fx.users).await;
        let now = Utc::now();
        fail_times(&fx, 5, now - Duration::hours(30)).await;

        let result = fx.service.login("lock@example.com", "wrong", now).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_blocked());
        assert_eq!(stored.failed_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_token_ttl_sets_exp() {
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(JwtCodec::new(&SecretString::from(
            "service-test-secret-0123456789abcdef".to_string(),
        )));
        let service = AuthService::new(
            users.clone(),
            tokens.clone(),
            LockoutPolicy::default(),
            Some(Duration::minutes(60)),
        );
        seed(&users).await;

        let now = Utc::now();
        let outcome = service.login("lock@example.com", PASSWORD, now).await.unwrap();
        let claims = tokens.verify(&outcome.token).unwrap();
        assert_eq!(claims.exp, Some((now + Duration::minutes(60)).timestamp()));
    }
}
