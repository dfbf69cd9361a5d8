//! 세션 토큰 처리.
//!
//! 토큰은 서버에 저장되지 않으며 유효성은 서명(과 선택적 만료)으로만 판단합니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizcard_core::User;

/// 세션 토큰 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub is_business: bool,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration. 만료 미설정 시 생략
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// 사용자 레코드에서 Claims 생성.
    pub fn for_user(user: &User, now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_business: user.is_business,
            iat: now.timestamp(),
            exp: ttl.map(|ttl| (now + ttl).timestamp()),
        }
    }
}

/// 토큰 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 디코딩 실패")]
    DecodingError,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("잘못된 토큰 형식")]
    InvalidToken,
}

/// 토큰 서명/검증 인터페이스.
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<String, JwtError>;

    fn verify(&self, token: &str) -> Result<Claims, JwtError>;
}

/// HS256 JWT 코덱.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // exp는 설정된 경우에만 검사
        validation.required_spec_claims.clear();
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(JwtError::from)
    }

    fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidToken,
                _ => JwtError::DecodingError,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec(secret: &str) -> JwtCodec {
        JwtCodec::new(&SecretString::from(secret.to_string()))
    }

    fn user() -> User {
        let mut user = User::new("owner@example.com", "hash");
        user.is_business = true;
        user
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = codec(TEST_SECRET);
        let claims = Claims::for_user(&user(), Utc::now(), None);

        let token = codec.sign(&claims).unwrap();
        let decoded = codec.verify(&token).unwrap();

        assert_eq!(decoded, claims);
        assert!(decoded.exp.is_none());
        assert!(decoded.is_business);
        assert!(!decoded.is_admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::for_user(&user(), Utc::now(), None);
        let token = codec(TEST_SECRET).sign(&claims).unwrap();

        assert!(codec("another-secret-key-that-is-long-enough").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc::now() - Duration::hours(2);
        let claims = Claims::for_user(&user(), issued, Some(Duration::minutes(30)));
        let codec = codec(TEST_SECRET);
        let token = codec.sign(&claims).unwrap();

        assert!(matches!(codec.verify(&token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token() {
        assert!(codec(TEST_SECRET).verify("not.a.token").is_err());
    }
}
