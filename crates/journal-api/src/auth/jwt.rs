//! JWT 토큰 처리.
//!
//! 토큰은 외부 인증 공급자가 발급합니다. 이 서버는 HS256 서명과 만료만 검증하고
//! `sub` 클레임을 사용자 ID로 사용합니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID (UUID 문자열)
    pub sub: String,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// 새로운 Claims 생성.
    ///
    /// # Arguments
    ///
    /// * `user_id` - 사용자 ID
    /// * `expires_in_minutes` - 만료 시간 (분)
    pub fn new(user_id: Uuid, expires_in_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    /// 토큰이 만료되었는지 확인.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// `sub` 클레임을 사용자 ID로 해석합니다.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject)
    }
}

/// JWT 토큰 처리 에러.
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
    #[error("사용자 ID가 올바르지 않습니다")]
    InvalidSubject,
}

/// Access Token 생성.
///
/// 운영 환경에서는 외부 공급자가 발급하며, 개발/테스트 용도로 제공됩니다.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::from)
}

/// JWT 토큰 디코딩 및 검증.
pub fn decode_token(token: &str, secret: &str) -> Result<TokenData<Claims>, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidToken,
        _ => JwtError::DecodingError,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    #[test]
    fn test_create_and_decode_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, 60);

        let token = create_token(&claims, TEST_SECRET).unwrap();
        assert!(!token.is_empty());

        let decoded = decode_token(&token, TEST_SECRET).unwrap();
        assert_eq!(decoded.claims.user_id().unwrap(), user_id);
        assert!(!decoded.claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), 60);
        let token = create_token(&claims, TEST_SECRET).unwrap();

        assert!(decode_token(&token, "another-secret-key-that-does-not-match").is_err());
    }

    #[test]
    fn test_expired_token() {
        // 기본 leeway(60초)보다 충분히 과거
        let claims = Claims::new(Uuid::new_v4(), -10);
        let token = create_token(&claims, TEST_SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, TEST_SECRET),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_non_uuid_subject() {
        let claims = Claims {
            sub: "admin".to_string(),
            iat: 0,
            exp: 0,
            jti: None,
        };
        assert!(matches!(claims.user_id(), Err(JwtError::InvalidSubject)));
    }
}
