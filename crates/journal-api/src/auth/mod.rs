//! 인증.
//!
//! 외부에서 발급된 JWT를 검증하고 사용자 ID를 핸들러에 주입합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체
//! - [`AuthUser`]: 검증된 사용자 ID 추출기
//! - 토큰 생성/검증 함수

mod jwt;
mod middleware;

pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use middleware::{AuthError, AuthUser, JwtConfig};
