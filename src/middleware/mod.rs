//! # 미들웨어 모듈
//!
//! - `auth`: `Authorization: Bearer <token>` 헤더를 검증하여 `AuthUser`를 추출하는 추출기

pub mod auth;
