//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! ## 에러 분류
//! | variant | HTTP | 재시도 |
//! |---------|------|--------|
//! | `Validation`, `InvalidCode` | 400 | 안 함 |
//! | `NotFound` | 404 | 안 함 |
//! | `Conflict` | 409 | 안 함 |
//! | `DirectoryUnavailable` | 502 | 호출자가 결정 |
//! | `Internal`, `Database` | 500 | - |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 필드 누락/형식 오류, 잘못된 시간 구간 (HTTP 400)
    /// `field`에는 문제가 된 필드 이름이 들어갑니다.
    #[error("Invalid `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// 워커 조회 질의가 허용 길이를 넘음 (HTTP 400, 코드 `code_invalid`)
    #[error("Invalid worker code: {0}")]
    InvalidCode(String),

    /// 세션/라인/크루/구역/워커가 없거나 비활성 (HTTP 404)
    /// 문자열은 어떤 리소스인지를 나타냅니다. (예: "report", "worker")
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 리소스 충돌 (HTTP 409): 예: 같은 크루에 같은 워커 중복 배정
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 외부 워커 디렉터리의 전송/프로토콜 실패 (HTTP 502)
    /// NotFound와 절대 섞지 않습니다. "워커 없음"과 "확인 불가"는 다른 의미입니다.
    #[error("Worker directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// `Validation` 에러를 짧게 만드는 헬퍼
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    /// 고유 제약(UNIQUE) 위반인지 확인합니다.
    /// 멱등 세션 생성에서 경합을 감지할 때 사용합니다.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation { ref field, .. } => {
                tracing::debug!(field = %field, "Validation failed: {}", self);
                (StatusCode::BAD_REQUEST, "validation_error", self.to_string())
            }
            AppError::InvalidCode(_) => {
                (StatusCode::BAD_REQUEST, "code_invalid", self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::DirectoryUnavailable(ref msg) => {
                tracing::warn!("Worker directory unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "directory_unavailable",
                    "The worker directory could not be reached".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "report not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_the_field() {
        let err = AppError::validation("task_description", "required for SANITATION");
        assert_eq!(
            err.to_string(),
            "Invalid `task_description`: required for SANITATION"
        );
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (AppError::validation("start_time", "x"), StatusCode::BAD_REQUEST),
            (AppError::InvalidCode("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("worker"), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AppError::DirectoryUnavailable("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
