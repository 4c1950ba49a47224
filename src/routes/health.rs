//! # 헬스체크(Health Check) 핸들러
//!
//! 서버와 외부 워커 디렉터리가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok" }`
//! - `GET /api/v1/health/workers` → `{ "ok": true, "directory": "up" }` (실패 시 502)
//!
//! 주로 다음 용도로 사용됩니다:
//! - 로드밸런서의 서버 상태 확인
//! - 모니터링 시스템에서 디렉터리 연결 상태 추적

use crate::{error::AppError, routes::AppState, services::directory::DirectoryLookup};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// `GET /health`: 서버 상태를 확인합니다.
///
/// Extractor 없이 작동하는 가장 단순한 형태입니다.
/// `Result`를 사용하지 않으므로 이 핸들러는 실패하지 않습니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// `GET /health/workers`: 설정된 코드로 디렉터리를 한 번 조회합니다.
///
/// 워커가 있든 없든 디렉터리가 응답했으면 정상입니다.
/// 전송/프로토콜 실패만 502로 돌려줍니다. 캐시는 거치지 않습니다.
pub async fn workers_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let lookup = state
        .resolver
        .directory()
        .lookup_by_code(&state.healthcheck_code)
        .await?;

    let found = matches!(lookup, DirectoryLookup::Found(_));
    tracing::debug!(code = %state.healthcheck_code, found, "Directory health check");

    Ok(Json(json!({
        "ok": true,
        "directory": "up",
        "found": found
    })))
}
