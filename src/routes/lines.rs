//! # 보고서 라인 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/reports/{id}/lines | `list_lines` | 세션의 라인 목록 |
//! | POST | /api/v1/reports/{id}/lines | `create_line` | 라인 생성 (미완료 라인이 있으면 이어서 완료) |
//! | PATCH | /api/v1/lines/{id} | `update_line` | 부분 수정 |
//! | DELETE | /api/v1/lines/{id} | `delete_line` | 삭제 |
//!
//! 라인을 바꾸는 모든 요청은 같은 트랜잭션 안에서 세션 상태를 다시 계산하고,
//! 응답에 `session_status`를 담아 돌려줍니다.

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::line_engine,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// `GET /api/v1/reports/{id}/lines` → `{ "items": [...] }`
pub async fn list_lines(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let items = line_engine::list_lines(&state.pool, &user, &session_id).await?;
    Ok(Json(json!({ "items": items })))
}

/// 라인을 생성합니다.
///
/// 같은 워커의 미완료 라인을 이어서 채운 경우(`continued: true`)는 200,
/// 새 행을 만든 경우는 201입니다.
pub async fn create_line(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
    Json(req): Json<CreateLineRequest>,
) -> Result<(StatusCode, Json<LineOutcome>), AppError> {
    let outcome =
        line_engine::create_line(&state.pool, &state.resolver, &user, &session_id, req).await?;

    let status = if outcome.continued {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

/// `PATCH /api/v1/lines/{id}`
///
/// 필드를 생략하면 그대로 두고, 지우려면 `clear` 목록에 이름을 넣습니다.
pub async fn update_line(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<String>,
    Json(req): Json<UpdateLineRequest>,
) -> Result<Json<LineOutcome>, AppError> {
    let outcome = line_engine::update_line(&state.pool, &user, &line_id, req).await?;
    Ok(Json(outcome))
}

/// `DELETE /api/v1/lines/{id}` → `{ "deleted": id, "session_id": ..., "session_status": ... }`
pub async fn delete_line(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (session_id, session_status) =
        line_engine::delete_line(&state.pool, &user, &line_id).await?;

    Ok(Json(json!({
        "deleted": line_id,
        "session_id": session_id,
        "session_status": session_status
    })))
}
