//! # 크루 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/reports/{id}/crews | `list_crews` | 세션의 크루와 배정 작업자 |
//! | POST | /api/v1/reports/{id}/crews | `create_crew` | 크루 생성 |
//! | GET | /api/v1/reports/{id}/crews/summary | `crew_summary` | 종류별 kg, 수율, 처리량 |
//! | PATCH | /api/v1/crews/{id} | `update_crew` | 이름/종료 시각/kg 수정 |
//! | POST | /api/v1/crews/{id}/workers | `assign_worker` | 작업자 배정 |
//! | DELETE | /api/v1/crews/{id}/workers/{code} | `remove_worker` | 배정 해제 |

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::crews,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn list_crews(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let items = crews::list_crews(&state.pool, &user, &session_id).await?;
    Ok(Json(json!({ "items": items })))
}

/// 크루를 생성합니다. 성공 시 201 Created.
///
/// `support_scope: "CREW"`이면 같은 세션의 FILLETING 크루를
/// `filleting_crew_id`로 가리켜야 합니다.
pub async fn create_crew(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
    Json(req): Json<CreateCrewRequest>,
) -> Result<(StatusCode, Json<Crew>), AppError> {
    let crew = crews::create_crew(&state.pool, &user, &session_id, req).await?;
    Ok((StatusCode::CREATED, Json(crew)))
}

pub async fn crew_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<CrewSummary>, AppError> {
    let summary = crews::summary(&state.pool, &user, &session_id).await?;
    Ok(Json(summary))
}

/// `PATCH /api/v1/crews/{id}` + `{ name?, end_time?, production_kg?, clear? }`
pub async fn update_crew(
    State(state): State<AppState>,
    user: AuthUser,
    Path(crew_id): Path<String>,
    Json(req): Json<UpdateCrewRequest>,
) -> Result<Json<Crew>, AppError> {
    let crew = crews::update_crew(&state.pool, &user, &crew_id, req).await?;
    Ok(Json(crew))
}

/// 작업자를 배정합니다. 같은 크루에 이미 있으면 409 Conflict.
pub async fn assign_worker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(crew_id): Path<String>,
    Json(req): Json<AssignWorkerRequest>,
) -> Result<(StatusCode, Json<CrewWorker>), AppError> {
    let assignment =
        crews::assign_worker(&state.pool, &state.resolver, &user, &crew_id, req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// 배정을 해제합니다. 성공 시 204 No Content (본문 없음).
///
/// `Path((crew_id, code))`: 경로 변수 두 개를 튜플로 추출합니다.
pub async fn remove_worker(
    State(state): State<AppState>,
    user: AuthUser,
    Path((crew_id, code)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    crews::remove_worker(&state.pool, &user, &crew_id, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}
