//! # 보고서 세션 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/reports | `open_report` | 세션 열기 (있으면 재사용) |
//! | GET | /api/v1/reports | `list_reports` | 필터/페이지 목록 |
//! | GET | /api/v1/reports/{id} | `get_report` | 단일 세션 |
//! | PATCH | /api/v1/reports/{id} | `update_report` | 헤더(날짜, 교대, 구역, 메모) 수정 |
//! | PATCH | /api/v1/reports/{id}/active | `set_report_active` | 활성/비활성 전환 |
//!
//! 모든 핸들러는 `AuthUser` 추출자로 호출자를 확인합니다.
//! 다른 사람의 세션은 권한 없는 호출자에게 404로 보입니다.

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::report_state,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// 세션을 열거나 기존 세션을 돌려줍니다.
///
/// `POST /api/v1/reports` + `{ report_date, shift, report_type, area_id?, notes? }`
///
/// 새로 만들었으면 201, 같은 튜플의 열린 세션을 재사용했으면 200입니다.
/// 응답: `{ "session": {...}, "created": bool }`
pub async fn open_report(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<OpenReportRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let outcome =
        report_state::open_or_create(&state.pool, &user, req, state.session_ttl_hours).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(json!({
            "session": outcome.session,
            "created": outcome.created
        })),
    ))
}

/// `GET /api/v1/reports?from=&to=&type=&shift=&area_id=&creator_id=&active=&q=&page=&limit=&order_by=&dir=`
pub async fn list_reports(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<ReportPage>, AppError> {
    let page = report_state::list(&state.pool, &user, query).await?;
    Ok(Json(page))
}

pub async fn get_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReportSession>, AppError> {
    let session = report_state::get(&state.pool, &user, &id).await?;
    Ok(Json(session))
}

/// 세션 헤더를 수정합니다.
///
/// `PATCH /api/v1/reports/{id}` + `{ report_date?, shift?, area_id?, notes?, clear?: ["notes"] }`
pub async fn update_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateReportRequest>,
) -> Result<Json<ReportSession>, AppError> {
    let session = report_state::update_header(&state.pool, &user, &id, req).await?;
    Ok(Json(session))
}

/// `PATCH /api/v1/reports/{id}/active` + `{ "active": false }`
pub async fn set_report_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ReportSession>, AppError> {
    let session = report_state::set_active(&state.pool, &user, &id, req.active).await?;
    Ok(Json(session))
}
