//! # 구역(Area) 참조 데이터 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/areas` → 활성 구역 전체
//! - `GET /api/v1/areas?type=QUICK_COUNT` → 해당 보고서 종류에서 쓸 수 있는 구역만

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{AreaQuery, ReportType},
    routes::AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

/// 구역 목록을 조회합니다.
///
/// `type`은 세션과 같은 별칭(`APOYO_HORAS` 등)을 받습니다.
pub async fn list_areas(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Value>, AppError> {
    let report_type = query
        .report_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<ReportType>)
        .transpose()
        .map_err(|_| AppError::validation("type", "unknown report type"))?;

    let areas = db::list_areas(&state.pool, report_type).await?;
    Ok(Json(json!({ "areas": areas })))
}
