//! # 워커 조회 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/workers/lookup?q=...`
//!
//! `q`가 정확히 8자리 숫자면 문서번호, 그 외에는 내부 코드로 봅니다.
//! 응답: `{ ok, kind, query, worker: { code, document, name }, source }`
//!
//! | 결과 | HTTP |
//! |------|------|
//! | 찾음 (캐시 또는 디렉터리) | 200 |
//! | 질의가 너무 김 | 400 `code_invalid` |
//! | 없음 | 404 |
//! | 디렉터리 장애 | 502 |

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::{LookupQuery, Resolution},
    routes::AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};

pub async fn lookup_worker(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Resolution>, AppError> {
    let q = query.q.unwrap_or_default();
    let resolution = state.resolver.resolve(&q).await?;
    Ok(Json(resolution))
}
