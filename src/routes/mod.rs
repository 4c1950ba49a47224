//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `areas`: 구역 참조 데이터 조회
//! - `crews`: 크루 생성/수정, 작업자 배정, 요약
//! - `health`: 서버/워커 디렉터리 상태 확인
//! - `lines`: 보고서 라인 생성/수정/삭제
//! - `reports`: 보고서 세션 열기, 조회, 목록, 헤더 수정, 활성화
//! - `workers`: 워커 조회

pub mod areas;
pub mod crews;
pub mod health;
pub mod lines;
pub mod reports;
pub mod workers;

use crate::services::resolver::WorkerResolver;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::SqlitePool;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// `SqlitePool`과 `WorkerResolver`는 내부적으로 Arc를 쓰므로 clone 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀
    pub pool: SqlitePool,
    /// 액세스 토큰 검증용 비밀키
    pub jwt_secret: String,
    /// 워커 조회기 (캐시 + 외부 디렉터리)
    pub resolver: WorkerResolver,
    /// SUPPORT_HOURS / SANITATION 세션 만료 시간
    pub session_ttl_hours: i64,
    /// `/health/workers`에서 조회할 워커 코드
    pub healthcheck_code: String,
}

/// `/api/v1` 아래의 모든 라우트를 조립합니다.
///
/// CORS와 요청 로깅 레이어는 `main`에서 바깥에 씌웁니다.
pub fn api_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // 헬스체크
        .route("/health", get(health::health_check))
        .route("/health/workers", get(health::workers_health))
        // 참조 데이터와 워커 조회
        .route("/areas", get(areas::list_areas))
        .route("/workers/lookup", get(workers::lookup_worker))
        // 보고서 세션
        .route("/reports", get(reports::list_reports).post(reports::open_report))
        .route("/reports/{id}", get(reports::get_report).patch(reports::update_report))
        .route("/reports/{id}/active", patch(reports::set_report_active))
        // 라인
        .route("/reports/{id}/lines", get(lines::list_lines).post(lines::create_line))
        .route("/lines/{id}", patch(lines::update_line).delete(lines::delete_line))
        // 크루
        .route("/reports/{id}/crews", get(crews::list_crews).post(crews::create_crew))
        .route("/reports/{id}/crews/summary", get(crews::crew_summary))
        .route("/crews/{id}", patch(crews::update_crew))
        .route("/crews/{id}/workers", post(crews::assign_worker))
        .route("/crews/{id}/workers/{code}", delete(crews::remove_worker))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
