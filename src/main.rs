//! # Trabunda 웹 서버 진입점
//!
//! 교대(shift) 단위 작업 보고서 서버의 **시작점(entry point)**입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성
//! 4. 데이터베이스 마이그레이션 실행
//! 5. 외부 워커 디렉터리 클라이언트와 조회기 생성
//! 6. API 라우터 설정
//! 7. HTTP 서버 시작

// ── 모듈 선언 ──
// Rust에서는 파일 시스템 구조가 곧 모듈 구조입니다.
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

// 테스트 전용 헬퍼 (메모리 DB, 가짜 디렉터리)
#[cfg(test)]
mod test_support;

use anyhow::Result; // 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use config::Config;
use routes::AppState;
use services::{directory::HttpWorkerDirectory, resolver::WorkerResolver};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::{str::FromStr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer}, // CORS(Cross-Origin Resource Sharing) 설정
    trace::TraceLayer,      // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 trabunda, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trabunda=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting Trabunda server on {}:{}", config.host, config.port);

    // ── 4단계: SQLite 연결 풀 생성 ──
    // busy_timeout: 다른 연결이 쓰기 잠금을 쥐고 있으면 바로 실패하지 않고 기다립니다.
    // WAL: 쓰기 중에도 읽기가 막히지 않습니다.
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(config.database_busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    tracing::debug!(
        busy_timeout_ms = config.database_busy_timeout_ms,
        "Database pool ready"
    );

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    // ── 6단계: 워커 디렉터리 클라이언트 ──
    // 타임아웃을 넘긴 조회는 전송 실패로 처리되어 502가 됩니다.
    let directory = HttpWorkerDirectory::new(
        config.workers_api_url.clone(),
        Duration::from_secs(config.workers_api_timeout_secs),
    )?;
    tracing::info!(
        url = %config.workers_api_url,
        timeout_secs = config.workers_api_timeout_secs,
        refresh_days = config.worker_cache_refresh_days,
        "Worker directory configured"
    );

    // 캐시 우선 조회기. 오래된 캐시는 백그라운드에서 갱신합니다.
    let resolver = WorkerResolver::new(
        pool.clone(),
        Arc::new(directory),
        config.worker_cache_refresh_days,
    );

    // ── 7단계: 애플리케이션 상태(State) 생성 ──
    // SqlitePool과 WorkerResolver는 내부적으로 Arc를 쓰므로 clone해도 같은 자원을 가리킵니다.
    let state = AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        resolver,
        session_ttl_hours: config.session_ttl_hours,
        healthcheck_code: config.workers_healthcheck_code.clone(),
    };

    // ── 8단계: 라우터와 미들웨어 ──
    // 개발 환경에서는 Any(모두 허용)로 설정합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::api_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // ── 9단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
