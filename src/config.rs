//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `DATABASE_BUSY_TIMEOUT_MS`: 쓰기 잠금을 기다리는 최대 시간
//! - `JWT_SECRET`: 액세스 토큰 검증용 비밀키 (필수)
//! - `HOST` / `PORT`: 서버 바인딩 주소
//! - `WORKERS_API_URL`: 외부 워커 디렉터리(GraphQL) 주소
//! - `WORKERS_API_TIMEOUT_SECS`: 디렉터리 호출 타임아웃
//! - `WORKER_CACHE_REFRESH_DAYS`: 워커 캐시가 오래됐다고 보는 기준 일수
//! - `SESSION_TTL_HOURS`: 시간제 지원/위생 보고서 세션의 만료 시간
//! - `WORKERS_HEALTHCHECK_CODE`: 디렉터리 헬스체크에 쓰는 워커 코드

use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/trabunda.db")
    pub database_url: String,
    /// SQLite busy_timeout (밀리초, 기본값: 5000)
    pub database_busy_timeout_ms: u64,
    /// 외부 인증 서버와 공유하는 토큰 서명 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 워커 디렉터리 GraphQL 엔드포인트
    pub workers_api_url: String,
    /// 디렉터리 호출 타임아웃(초). 느린 외부 서비스가 요청을 무한정 붙잡지 못하게 합니다.
    pub workers_api_timeout_secs: u64,
    /// 캐시 갱신 기준 일수 (기본값: 7)
    pub worker_cache_refresh_days: i64,
    /// SUPPORT_HOURS / SANITATION 세션 만료 시간 (기본값: 16시간)
    pub session_ttl_hours: i64,
    /// `/health/workers`에서 조회할 워커 코드
    pub workers_healthcheck_code: String,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 숫자 설정은 파싱에 실패하면 기본값으로 대체됩니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_busy_timeout_ms: parse_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            workers_api_url: env::var("WORKERS_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:4806/graphql".to_string()),
            workers_api_timeout_secs: parse_or("WORKERS_API_TIMEOUT_SECS", 5),
            worker_cache_refresh_days: parse_or("WORKER_CACHE_REFRESH_DAYS", 7),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 16),
            workers_healthcheck_code: env::var("WORKERS_HEALTHCHECK_CODE")
                .unwrap_or_else(|_| "000000".to_string()),
        })
    }
}

/// 환경변수를 숫자로 파싱하고, 없거나 잘못된 값이면 기본값을 씁니다.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
