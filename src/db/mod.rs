//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출합니다.
//!
//! 대부분의 함수는 `E: Executor<'e, Database = Sqlite>`를 받습니다.
//! 그래서 같은 함수를 풀(`&SqlitePool`)로도, 트랜잭션(`&mut *tx`)으로도 호출할 수 있습니다.
//!
//! 쓰기 트랜잭션은 `begin_write`로 엽니다. (`BEGIN IMMEDIATE`)
//!
//! 각 하위 모듈:
//! - `areas`: 구역 참조 데이터 조회
//! - `crews`: 크루와 크루-작업자 배정
//! - `lines`: 보고서 라인
//! - `sessions`: 보고서 세션 (필터/페이지네이션 포함)
//! - `workers`: 워커 캐시

pub mod areas;
pub mod crews;
pub mod lines;
pub mod sessions;
pub mod workers;

pub use areas::*;
pub use crews::*;
pub use lines::*;
pub use sessions::*;
pub use workers::*;

use crate::error::AppError;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// 쓰기 트랜잭션을 시작합니다.
///
/// `BEGIN IMMEDIATE`는 시작 시점에 쓰기 잠금을 잡습니다.
/// 읽고-쓰는 트랜잭션 두 개가 동시에 잠금을 올리려다 `SQLITE_BUSY`로 끝나는 대신,
/// 나중 요청은 `busy_timeout` 동안 기다렸다가 앞 요청이 커밋한 상태를 읽습니다.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}
