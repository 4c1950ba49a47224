//! # 워커 캐시 쿼리
//!
//! `workers` 테이블은 외부 디렉터리의 미러입니다.
//! 코드가 기본키이고, 문서번호로도 조회합니다.

use crate::error::AppError;
use crate::models::WorkerRecord;
use sqlx::{Executor, Sqlite};

pub async fn find_worker_by_code<'e, E>(
    executor: E,
    code: &str,
) -> Result<Option<WorkerRecord>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let worker = sqlx::query_as::<_, WorkerRecord>(
        "SELECT code, document, full_name, sex, is_active, refreshed_at FROM workers WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(executor)
    .await?;

    Ok(worker)
}

/// 문서번호로 조회. 같은 문서번호가 여러 행에 있으면 가장 최근에 갱신된 행을 씁니다.
pub async fn find_worker_by_document<'e, E>(
    executor: E,
    document: &str,
) -> Result<Option<WorkerRecord>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let worker = sqlx::query_as::<_, WorkerRecord>(
        r#"
        SELECT code, document, full_name, sex, is_active, refreshed_at
        FROM workers
        WHERE document = ?
        ORDER BY refreshed_at DESC
        LIMIT 1
        "#,
    )
    .bind(document)
    .fetch_optional(executor)
    .await?;

    Ok(worker)
}

/// 디렉터리에서 받은 워커를 캐시에 넣거나 갱신합니다.
pub async fn upsert_worker<'e, E>(executor: E, worker: &WorkerRecord) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO workers (code, document, full_name, sex, is_active, refreshed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(code) DO UPDATE SET
            document = excluded.document,
            full_name = excluded.full_name,
            sex = excluded.sex,
            is_active = excluded.is_active,
            refreshed_at = excluded.refreshed_at
        "#,
    )
    .bind(&worker.code)
    .bind(&worker.document)
    .bind(&worker.full_name)
    .bind(&worker.sex)
    .bind(worker.is_active)
    .bind(&worker.refreshed_at)
    .execute(executor)
    .await?;

    Ok(())
}
