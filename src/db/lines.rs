//! # 보고서 라인 쿼리
//!
//! 라인 목록은 항상 삽입 순서(`rowid`)로 정렬합니다.
//! 라인 쓰기는 세션 상태 재계산과 같은 트랜잭션 안에서 호출해야 합니다.

use crate::error::AppError;
use crate::models::LineItem;
use sqlx::{Executor, Sqlite};

const LINE_SELECT: &str = r#"
    SELECT l.id, l.session_id, l.worker_code, l.worker_name, l.worker_document,
           l.crew_id, c.name AS crew_name, l.area_id, l.area_name,
           l.start_time, l.end_time, l.hours, l.task_description, l.quantity,
           l.created_at, l.updated_at
    FROM line_items l
    LEFT JOIN crews c ON c.id = l.crew_id
"#;

pub async fn list_lines<'e, E>(executor: E, session_id: &str) -> Result<Vec<LineItem>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE l.session_id = ? ORDER BY l.rowid", LINE_SELECT);
    let lines = sqlx::query_as::<_, LineItem>(&sql)
        .bind(session_id)
        .fetch_all(executor)
        .await?;

    Ok(lines)
}

pub async fn get_line<'e, E>(executor: E, id: &str) -> Result<Option<LineItem>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE l.id = ?", LINE_SELECT);
    let line = sqlx::query_as::<_, LineItem>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(line)
}

/// 같은 세션에서 해당 워커의 미완료(종료 시각 없는) 라인 중 가장 먼저 들어온 것
pub async fn find_open_line_for_worker<'e, E>(
    executor: E,
    session_id: &str,
    worker_code: &str,
) -> Result<Option<LineItem>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{} WHERE l.session_id = ? AND l.worker_code = ? AND l.end_time IS NULL \
         ORDER BY l.rowid LIMIT 1",
        LINE_SELECT
    );
    let line = sqlx::query_as::<_, LineItem>(&sql)
        .bind(session_id)
        .bind(worker_code)
        .fetch_optional(executor)
        .await?;

    Ok(line)
}

/// 라인을 삽입합니다. `crew_name`은 JOIN 값이라 저장하지 않습니다.
pub async fn insert_line<'e, E>(executor: E, line: &LineItem) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO line_items
            (id, session_id, worker_code, worker_name, worker_document, crew_id,
             area_id, area_name, start_time, end_time, hours, task_description,
             quantity, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&line.id)
    .bind(&line.session_id)
    .bind(&line.worker_code)
    .bind(&line.worker_name)
    .bind(&line.worker_document)
    .bind(&line.crew_id)
    .bind(line.area_id)
    .bind(&line.area_name)
    .bind(&line.start_time)
    .bind(&line.end_time)
    .bind(line.hours)
    .bind(&line.task_description)
    .bind(line.quantity)
    .bind(&line.created_at)
    .bind(&line.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// 병합이 끝난 라인의 변경 가능한 컬럼을 모두 기록합니다.
pub async fn update_line<'e, E>(executor: E, line: &LineItem) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE line_items
        SET worker_name = ?, worker_document = ?, crew_id = ?, area_id = ?,
            area_name = ?, start_time = ?, end_time = ?, hours = ?,
            task_description = ?, quantity = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&line.worker_name)
    .bind(&line.worker_document)
    .bind(&line.crew_id)
    .bind(line.area_id)
    .bind(&line.area_name)
    .bind(&line.start_time)
    .bind(&line.end_time)
    .bind(line.hours)
    .bind(&line.task_description)
    .bind(line.quantity)
    .bind(&line.updated_at)
    .bind(&line.id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_line<'e, E>(executor: E, id: &str) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM line_items WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
