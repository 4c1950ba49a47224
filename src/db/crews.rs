use crate::error::AppError;
use crate::models::{Crew, CrewWorker};
use sqlx::{Executor, Sqlite};

const CREW_COLUMNS: &str = "id, session_id, crew_type, name, start_time, end_time, \
                            production_kg, support_scope, filleting_crew_id, created_at";

pub async fn get_crew<'e, E>(executor: E, id: &str) -> Result<Option<Crew>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM crews WHERE id = ?", CREW_COLUMNS);
    let crew = sqlx::query_as::<_, Crew>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(crew)
}

pub async fn list_crews<'e, E>(executor: E, session_id: &str) -> Result<Vec<Crew>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM crews WHERE session_id = ? ORDER BY rowid",
        CREW_COLUMNS
    );
    let crews = sqlx::query_as::<_, Crew>(&sql)
        .bind(session_id)
        .fetch_all(executor)
        .await?;

    Ok(crews)
}

pub async fn insert_crew<'e, E>(executor: E, crew: &Crew) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO crews
            (id, session_id, crew_type, name, start_time, end_time,
             production_kg, support_scope, filleting_crew_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&crew.id)
    .bind(&crew.session_id)
    .bind(crew.crew_type)
    .bind(&crew.name)
    .bind(&crew.start_time)
    .bind(&crew.end_time)
    .bind(crew.production_kg)
    .bind(crew.support_scope)
    .bind(&crew.filleting_crew_id)
    .bind(&crew.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// 이름/종료 시각/생산량만 수정 대상입니다.
pub async fn update_crew<'e, E>(executor: E, crew: &Crew) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE crews SET name = ?, end_time = ?, production_kg = ? WHERE id = ?")
        .bind(&crew.name)
        .bind(&crew.end_time)
        .bind(crew.production_kg)
        .bind(&crew.id)
        .execute(executor)
        .await?;

    Ok(())
}

/// 세션에 속한 모든 크루의 작업자 배정 (크루 생성 순, 배정 순)
pub async fn list_session_crew_workers<'e, E>(
    executor: E,
    session_id: &str,
) -> Result<Vec<CrewWorker>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let workers = sqlx::query_as::<_, CrewWorker>(
        r#"
        SELECT w.id, w.crew_id, w.worker_code, w.worker_name, w.kg, w.created_at
        FROM crew_workers w
        INNER JOIN crews c ON c.id = w.crew_id
        WHERE c.session_id = ?
        ORDER BY c.rowid, w.rowid
        "#,
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    Ok(workers)
}

/// 작업자 배정. 같은 크루에 같은 코드가 이미 있으면 UNIQUE 위반이 납니다.
pub async fn insert_crew_worker<'e, E>(executor: E, worker: &CrewWorker) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO crew_workers (id, crew_id, worker_code, worker_name, kg, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&worker.id)
    .bind(&worker.crew_id)
    .bind(&worker.worker_code)
    .bind(&worker.worker_name)
    .bind(worker.kg)
    .bind(&worker.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_crew_worker<'e, E>(
    executor: E,
    crew_id: &str,
    worker_code: &str,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM crew_workers WHERE crew_id = ? AND worker_code = ?")
        .bind(crew_id)
        .bind(worker_code)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
