use crate::error::AppError;
use crate::models::{Area, ReportType};
use sqlx::{Executor, Sqlite, SqlitePool};

pub async fn get_area<'e, E>(executor: E, id: i64) -> Result<Option<Area>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let area = sqlx::query_as::<_, Area>(
        r#"
        SELECT id, name, is_support_hours, is_production_advance, is_quick_count, is_active
        FROM areas
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(area)
}

/// 활성 구역 목록. 보고서 종류를 주면 그 종류의 플래그가 켜진 구역만 돌려줍니다.
pub async fn list_areas(
    pool: &SqlitePool,
    report_type: Option<ReportType>,
) -> Result<Vec<Area>, AppError> {
    // 컬럼 이름은 고정 문자열에서만 고르므로 SQL 인젝션 여지가 없습니다.
    let flag_filter = match report_type {
        None => "",
        Some(ReportType::SupportHours) => " AND is_support_hours = 1",
        Some(ReportType::ProductionAdvance) => " AND is_production_advance = 1",
        Some(ReportType::QuickCount) => " AND is_quick_count = 1",
        Some(ReportType::Sanitation) => return Ok(Vec::new()),
    };

    let sql = format!(
        "SELECT id, name, is_support_hours, is_production_advance, is_quick_count, is_active \
         FROM areas WHERE is_active = 1{} ORDER BY name",
        flag_filter
    );

    let areas = sqlx::query_as::<_, Area>(&sql).fetch_all(pool).await?;
    Ok(areas)
}
