//! # 보고서 세션 데이터베이스 쿼리 모듈
//!
//! 세션의 생성, 조회, 상태 변경, 목록 필터링을 담당하는 SQL 쿼리 함수들입니다.
//!
//! ## 고유성 규칙
//! `ux_report_sessions_live_open` 부분 인덱스가
//! (작성자, 종류, 교대, 날짜) 당 "대체되지 않은 OPEN 세션"을 하나로 제한합니다.
//! 같은 튜플로 새 세션을 열 때는 이전 세션들에 `superseded_at`을 찍어서
//! 인덱스 대상에서 빼냅니다.

use crate::error::AppError;
use crate::models::{ReportSession, ReportType, SessionStatus, Shift};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

/// 세션 조회 공통 SELECT (구역 이름 LEFT JOIN 포함)
const SESSION_SELECT: &str = r#"
    SELECT s.id, s.report_date, s.shift, s.report_type, s.area_id,
           a.name AS area_name, s.creator_id, s.creator_name, s.notes,
           s.status, s.is_active, s.expires_at, s.closed_at, s.superseded_at,
           s.created_at, s.updated_at
    FROM report_sessions s
    LEFT JOIN areas a ON a.id = s.area_id
"#;

/// 세션을 식별하는 튜플 (작성자, 종류, 교대, 날짜)
#[derive(Debug, Clone)]
pub struct SessionKey<'a> {
    pub creator_id: &'a str,
    pub report_type: ReportType,
    pub shift: Shift,
    pub report_date: &'a str,
}

/// 새 세션 INSERT에 필요한 값
#[derive(Debug)]
pub struct NewSession<'a> {
    pub id: &'a str,
    pub key: SessionKey<'a>,
    pub area_id: Option<i64>,
    pub creator_name: &'a str,
    pub notes: Option<&'a str>,
    pub expires_at: Option<&'a str>,
}

/// 목록 정렬 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionOrder {
    #[default]
    ReportDate,
    CreatedAt,
}

/// 검증이 끝난 목록 필터
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub report_type: Option<ReportType>,
    pub shift: Option<Shift>,
    pub area_id: Option<i64>,
    pub creator_id: Option<String>,
    pub active: Option<bool>,
    pub q: Option<String>,
    pub order: SessionOrder,
    pub descending: bool,
    pub limit: u32,
    pub offset: u32,
}

pub async fn get_session<'e, E>(executor: E, id: &str) -> Result<Option<ReportSession>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE s.id = ?", SESSION_SELECT);
    let session = sqlx::query_as::<_, ReportSession>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(session)
}

/// 튜플에 해당하는, 아직 대체되지 않은 가장 최근 세션을 찾습니다. (OPEN/CLOSED 무관)
pub async fn find_current_session<'e, E>(
    executor: E,
    key: &SessionKey<'_>,
) -> Result<Option<ReportSession>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"{}
        WHERE s.creator_id = ? AND s.report_type = ? AND s.shift = ? AND s.report_date = ?
          AND s.superseded_at IS NULL
        ORDER BY s.created_at DESC, s.id DESC
        LIMIT 1"#,
        SESSION_SELECT
    );

    let session = sqlx::query_as::<_, ReportSession>(&sql)
        .bind(key.creator_id)
        .bind(key.report_type)
        .bind(key.shift)
        .bind(key.report_date)
        .fetch_optional(executor)
        .await?;

    Ok(session)
}

/// 튜플의 기존 세션들을 대체 처리합니다. 새 세션을 넣기 직전에 호출합니다.
pub async fn supersede_sessions<'e, E>(
    executor: E,
    key: &SessionKey<'_>,
    now: &str,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE report_sessions
        SET superseded_at = ?, updated_at = ?
        WHERE creator_id = ? AND report_type = ? AND shift = ? AND report_date = ?
          AND superseded_at IS NULL
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(key.creator_id)
    .bind(key.report_type)
    .bind(key.shift)
    .bind(key.report_date)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// 새 세션을 OPEN 상태로 삽입합니다.
///
/// 동시에 같은 튜플로 삽입하면 부분 고유 인덱스 때문에 한쪽이
/// UNIQUE 위반으로 실패합니다. 호출자가 이를 잡아서 다시 읽습니다.
pub async fn insert_session<'e, E>(executor: E, new: &NewSession<'_>) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO report_sessions
            (id, report_date, shift, report_type, area_id, creator_id, creator_name,
             notes, status, is_active, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'OPEN', 1, ?)
        "#,
    )
    .bind(new.id)
    .bind(new.key.report_date)
    .bind(new.key.shift)
    .bind(new.key.report_type)
    .bind(new.area_id)
    .bind(new.key.creator_id)
    .bind(new.creator_name)
    .bind(new.notes)
    .bind(new.expires_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// 상태 전이를 기록합니다.
///
/// - CLOSED로 갈 때: 이미 CLOSED였다면 기존 closed_at 유지, 아니면 `now`
/// - OPEN으로 갈 때: closed_at을 지움
pub async fn set_session_status<'e, E>(
    executor: E,
    id: &str,
    status: SessionStatus,
    now: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = match status {
        SessionStatus::Closed => {
            r#"
            UPDATE report_sessions
            SET closed_at = CASE WHEN status = 'CLOSED' AND closed_at IS NOT NULL
                                 THEN closed_at ELSE ?1 END,
                status = 'CLOSED',
                updated_at = ?1
            WHERE id = ?2
            "#
        }
        SessionStatus::Open => {
            r#"
            UPDATE report_sessions
            SET status = 'OPEN', closed_at = NULL, updated_at = ?1
            WHERE id = ?2
            "#
        }
    };

    sqlx::query(sql).bind(now).bind(id).execute(executor).await?;
    Ok(())
}

/// 활성/비활성 플래그를 바꿉니다. 세션이 없으면 false.
pub async fn set_session_active<'e, E>(
    executor: E,
    id: &str,
    active: bool,
    now: &str,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE report_sessions SET is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(active)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 헤더 수정에 쓰는 검증된 값들. None이면 변경하지 않습니다.
#[derive(Debug, Default)]
pub struct SessionHeaderChanges {
    pub report_date: Option<String>,
    pub shift: Option<Shift>,
    pub area_id: Option<i64>,
    /// Some(None)이면 메모 삭제
    pub notes: Option<Option<String>>,
}

impl SessionHeaderChanges {
    pub fn is_empty(&self) -> bool {
        self.report_date.is_none()
            && self.shift.is_none()
            && self.area_id.is_none()
            && self.notes.is_none()
    }
}

/// 세션 헤더를 부분 수정합니다.
///
/// ## 동적 쿼리 구성
/// 바뀐 필드만 SET 절에 넣습니다. `QueryBuilder::push_bind`가
/// 값마다 `?` 자리표시자를 붙이고 안전하게 바인딩합니다.
pub async fn update_session_header<'e, E>(
    executor: E,
    id: &str,
    changes: &SessionHeaderChanges,
    now: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE report_sessions SET updated_at = ");
    qb.push_bind(now.to_string());

    if let Some(date) = &changes.report_date {
        qb.push(", report_date = ").push_bind(date.clone());
    }
    if let Some(shift) = changes.shift {
        qb.push(", shift = ").push_bind(shift);
    }
    if let Some(area_id) = changes.area_id {
        qb.push(", area_id = ").push_bind(area_id);
    }
    if let Some(notes) = &changes.notes {
        qb.push(", notes = ").push_bind(notes.clone());
    }

    qb.push(" WHERE id = ").push_bind(id.to_string());
    qb.build().execute(executor).await?;

    Ok(())
}

/// WHERE 절을 필터에 맞게 덧붙입니다. 목록 쿼리와 COUNT 쿼리가 함께 씁니다.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SessionFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(from) = &filter.from {
        qb.push(" AND s.report_date >= ").push_bind(from.clone());
    }
    if let Some(to) = &filter.to {
        qb.push(" AND s.report_date <= ").push_bind(to.clone());
    }
    if let Some(report_type) = filter.report_type {
        qb.push(" AND s.report_type = ").push_bind(report_type);
    }
    if let Some(shift) = filter.shift {
        qb.push(" AND s.shift = ").push_bind(shift);
    }
    if let Some(area_id) = filter.area_id {
        qb.push(" AND s.area_id = ").push_bind(area_id);
    }
    if let Some(creator_id) = &filter.creator_id {
        qb.push(" AND s.creator_id = ").push_bind(creator_id.clone());
    }
    if let Some(active) = filter.active {
        qb.push(" AND s.is_active = ").push_bind(active);
    }
    if let Some(q) = &filter.q {
        // 메모 / 구역 이름 / 작성자 이름에서 단순 부분 일치 검색
        let pattern = format!("%{}%", q);
        qb.push(" AND (s.notes LIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.creator_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// 필터 조건에 맞는 세션 한 페이지와 전체 개수를 돌려줍니다.
pub async fn list_sessions(
    pool: &SqlitePool,
    filter: &SessionFilter,
) -> Result<(Vec<ReportSession>, i64), AppError> {
    // 1) 전체 개수 (페이지 계산용)
    let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT COUNT(*) FROM report_sessions s LEFT JOIN areas a ON a.id = s.area_id",
    );
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    // 2) 데이터
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SESSION_SELECT);
    push_filters(&mut qb, filter);

    let order_column = match filter.order {
        SessionOrder::ReportDate => "s.report_date",
        SessionOrder::CreatedAt => "s.created_at",
    };
    let dir = if filter.descending { "DESC" } else { "ASC" };
    qb.push(format!(" ORDER BY {} {}, s.id {}", order_column, dir, dir));
    qb.push(" LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(filter.offset));

    let items = qb
        .build_query_as::<ReportSession>()
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}
