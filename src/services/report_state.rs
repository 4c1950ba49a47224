//! # 보고서 세션 상태 머신
//!
//! ## 상태
//! `OPEN` ⇄ `CLOSED`. 활성/비활성(`is_active`)은 별도의 소프트 삭제 플래그입니다.
//!
//! ## open_or_create
//! (작성자, 종류, 교대, 날짜) 튜플에 살아있는 OPEN 세션이 있으면 그대로 돌려줍니다.
//! 없으면 이전 세션들을 대체(supersede) 처리하고 새 세션을 넣습니다.
//! 동시에 두 요청이 삽입하면 부분 고유 인덱스가 한쪽을 막고,
//! 막힌 쪽은 한 번 다시 읽어서 승자의 세션을 돌려줍니다. 잠금은 쓰지 않습니다.
//!
//! ## recalculate
//! 라인 행 전체에 대해 "미완료 개수"를 순수 함수로 다시 셉니다.
//! 누적 카운터를 두지 않으므로 어떤 순서로 라인을 바꿔도 결과가 행과 일치합니다.
//! 라인 변경과 같은 트랜잭션 안에서 호출해야 합니다.

use crate::db::{self, NewSession, SessionFilter, SessionHeaderChanges, SessionKey, SessionOrder};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{
    Area, ClearFlags, LineItem, ListReportsQuery, OpenReportRequest, Patch, ReportPage,
    ReportSession, ReportType, SessionStatus, Shift, UpdateReportRequest,
};
use crate::services::clock;
use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 200;

/// `open_or_create` 결과. `created`가 true면 새로 만든 세션입니다.
#[derive(Debug)]
pub struct OpenOutcome {
    pub session: ReportSession,
    pub created: bool,
}

/// 종류별 미완료 라인 개수
///
/// 자동 마감 대상이 아닌 종류(PRODUCTION_ADVANCE, QUICK_COUNT)는 항상 0입니다.
pub fn pending_count(report_type: ReportType, lines: &[LineItem]) -> usize {
    lines.iter().filter(|l| l.is_pending(report_type)).count()
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(field, "is required"))
}

/// 구역이 존재하고 활성이며 해당 종류에 허용되는지 확인합니다.
pub async fn require_area(
    conn: &mut SqliteConnection,
    area_id: i64,
    report_type: ReportType,
) -> Result<Area, AppError> {
    let area = db::get_area(&mut *conn, area_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(AppError::NotFound("area"))?;

    if !area.allows(report_type) {
        return Err(AppError::validation(
            "area_id",
            format!("area `{}` is not enabled for {}", area.name, report_type.as_str()),
        ));
    }
    Ok(area)
}

/// 세션 헤더의 구역 규칙
///
/// - PRODUCTION_ADVANCE / QUICK_COUNT: 필수
/// - SUPPORT_HOURS: 라인 단위로 지정하므로 헤더에는 받지 않음
/// - SANITATION: 구역 없음
async fn validate_session_area(
    conn: &mut SqliteConnection,
    area_id: Option<i64>,
    report_type: ReportType,
) -> Result<Option<i64>, AppError> {
    match (report_type.requires_session_area(), area_id) {
        (true, Some(id)) => Ok(Some(require_area(conn, id, report_type).await?.id)),
        (true, None) => Err(AppError::validation(
            "area_id",
            format!("is required for {}", report_type.as_str()),
        )),
        (false, Some(_)) => Err(AppError::validation(
            "area_id",
            format!("is not accepted on a {} report", report_type.as_str()),
        )),
        (false, None) => Ok(None),
    }
}

/// 세션을 열거나, 이미 열려 있으면 그 세션을 돌려줍니다.
pub async fn open_or_create(
    pool: &SqlitePool,
    caller: &AuthUser,
    req: OpenReportRequest,
    ttl_hours: i64,
) -> Result<OpenOutcome, AppError> {
    let report_date = clock::parse_report_date("report_date", required("report_date", &req.report_date)?)?;
    let shift: Shift = required("shift", &req.shift)?.parse()?;
    let report_type: ReportType = required("report_type", &req.report_type)?.parse()?;

    let key = SessionKey {
        creator_id: &caller.user_id,
        report_type,
        shift,
        report_date: &report_date,
    };

    let now = Utc::now();
    let mut tx = db::begin_write(pool).await?;

    if let Some(current) = db::find_current_session(&mut *tx, &key).await? {
        if current.is_live_open(now) {
            tracing::debug!(session_id = %current.id, "Reusing open session");
            return Ok(OpenOutcome {
                session: current,
                created: false,
            });
        }
    }

    let area_id = validate_session_area(&mut tx, req.area_id, report_type).await?;

    let now_ts = clock::format_timestamp(now);
    let expires_at = report_type
        .has_expiry()
        .then(|| clock::format_timestamp(now + Duration::hours(ttl_hours)));
    let id = uuid::Uuid::now_v7().to_string();
    let notes = req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let superseded = db::supersede_sessions(&mut *tx, &key, &now_ts).await?;
    if superseded > 0 {
        tracing::debug!(count = superseded, "Superseded previous sessions");
    }

    let inserted = db::insert_session(
        &mut *tx,
        &NewSession {
            id: &id,
            key: key.clone(),
            area_id,
            creator_name: &caller.name,
            notes,
            expires_at: expires_at.as_deref(),
        },
    )
    .await;

    match inserted {
        Ok(()) => {
            let session = db::get_session(&mut *tx, &id)
                .await?
                .ok_or_else(|| AppError::Internal("Failed to fetch created session".to_string()))?;
            tx.commit().await?;

            tracing::info!(
                session_id = %session.id,
                report_type = report_type.as_str(),
                creator = %caller.user_id,
                "Report session opened"
            );
            Ok(OpenOutcome {
                session,
                created: true,
            })
        }
        Err(e) if e.is_unique_violation() => {
            // 다른 요청이 먼저 삽입함: 롤백 후 한 번 다시 읽기
            drop(tx);
            tracing::debug!("Concurrent open detected, re-reading session");
            let winner = db::find_current_session(pool, &key)
                .await?
                .filter(|s| s.is_live_open(Utc::now()))
                .ok_or_else(|| {
                    AppError::Conflict("an open session for this shift is being created".to_string())
                })?;
            Ok(OpenOutcome {
                session: winner,
                created: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// 라인 행 전체로 세션 상태를 다시 계산해 기록합니다.
///
/// 자동 마감 종류가 아니면 아무것도 바꾸지 않고 현재 상태를 돌려줍니다.
pub async fn recalculate(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<SessionStatus, AppError> {
    let session = db::get_session(&mut *conn, session_id)
        .await?
        .ok_or(AppError::NotFound("report"))?;

    if !session.report_type.auto_closes() {
        return Ok(session.status);
    }

    let lines = db::list_lines(&mut *conn, session_id).await?;
    let pending = pending_count(session.report_type, &lines);
    let target = if pending == 0 {
        SessionStatus::Closed
    } else {
        SessionStatus::Open
    };

    db::set_session_status(&mut *conn, session_id, target, &clock::now_timestamp()).await?;

    tracing::debug!(
        session_id = %session_id,
        lines = lines.len(),
        pending,
        from = ?session.status,
        to = ?target,
        "Session recalculated"
    );

    Ok(target)
}

/// 호출자가 볼 수 있는 세션을 읽습니다. 남의 세션은 "없음"으로 보입니다.
pub async fn load_visible(
    conn: &mut SqliteConnection,
    caller: &AuthUser,
    id: &str,
) -> Result<ReportSession, AppError> {
    db::get_session(&mut *conn, id)
        .await?
        .filter(|s| caller.can_access(&s.creator_id))
        .ok_or(AppError::NotFound("report"))
}

/// 변경 가능한 세션을 읽습니다. 비활성 세션은 변경할 수 없습니다.
pub async fn load_writable(
    conn: &mut SqliteConnection,
    caller: &AuthUser,
    id: &str,
) -> Result<ReportSession, AppError> {
    let session = load_visible(conn, caller, id).await?;
    if !session.is_active {
        return Err(AppError::NotFound("report"));
    }
    Ok(session)
}

pub async fn get(pool: &SqlitePool, caller: &AuthUser, id: &str) -> Result<ReportSession, AppError> {
    let mut conn = pool.acquire().await?;
    load_visible(&mut conn, caller, id).await
}

/// 목록 쿼리를 검증된 필터로 바꿉니다.
fn build_filter(caller: &AuthUser, query: ListReportsQuery) -> Result<(SessionFilter, u32), AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let order = match query.order_by.as_deref().map(str::trim) {
        None | Some("") | Some("report_date") => SessionOrder::ReportDate,
        Some("created_at") => SessionOrder::CreatedAt,
        Some(other) => {
            return Err(AppError::validation(
                "order_by",
                format!("cannot order by `{}`", other),
            ))
        }
    };
    let descending = match query.dir.as_deref().map(|d| d.trim().to_ascii_lowercase()) {
        None => true,
        Some(d) if d.is_empty() || d == "desc" => true,
        Some(d) if d == "asc" => false,
        Some(d) => return Err(AppError::validation("dir", format!("`{}` is not asc or desc", d))),
    };

    // 일반 사용자는 자기 세션만 봅니다.
    let creator_id = if caller.is_privileged() {
        query.creator_id.filter(|c| !c.trim().is_empty())
    } else {
        Some(caller.user_id.clone())
    };

    let filter = SessionFilter {
        from: query
            .from
            .as_deref()
            .map(|d| clock::parse_report_date("from", d))
            .transpose()?,
        to: query
            .to
            .as_deref()
            .map(|d| clock::parse_report_date("to", d))
            .transpose()?,
        report_type: query.report_type.as_deref().map(str::parse).transpose()?,
        shift: query.shift.as_deref().map(str::parse).transpose()?,
        area_id: query.area_id,
        creator_id,
        active: query.active,
        q: query
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        order,
        descending,
        limit,
        offset: (page - 1).saturating_mul(limit),
    };

    Ok((filter, page))
}

pub async fn list(
    pool: &SqlitePool,
    caller: &AuthUser,
    query: ListReportsQuery,
) -> Result<ReportPage, AppError> {
    let (filter, page) = build_filter(caller, query)?;
    let (items, total) = db::list_sessions(pool, &filter).await?;
    let limit = filter.limit;

    Ok(ReportPage {
        page,
        limit,
        total,
        total_pages: (total + i64::from(limit) - 1) / i64::from(limit),
        items,
    })
}

/// 세션 헤더(날짜, 교대, 구역, 메모)를 수정합니다.
pub async fn update_header(
    pool: &SqlitePool,
    caller: &AuthUser,
    id: &str,
    req: UpdateReportRequest,
) -> Result<ReportSession, AppError> {
    let clear = ClearFlags::new(&req.clear, &["notes"])?;
    let notes = match Patch::from_parts(req.notes, clear.has("notes")) {
        Patch::Unset => None,
        Patch::Set(n) => Some(Some(n)),
        Patch::Clear => Some(None),
    };

    let mut tx = db::begin_write(pool).await?;
    let session = load_writable(&mut tx, caller, id).await?;

    let area_id = match req.area_id {
        Some(area_id) if session.report_type.requires_session_area() => {
            Some(require_area(&mut tx, area_id, session.report_type).await?.id)
        }
        Some(_) => {
            return Err(AppError::validation(
                "area_id",
                format!("is not accepted on a {} report", session.report_type.as_str()),
            ))
        }
        None => None,
    };

    let changes = SessionHeaderChanges {
        report_date: req
            .report_date
            .as_deref()
            .map(|d| clock::parse_report_date("report_date", d))
            .transpose()?,
        shift: req.shift.as_deref().map(str::parse).transpose()?,
        area_id,
        notes,
    };

    if changes.is_empty() {
        return Err(AppError::validation("body", "no fields to update"));
    }

    db::update_session_header(&mut *tx, id, &changes, &clock::now_timestamp())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict("another open session already exists for that date and shift".to_string())
            } else {
                e
            }
        })?;

    let updated = db::get_session(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    tx.commit().await?;

    Ok(updated)
}

/// 활성/비활성 전환. 비활성 세션도 다시 활성화할 수 있어야 하므로 가시성만 확인합니다.
pub async fn set_active(
    pool: &SqlitePool,
    caller: &AuthUser,
    id: &str,
    active: bool,
) -> Result<ReportSession, AppError> {
    let mut tx = db::begin_write(pool).await?;
    load_visible(&mut tx, caller, id).await?;

    db::set_session_active(&mut *tx, id, active, &clock::now_timestamp()).await?;
    let updated = db::get_session(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    tx.commit().await?;

    tracing::info!(session_id = %id, active, "Report session activation changed");
    Ok(updated)
}
