//! # 라인 변경 엔진
//!
//! 라인 생성/수정/삭제와 종류별 필수 필드 규칙을 담당합니다.
//!
//! | 종류 | 라인 필수 필드 |
//! |------|----------------|
//! | SANITATION | 작업 내용 |
//! | SUPPORT_HOURS | 시작 시각, 구역 |
//! | PRODUCTION_ADVANCE | 수량 |
//! | QUICK_COUNT | 없음 |
//!
//! ## 이어 쓰기(continuation)
//! 같은 세션에 같은 워커 코드의 미완료 라인이 있으면 새 행을 넣지 않고
//! 그 라인을 채웁니다. 그래서 시작만 기록한 뒤 종료를 보내면 한 행이 됩니다.
//!
//! ## 트랜잭션
//! 워커 조회(외부 호출 가능)는 트랜잭션 밖에서 먼저 끝냅니다.
//! 라인 쓰기와 세션 재계산은 한 트랜잭션 안에서 실행되고,
//! 중간에 실패하면 트랜잭션이 drop되면서 전부 롤백됩니다.

use crate::db;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{
    CreateLineRequest, LineItem, LineOutcome, LinePatch, Patch, ReportType, SessionStatus,
    UpdateLineRequest,
};
use crate::services::resolver::WorkerResolver;
use crate::services::{clock, report_state};
use sqlx::{SqliteConnection, SqlitePool};

/// 라인에 기록할 워커 신원
#[derive(Debug, Clone, PartialEq)]
struct WorkerRef {
    code: Option<String>,
    name: Option<String>,
    document: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 코드 → 문서번호 → 이름 순으로 워커 참조를 확정합니다.
/// 이름만 있으면 디렉터리 확인 없이 그대로 기록합니다.
async fn resolve_worker(
    resolver: &WorkerResolver,
    req: &mut CreateLineRequest,
) -> Result<WorkerRef, AppError> {
    if let Some(code) = non_blank(req.worker_code.take()) {
        let found = resolver.resolve_code(&code).await?;
        return Ok(WorkerRef {
            code: Some(found.worker.code),
            name: Some(found.worker.name),
            document: found.worker.document,
        });
    }
    if let Some(document) = non_blank(req.worker_document.take()) {
        let found = resolver.resolve_document(&document).await?;
        return Ok(WorkerRef {
            code: Some(found.worker.code),
            name: Some(found.worker.name),
            document: found.worker.document,
        });
    }
    if let Some(name) = non_blank(req.worker_name.take()) {
        return Ok(WorkerRef {
            code: None,
            name: Some(name),
            document: None,
        });
    }
    Err(AppError::validation(
        "worker_code",
        "a worker code, document or name is required",
    ))
}

fn validate_quantity(quantity: f64) -> Result<f64, AppError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(AppError::validation(
            "quantity",
            format!("{} is not a non-negative number", quantity),
        ));
    }
    Ok(quantity)
}

/// 라인 크루는 같은 세션 소속이어야 합니다.
async fn require_session_crew(
    conn: &mut SqliteConnection,
    crew_id: &str,
    session_id: &str,
) -> Result<(), AppError> {
    db::get_crew(&mut *conn, crew_id)
        .await?
        .filter(|c| c.session_id == session_id)
        .map(|_| ())
        .ok_or(AppError::NotFound("crew"))
}

/// 종류별 필수 필드를 확인합니다. 병합이 끝난 라인에 대해 호출합니다.
fn check_contract(report_type: ReportType, line: &LineItem) -> Result<(), AppError> {
    match report_type {
        ReportType::Sanitation => {
            if line
                .task_description
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
            {
                return Err(AppError::validation(
                    "task_description",
                    "is required for SANITATION",
                ));
            }
        }
        ReportType::SupportHours => {
            if line.start_time.is_none() {
                return Err(AppError::validation("start_time", "is required for SUPPORT_HOURS"));
            }
            if line.area_id.is_none() {
                return Err(AppError::validation("area_id", "is required for SUPPORT_HOURS"));
            }
        }
        ReportType::ProductionAdvance => {
            if line.quantity.is_none() {
                return Err(AppError::validation(
                    "quantity",
                    "is required for PRODUCTION_ADVANCE",
                ));
            }
        }
        ReportType::QuickCount => {}
    }
    Ok(())
}

/// 근무 시간을 정합니다.
///
/// - 종료 없음 → None (미완료)
/// - 시작과 종료가 모두 있으면 구간을 검증하고, 명시 값이 없으면 구간으로 계산
/// - 종료만 있으면 명시 값만 사용
fn settle_hours(
    start: Option<&str>,
    end: Option<&str>,
    explicit: Option<f64>,
) -> Result<Option<f64>, AppError> {
    let Some(end) = end else {
        return Ok(None);
    };
    let explicit = explicit.map(clock::validate_hours).transpose()?;
    match start {
        Some(start) => {
            let span = clock::span_hours(start, end)?;
            Ok(Some(explicit.unwrap_or(span)))
        }
        None => Ok(explicit),
    }
}

async fn finish(
    conn: &mut SqliteConnection,
    line_id: &str,
    session_id: &str,
) -> Result<(LineItem, SessionStatus), AppError> {
    let status = report_state::recalculate(&mut *conn, session_id).await?;
    let line = db::get_line(&mut *conn, line_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to fetch written line".to_string()))?;
    Ok((line, status))
}

/// 라인을 만들거나, 같은 워커의 미완료 라인을 이어서 채웁니다.
pub async fn create_line(
    pool: &SqlitePool,
    resolver: &WorkerResolver,
    caller: &AuthUser,
    session_id: &str,
    mut req: CreateLineRequest,
) -> Result<LineOutcome, AppError> {
    // 남의 세션이면 외부 조회 전에 거절
    report_state::get(pool, caller, session_id).await?;
    let worker = resolve_worker(resolver, &mut req).await?;

    let start_time = req
        .start_time
        .as_deref()
        .map(|t| clock::normalize_time("start_time", t))
        .transpose()?;
    let end_time = req
        .end_time
        .as_deref()
        .map(|t| clock::normalize_time("end_time", t))
        .transpose()?;
    let quantity = req.quantity.map(validate_quantity).transpose()?;

    let mut tx = db::begin_write(pool).await?;
    let session = report_state::load_writable(&mut tx, caller, session_id).await?;

    let existing = match worker.code.as_deref() {
        Some(code) => db::find_open_line_for_worker(&mut *tx, &session.id, code).await?,
        None => None,
    };
    let continued = existing.is_some();
    let now = clock::now_timestamp();

    let mut line = existing.unwrap_or_else(|| LineItem {
        id: uuid::Uuid::now_v7().to_string(),
        session_id: session.id.clone(),
        worker_code: worker.code.clone(),
        worker_name: None,
        worker_document: None,
        crew_id: None,
        crew_name: None,
        area_id: None,
        area_name: None,
        start_time: None,
        end_time: None,
        hours: None,
        task_description: None,
        quantity: None,
        created_at: now.clone(),
        updated_at: now.clone(),
    });

    // 요청에 있는 값만 덮어씁니다.
    line.worker_name = worker.name.or(line.worker_name);
    line.worker_document = worker.document.or(line.worker_document);
    if let Some(crew_id) = non_blank(req.crew_id) {
        require_session_crew(&mut tx, &crew_id, &session.id).await?;
        line.crew_id = Some(crew_id);
    }
    if let Some(area_id) = req.area_id {
        let area = report_state::require_area(&mut tx, area_id, session.report_type).await?;
        line.area_id = Some(area.id);
        line.area_name = Some(area.name);
    }
    if start_time.is_some() {
        line.start_time = start_time;
    }
    if end_time.is_some() {
        line.end_time = end_time;
    }
    if let Some(task) = req.task_description {
        line.task_description = Some(task.trim().to_string());
    }
    if quantity.is_some() {
        line.quantity = quantity;
    }

    check_contract(session.report_type, &line)?;
    line.hours = settle_hours(
        line.start_time.as_deref(),
        line.end_time.as_deref(),
        req.hours,
    )?;
    line.updated_at = now;

    if continued {
        db::update_line(&mut *tx, &line).await?;
    } else {
        db::insert_line(&mut *tx, &line).await?;
    }

    let (line, session_status) = finish(&mut tx, &line.id, &session.id).await?;
    tx.commit().await?;

    tracing::info!(
        line_id = %line.id,
        session_id = %session.id,
        continued,
        status = ?session_status,
        "Line written"
    );

    Ok(LineOutcome {
        line,
        session_status,
        continued,
    })
}

/// 라인 부분 수정. `clear` 목록에 있는 필드만 NULL이 됩니다.
pub async fn update_line(
    pool: &SqlitePool,
    caller: &AuthUser,
    line_id: &str,
    req: UpdateLineRequest,
) -> Result<LineOutcome, AppError> {
    let patch = LinePatch::try_from(req)?;
    if patch.is_empty() {
        return Err(AppError::validation("body", "no fields to update"));
    }

    let mut tx = db::begin_write(pool).await?;
    let mut line = db::get_line(&mut *tx, line_id)
        .await?
        .ok_or(AppError::NotFound("line"))?;
    let session = report_state::load_writable(&mut tx, caller, &line.session_id).await?;

    let LinePatch {
        crew_id,
        area_id,
        start_time,
        end_time,
        hours,
        task_description,
        quantity,
    } = patch;

    let times_changed = !start_time.is_unset() || !end_time.is_unset();

    if let Patch::Set(ref id) = crew_id {
        require_session_crew(&mut tx, id, &session.id).await?;
    }
    line.crew_id = crew_id.apply(line.crew_id);

    match area_id {
        Patch::Set(id) => {
            let area = report_state::require_area(&mut tx, id, session.report_type).await?;
            line.area_id = Some(area.id);
            line.area_name = Some(area.name);
        }
        Patch::Clear => {
            line.area_id = None;
            line.area_name = None;
        }
        Patch::Unset => {}
    }

    let start_time = match start_time {
        Patch::Set(t) => Patch::Set(clock::normalize_time("start_time", &t)?),
        other => other,
    };
    let end_time = match end_time {
        Patch::Set(t) => Patch::Set(clock::normalize_time("end_time", &t)?),
        other => other,
    };
    line.start_time = start_time.apply(line.start_time);
    line.end_time = end_time.apply(line.end_time);
    line.task_description = task_description
        .apply(line.task_description)
        .map(|d| d.trim().to_string());
    let quantity = match quantity {
        Patch::Set(q) => Patch::Set(validate_quantity(q)?),
        other => other,
    };
    line.quantity = quantity.apply(line.quantity);

    // SANITATION 작업 내용은 지워도 됩니다 (라인이 미완료로 돌아감).
    if session.report_type != ReportType::Sanitation {
        check_contract(session.report_type, &line)?;
    }

    let explicit_hours = match hours {
        Patch::Set(h) => Some(h),
        Patch::Clear => None,
        // 시각이 바뀌지 않았으면 기존 값을 유지
        Patch::Unset if !times_changed => line.hours,
        Patch::Unset => None,
    };
    line.hours = settle_hours(
        line.start_time.as_deref(),
        line.end_time.as_deref(),
        explicit_hours,
    )?;
    line.updated_at = clock::now_timestamp();

    db::update_line(&mut *tx, &line).await?;
    let (line, session_status) = finish(&mut tx, &line.id, &session.id).await?;
    tx.commit().await?;

    tracing::debug!(line_id = %line.id, status = ?session_status, "Line updated");

    Ok(LineOutcome {
        line,
        session_status,
        continued: false,
    })
}

/// 라인 삭제 후 세션 상태를 돌려줍니다.
pub async fn delete_line(
    pool: &SqlitePool,
    caller: &AuthUser,
    line_id: &str,
) -> Result<(String, SessionStatus), AppError> {
    let mut tx = db::begin_write(pool).await?;
    let line = db::get_line(&mut *tx, line_id)
        .await?
        .ok_or(AppError::NotFound("line"))?;
    report_state::load_writable(&mut tx, caller, &line.session_id).await?;

    db::delete_line(&mut *tx, line_id).await?;
    let status = report_state::recalculate(&mut tx, &line.session_id).await?;
    tx.commit().await?;

    tracing::info!(line_id = %line_id, session_id = %line.session_id, status = ?status, "Line deleted");
    Ok((line.session_id, status))
}

/// 세션의 라인 목록 (삽입 순서)
pub async fn list_lines(
    pool: &SqlitePool,
    caller: &AuthUser,
    session_id: &str,
) -> Result<Vec<LineItem>, AppError> {
    let mut conn = pool.acquire().await?;
    report_state::load_visible(&mut conn, caller, session_id).await?;
    db::list_lines(&mut *conn, session_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpenReportRequest;
    use crate::test_support::{
        file_pool, memory_pool, resolver, seed_worker, supervisor, AREA_FILLETING, AREA_PACKING,
    };

    async fn open(pool: &SqlitePool, report_type: &str, area_id: Option<i64>) -> String {
        report_state::open_or_create(
            pool,
            &supervisor("u1"),
            OpenReportRequest {
                report_date: Some("2026-03-02".into()),
                shift: Some("Night".into()),
                report_type: Some(report_type.into()),
                area_id,
                notes: None,
            },
            16,
        )
        .await
        .unwrap()
        .session
        .id
    }

    fn support_line(code: &str, start: Option<&str>, end: Option<&str>) -> CreateLineRequest {
        CreateLineRequest {
            worker_code: Some(code.into()),
            area_id: Some(AREA_FILLETING),
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn continuation_completes_the_pending_line() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00123", Some("12345678"), "Ana Quispe", 0).await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SUPPORT_HOURS", None).await;

        let started = create_line(&pool, &resolver, &caller, &session_id, support_line("123", Some("22:00"), None))
            .await
            .unwrap();
        assert!(!started.continued);
        assert_eq!(started.session_status, SessionStatus::Open);
        assert_eq!(started.line.hours, None);
        assert_eq!(started.line.worker_name.as_deref(), Some("Ana Quispe"));

        let finished = create_line(
            &pool,
            &resolver,
            &caller,
            &session_id,
            CreateLineRequest {
                worker_code: Some("00123".into()),
                end_time: Some("06:00".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(finished.continued);
        assert_eq!(finished.line.id, started.line.id);
        assert_eq!(finished.line.start_time.as_deref(), Some("22:00"));
        assert_eq!(finished.line.end_time.as_deref(), Some("06:00"));
        assert_eq!(finished.line.hours, Some(8.0));
        assert_eq!(finished.session_status, SessionStatus::Closed);

        let lines = list_lines(&pool, &caller, &session_id).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn closed_session_reopens_when_a_pending_line_arrives() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00001", None, "Uno", 0).await;
        seed_worker(&pool, "00002", None, "Dos", 0).await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SUPPORT_HOURS", None).await;

        let done = create_line(&pool, &resolver, &caller, &session_id, support_line("1", Some("08:00"), Some("12:00")))
            .await
            .unwrap();
        assert_eq!(done.session_status, SessionStatus::Closed);

        let pending = create_line(&pool, &resolver, &caller, &session_id, support_line("2", Some("08:00"), None))
            .await
            .unwrap();
        assert_eq!(pending.session_status, SessionStatus::Open);

        let session = db::get_session(&pool, &session_id).await.unwrap().unwrap();
        assert!(session.closed_at.is_none());

        // 미완료 라인을 지우면 다시 CLOSED
        let (_, status) = delete_line(&pool, &caller, &pending.line.id).await.unwrap();
        assert_eq!(status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn per_type_contracts_name_the_missing_field() {
        let pool = memory_pool().await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");

        let support = open(&pool, "SUPPORT_HOURS", None).await;
        let err = create_line(
            &pool,
            &resolver,
            &caller,
            &support,
            CreateLineRequest {
                worker_name: Some("Temporal".into()),
                start_time: Some("08:00".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "area_id", .. }));

        let sanitation = open(&pool, "SANITATION", None).await;
        let err = create_line(
            &pool,
            &resolver,
            &caller,
            &sanitation,
            CreateLineRequest {
                worker_name: Some("Temporal".into()),
                start_time: Some("08:00".into()),
                end_time: Some("10:00".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "task_description", .. }));

        let advance = open(&pool, "PRODUCTION_ADVANCE", Some(AREA_PACKING)).await;
        let err = create_line(
            &pool,
            &resolver,
            &caller,
            &advance,
            CreateLineRequest {
                worker_name: Some("Temporal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "quantity", .. }));

        let quick = open(&pool, "QUICK_COUNT", Some(AREA_PACKING)).await;
        let ok = create_line(
            &pool,
            &resolver,
            &caller,
            &quick,
            CreateLineRequest {
                worker_name: Some("Temporal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        // QUICK_COUNT는 자동 마감 대상이 아님
        assert_eq!(ok.session_status, SessionStatus::Open);
    }

    #[tokio::test]
    async fn over_long_span_is_rejected_and_rolled_back() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00007", None, "Siete", 0).await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SUPPORT_HOURS", None).await;

        let err = create_line(&pool, &resolver, &caller, &session_id, support_line("7", Some("08:00"), Some("03:00")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("19:00"));
        assert!(list_lines(&pool, &caller, &session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_worker_reference_is_rejected() {
        let pool = memory_pool().await;
        let resolver = resolver(&pool);
        let session_id = open(&pool, "QUICK_COUNT", Some(AREA_PACKING)).await;

        let err = create_line(&pool, &resolver, &supervisor("u1"), &session_id, CreateLineRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "worker_code", .. }));

        let unknown = create_line(
            &pool,
            &resolver,
            &supervisor("u1"),
            &session_id,
            CreateLineRequest {
                worker_code: Some("999".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(unknown, AppError::NotFound("worker")));
    }

    #[tokio::test]
    async fn patch_distinguishes_unset_set_and_clear() {
        let pool = memory_pool().await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SANITATION", None).await;

        let created = create_line(
            &pool,
            &resolver,
            &caller,
            &session_id,
            CreateLineRequest {
                worker_name: Some("Limpieza".into()),
                start_time: Some("06:00".into()),
                end_time: Some("09:30".into()),
                task_description: Some("lavado de mesas".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.session_status, SessionStatus::Closed);
        assert_eq!(created.line.hours, Some(3.5));

        // null 단독은 무시됨
        let ignored: UpdateLineRequest =
            serde_json::from_str(r#"{ "end_time": null, "quantity": 4 }"#).unwrap();
        let out = update_line(&pool, &caller, &created.line.id, ignored).await.unwrap();
        assert_eq!(out.line.end_time.as_deref(), Some("09:30"));
        assert_eq!(out.line.quantity, Some(4.0));
        assert_eq!(out.session_status, SessionStatus::Closed);

        // clear 플래그가 있어야 지워짐 → 미완료로 돌아가 세션이 열림
        let cleared: UpdateLineRequest =
            serde_json::from_str(r#"{ "clear": ["end_time"] }"#).unwrap();
        let out = update_line(&pool, &caller, &created.line.id, cleared).await.unwrap();
        assert_eq!(out.line.end_time, None);
        assert_eq!(out.line.hours, None);
        assert_eq!(out.session_status, SessionStatus::Open);

        // 작업 내용을 지워도 허용되지만 계속 미완료
        let set_end: UpdateLineRequest =
            serde_json::from_str(r#"{ "end_time": "10:00", "clear": ["task_description"] }"#).unwrap();
        let out = update_line(&pool, &caller, &created.line.id, set_end).await.unwrap();
        assert_eq!(out.line.hours, Some(4.0));
        assert_eq!(out.session_status, SessionStatus::Open);
    }

    #[tokio::test]
    async fn support_hours_update_cannot_clear_required_fields() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00010", None, "Diez", 0).await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SUPPORT_HOURS", None).await;

        let created = create_line(&pool, &resolver, &caller, &session_id, support_line("10", Some("07:00"), None))
            .await
            .unwrap();
        let req: UpdateLineRequest = serde_json::from_str(r#"{ "clear": ["area_id"] }"#).unwrap();
        let err = update_line(&pool, &caller, &created.line.id, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "area_id", .. }));
    }

    #[tokio::test]
    async fn crew_reference_must_belong_to_the_session() {
        let pool = memory_pool().await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "QUICK_COUNT", Some(AREA_PACKING)).await;

        let err = create_line(
            &pool,
            &resolver,
            &caller,
            &session_id,
            CreateLineRequest {
                worker_name: Some("Temporal".into()),
                crew_id: Some("no-such-crew".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound("crew")));
    }

    #[tokio::test]
    async fn pending_count_matches_rows_after_mixed_mutations() {
        let pool = memory_pool().await;
        let resolver = resolver(&pool);
        let caller = supervisor("u1");
        let session_id = open(&pool, "SANITATION", None).await;

        let mut ids = Vec::new();
        for (end, task) in [(None, Some("a")), (Some("09:00"), None), (Some("09:00"), Some("b"))] {
            let out = create_line(
                &pool,
                &resolver,
                &caller,
                &session_id,
                CreateLineRequest {
                    worker_name: Some("W".into()),
                    start_time: Some("08:00".into()),
                    end_time: end.map(str::to_string),
                    task_description: task.map(str::to_string),
                    ..Default::default()
                },
            )
            .await;
            // 작업 내용 없는 라인은 생성 단계에서 거절됨
            if let Ok(out) = out {
                ids.push(out.line.id);
            }
        }
        assert_eq!(ids.len(), 2);

        delete_line(&pool, &caller, &ids[1]).await.unwrap();

        let lines = db::list_lines(&pool, &session_id).await.unwrap();
        let session = db::get_session(&pool, &session_id).await.unwrap().unwrap();
        let expected = if report_state::pending_count(ReportType::Sanitation, &lines) == 0 {
            SessionStatus::Closed
        } else {
            SessionStatus::Open
        };
        assert_eq!(session.status, expected);
        assert_eq!(session.status, SessionStatus::Open);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_line_writes_queue_instead_of_failing() {
        let (pool, _dir) = file_pool().await;
        let session_id = open(&pool, "SANITATION", None).await;
        let resolver = resolver(&pool);

        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..8 {
            let pool = pool.clone();
            let resolver = resolver.clone();
            let session_id = session_id.clone();
            tasks.spawn(async move {
                let req = CreateLineRequest {
                    worker_name: Some(format!("Operario {}", n)),
                    start_time: Some("08:00".into()),
                    end_time: Some("10:00".into()),
                    task_description: Some("Limpieza de mesas".into()),
                    ..Default::default()
                };
                create_line(&pool, &resolver, &supervisor("u1"), &session_id, req).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap().unwrap();
            assert!(!outcome.continued);
        }

        let lines = list_lines(&pool, &supervisor("u1"), &session_id).await.unwrap();
        assert_eq!(lines.len(), 8);
        let session = report_state::get(&pool, &supervisor("u1"), &session_id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Closed);
    }
}
