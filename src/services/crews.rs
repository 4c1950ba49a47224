//! # 크루/생산 추적
//!
//! 크루 생성과 작업자 배정, 그리고 조회 시점에 계산하는 파생 지표를 담당합니다.
//!
//! ## 수율 (입고량 기준, 저장하지 않음)
//! ```text
//! 필레 = kg × 0.48 × 0.80
//! 트림 = kg × 0.15 × 0.82
//! 지느러미 = kg × 0.16 × 0.90
//! ```
//!
//! ## 처리량
//! `kg ÷ (경과 시간 × 인원)`. 두 인수 중 하나라도 0 이하면 0입니다.

use crate::db;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{
    AssignWorkerRequest, ClearFlags, CreateCrewRequest, Crew, CrewGroupSummary, CrewSummary,
    CrewType, CrewView, CrewWorker, Patch, SupportScope, UpdateCrewRequest, Yields,
};
use crate::services::resolver::{normalize_code, WorkerResolver};
use crate::services::{clock, report_state};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;

const FILLET_FACTOR: f64 = 0.48 * 0.80;
const TRIM_FACTOR: f64 = 0.15 * 0.82;
const FIN_FACTOR: f64 = 0.16 * 0.90;

pub fn yields(intake_kg: f64) -> Yields {
    Yields {
        fillet_kg: clock::round2(intake_kg * FILLET_FACTOR),
        trim_kg: clock::round2(intake_kg * TRIM_FACTOR),
        fin_kg: clock::round2(intake_kg * FIN_FACTOR),
    }
}

pub fn throughput(kg: f64, elapsed_hours: f64, worker_count: usize) -> f64 {
    let workers = worker_count as f64;
    if elapsed_hours <= 0.0 || workers <= 0.0 {
        return 0.0;
    }
    clock::round2(kg / (elapsed_hours * workers))
}

/// 시작/종료가 모두 있고 구간이 유효할 때만 경과 시간을 계산합니다.
fn elapsed_hours(crew: &Crew) -> f64 {
    match (crew.start_time.as_deref(), crew.end_time.as_deref()) {
        (Some(start), Some(end)) => clock::span_hours(start, end).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// 크루 생산량. 크루에 기록이 없으면 작업자별 kg 합계를 씁니다.
fn crew_kg(crew: &Crew, workers: &[CrewWorker]) -> f64 {
    crew.production_kg
        .unwrap_or_else(|| workers.iter().filter_map(|w| w.kg).sum())
}

fn validate_kg(field: &'static str, kg: f64) -> Result<f64, AppError> {
    if !kg.is_finite() || kg < 0.0 {
        return Err(AppError::validation(field, format!("{} is not a non-negative weight", kg)));
    }
    Ok(kg)
}

fn build_view(crew: Crew, workers: Vec<CrewWorker>) -> CrewView {
    let elapsed = elapsed_hours(&crew);
    let kg = crew_kg(&crew, &workers);
    let worker_count = workers.len();
    CrewView {
        throughput_kg_per_worker_hour: throughput(kg, elapsed, worker_count),
        elapsed_hours: elapsed,
        worker_count,
        workers,
        crew,
    }
}

/// 크루를 읽고, 그 크루가 속한 세션에 호출자가 쓸 수 있는지 확인합니다.
async fn load_writable_crew(
    conn: &mut SqliteConnection,
    caller: &AuthUser,
    crew_id: &str,
) -> Result<Crew, AppError> {
    let crew = db::get_crew(&mut *conn, crew_id)
        .await?
        .ok_or(AppError::NotFound("crew"))?;
    report_state::load_writable(conn, caller, &crew.session_id).await?;
    Ok(crew)
}

pub async fn create_crew(
    pool: &SqlitePool,
    caller: &AuthUser,
    session_id: &str,
    req: CreateCrewRequest,
) -> Result<Crew, AppError> {
    let crew_type: CrewType = req.crew_type.parse()?;
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name", "is required"));
    }

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
    if let (Some(start), Some(end)) = (start_time.as_deref(), end_time.as_deref()) {
        clock::span_minutes(start, end)?;
    }
    let production_kg = req
        .production_kg
        .map(|kg| validate_kg("production_kg", kg))
        .transpose()?;

    let support_scope = match (crew_type, req.support_scope.as_deref()) {
        (CrewType::IntakeSupport, None) => Some(SupportScope::Global),
        (CrewType::IntakeSupport, Some(scope)) => Some(scope.parse::<SupportScope>()?),
        (_, None) => None,
        (_, Some(_)) => {
            return Err(AppError::validation(
                "support_scope",
                "only INTAKE_SUPPORT crews have a support scope",
            ))
        }
    };

    let mut tx = db::begin_write(pool).await?;
    let session = report_state::load_writable(&mut tx, caller, session_id).await?;

    let filleting_crew_id = match (support_scope, req.filleting_crew_id) {
        (Some(SupportScope::Crew), Some(target_id)) => {
            let target = db::get_crew(&mut *tx, &target_id)
                .await?
                .filter(|c| c.session_id == session.id)
                .ok_or(AppError::NotFound("crew"))?;
            if target.crew_type != CrewType::Filleting {
                return Err(AppError::validation(
                    "filleting_crew_id",
                    format!("crew `{}` is not a FILLETING crew", target.name),
                ));
            }
            Some(target.id)
        }
        (Some(SupportScope::Crew), None) => {
            return Err(AppError::validation(
                "filleting_crew_id",
                "is required for CREW-scoped support",
            ))
        }
        (_, Some(_)) => {
            return Err(AppError::validation(
                "filleting_crew_id",
                "is only accepted for CREW-scoped support",
            ))
        }
        (_, None) => None,
    };

    let crew = Crew {
        id: uuid::Uuid::now_v7().to_string(),
        session_id: session.id.clone(),
        crew_type,
        name,
        start_time,
        end_time,
        production_kg,
        support_scope,
        filleting_crew_id,
        created_at: clock::now_timestamp(),
    };
    db::insert_crew(&mut *tx, &crew).await?;
    tx.commit().await?;

    tracing::info!(crew_id = %crew.id, session_id = %crew.session_id, crew_type = ?crew.crew_type, "Crew created");
    Ok(crew)
}

/// 이름, 종료 시각, 생산량 수정
pub async fn update_crew(
    pool: &SqlitePool,
    caller: &AuthUser,
    crew_id: &str,
    req: UpdateCrewRequest,
) -> Result<Crew, AppError> {
    let clear = ClearFlags::new(&req.clear, &["end_time", "production_kg"])?;
    let name = req.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(AppError::validation("name", "must not be empty"));
    }
    let end_time = match Patch::from_parts(req.end_time, clear.has("end_time")) {
        Patch::Set(t) => Patch::Set(clock::normalize_time("end_time", &t)?),
        other => other,
    };
    let production_kg = match Patch::from_parts(req.production_kg, clear.has("production_kg")) {
        Patch::Set(kg) => Patch::Set(validate_kg("production_kg", kg)?),
        other => other,
    };
    if name.is_none() && end_time.is_unset() && production_kg.is_unset() {
        return Err(AppError::validation("body", "no fields to update"));
    }

    let mut tx = db::begin_write(pool).await?;
    let mut crew = load_writable_crew(&mut tx, caller, crew_id).await?;

    if let Some(name) = name {
        crew.name = name;
    }
    crew.end_time = end_time.apply(crew.end_time);
    crew.production_kg = production_kg.apply(crew.production_kg);
    if let (Some(start), Some(end)) = (crew.start_time.as_deref(), crew.end_time.as_deref()) {
        clock::span_minutes(start, end)?;
    }

    db::update_crew(&mut *tx, &crew).await?;
    tx.commit().await?;

    Ok(crew)
}

/// 작업자 배정. 신원은 워커 조회기로 확인하고, 같은 크루에 중복 배정하면 Conflict.
pub async fn assign_worker(
    pool: &SqlitePool,
    resolver: &WorkerResolver,
    caller: &AuthUser,
    crew_id: &str,
    req: AssignWorkerRequest,
) -> Result<CrewWorker, AppError> {
    let kg = req.kg.map(|kg| validate_kg("kg", kg)).transpose()?;

    // 권한 확인 후 트랜잭션 밖에서 워커 조회
    {
        let mut conn = pool.acquire().await?;
        load_writable_crew(&mut conn, caller, crew_id).await?;
    }
    let resolved = resolver.resolve(&req.worker).await?;

    let mut tx = db::begin_write(pool).await?;
    let crew = load_writable_crew(&mut tx, caller, crew_id).await?;

    let assignment = CrewWorker {
        id: uuid::Uuid::now_v7().to_string(),
        crew_id: crew.id,
        worker_code: resolved.worker.code,
        worker_name: resolved.worker.name,
        kg,
        created_at: clock::now_timestamp(),
    };

    db::insert_crew_worker(&mut *tx, &assignment)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(format!(
                    "worker {} is already assigned to this crew",
                    assignment.worker_code
                ))
            } else {
                e
            }
        })?;
    tx.commit().await?;

    tracing::info!(crew_id = %assignment.crew_id, worker = %assignment.worker_code, "Worker assigned to crew");
    Ok(assignment)
}

pub async fn remove_worker(
    pool: &SqlitePool,
    caller: &AuthUser,
    crew_id: &str,
    worker_code: &str,
) -> Result<(), AppError> {
    let code = normalize_code(worker_code);

    let mut tx = db::begin_write(pool).await?;
    load_writable_crew(&mut tx, caller, crew_id).await?;
    if !db::delete_crew_worker(&mut *tx, crew_id, &code).await? {
        return Err(AppError::NotFound("crew worker"));
    }
    tx.commit().await?;

    Ok(())
}

/// 세션의 크루 목록 (작업자와 파생 지표 포함)
pub async fn list_crews(
    pool: &SqlitePool,
    caller: &AuthUser,
    session_id: &str,
) -> Result<Vec<CrewView>, AppError> {
    let mut conn = pool.acquire().await?;
    report_state::load_visible(&mut conn, caller, session_id).await?;

    let crews = db::list_crews(&mut *conn, session_id).await?;
    let mut workers = db::list_session_crew_workers(&mut *conn, session_id).await?;

    Ok(crews
        .into_iter()
        .map(|crew| {
            let (mine, rest): (Vec<_>, Vec<_>) =
                workers.drain(..).partition(|w| w.crew_id == crew.id);
            workers = rest;
            build_view(crew, mine)
        })
        .collect())
}

/// 종류별로 묶은 크루 요약
pub async fn summary(
    pool: &SqlitePool,
    caller: &AuthUser,
    session_id: &str,
) -> Result<CrewSummary, AppError> {
    let views = list_crews(pool, caller, session_id).await?;

    let mut grouped: BTreeMap<CrewType, Vec<CrewView>> = BTreeMap::new();
    for view in views {
        grouped.entry(view.crew.crew_type).or_default().push(view);
    }

    let groups: Vec<CrewGroupSummary> = grouped
        .into_iter()
        .map(|(crew_type, crews)| {
            let total_kg = clock::round2(
                crews
                    .iter()
                    .map(|v| crew_kg(&v.crew, &v.workers))
                    .sum(),
            );
            CrewGroupSummary {
                crew_type,
                crew_count: crews.len(),
                worker_count: crews.iter().map(|v| v.worker_count).sum(),
                total_kg,
                yields: yields(total_kg),
                crews,
            }
        })
        .collect();

    Ok(CrewSummary {
        session_id: session_id.to_string(),
        total_kg: clock::round2(groups.iter().map(|g| g.total_kg).sum()),
        groups,
    })
}
