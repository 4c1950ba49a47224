//! # 크루(작업 조) 모델
//!
//! 여러 작업자가 함께 생산량(kg)을 인정받는 단위입니다.
//! 수율(yield) 같은 파생 지표는 저장하지 않고 조회 시점에 계산합니다.

use crate::error::AppError;
use crate::models::patch::double_option;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 크루 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrewType {
    /// 원료 입고
    Intake,
    /// 필레 가공
    Filleting,
    /// 입고 지원
    IntakeSupport,
}

impl FromStr for CrewType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "INTAKE" => Ok(CrewType::Intake),
            "FILLETING" => Ok(CrewType::Filleting),
            "INTAKE_SUPPORT" => Ok(CrewType::IntakeSupport),
            other => Err(AppError::validation(
                "crew_type",
                format!("unknown crew type `{}`", other),
            )),
        }
    }
}

/// 지원 크루의 지원 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportScope {
    /// 세션 전체 지원
    Global,
    /// 특정 FILLETING 크루 지원 (`filleting_crew_id` 필수)
    Crew,
}

impl FromStr for SupportScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "GLOBAL" => Ok(SupportScope::Global),
            "CREW" => Ok(SupportScope::Crew),
            other => Err(AppError::validation(
                "support_scope",
                format!("unknown support scope `{}`", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Crew {
    pub id: String,
    pub session_id: String,
    pub crew_type: CrewType,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// 생산량(kg). 입고 크루라면 입고량입니다.
    pub production_kg: Option<f64>,
    pub support_scope: Option<SupportScope>,
    pub filleting_crew_id: Option<String>,
    pub created_at: String,
}

/// 크루-작업자 배정 (크루당 작업자 코드는 유일)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CrewWorker {
    pub id: String,
    pub crew_id: String,
    pub worker_code: String,
    pub worker_name: String,
    pub kg: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCrewRequest {
    pub crew_type: String,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub production_kg: Option<f64>,
    pub support_scope: Option<String>,
    pub filleting_crew_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCrewRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub production_kg: Option<Option<f64>>,
    #[serde(default)]
    pub clear: Vec<String>,
}

/// 작업자 배정 요청. `worker`는 코드 또는 문서번호(8자리)입니다.
#[derive(Debug, Deserialize)]
pub struct AssignWorkerRequest {
    pub worker: String,
    pub kg: Option<f64>,
}

/// 입고량 기준 파생 수율 (kg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Yields {
    pub fillet_kg: f64,
    pub trim_kg: f64,
    pub fin_kg: f64,
}

/// 크루 하나의 조회용 뷰
#[derive(Debug, Serialize)]
pub struct CrewView {
    #[serde(flatten)]
    pub crew: Crew,
    pub workers: Vec<CrewWorker>,
    pub worker_count: usize,
    pub elapsed_hours: f64,
    /// kg / (경과 시간 × 인원). 어느 한쪽이 0이면 0.
    pub throughput_kg_per_worker_hour: f64,
}

/// 종류별 크루 집계
#[derive(Debug, Serialize)]
pub struct CrewGroupSummary {
    pub crew_type: CrewType,
    pub crew_count: usize,
    pub worker_count: usize,
    pub total_kg: f64,
    pub yields: Yields,
    pub crews: Vec<CrewView>,
}

#[derive(Debug, Serialize)]
pub struct CrewSummary {
    pub session_id: String,
    pub total_kg: f64,
    pub groups: Vec<CrewGroupSummary>,
}
