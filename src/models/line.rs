//! # 보고서 라인 모델
//!
//! 세션 안에 기록되는 작업자 1명(또는 크루 1개)의 항목입니다.
//! `end_time`이 없으면 "미완료(pending)" 라인입니다.

use crate::error::AppError;
use crate::models::patch::{double_option, ClearFlags, Patch};
use crate::models::{ReportType, SessionStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LineItem {
    pub id: String,
    pub session_id: String,
    pub worker_code: Option<String>,
    pub worker_name: Option<String>,
    pub worker_document: Option<String>,
    pub crew_id: Option<String>,
    /// `crews`와 LEFT JOIN한 크루 이름
    pub crew_name: Option<String>,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    /// "HH:MM"
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// 근무 시간 (시간 단위). end_time이 없으면 항상 None.
    pub hours: Option<f64>,
    pub task_description: Option<String>,
    pub quantity: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl LineItem {
    /// 보고서 종류별 "미완료" 판정
    ///
    /// - SUPPORT_HOURS: 종료 시각 없음
    /// - SANITATION: 종료 시각 없음 또는 작업 내용이 비어 있음
    /// - 그 외: 자동 마감 대상이 아니므로 항상 false
    pub fn is_pending(&self, report_type: ReportType) -> bool {
        match report_type {
            ReportType::SupportHours => self.end_time.is_none(),
            ReportType::Sanitation => {
                self.end_time.is_none()
                    || self
                        .task_description
                        .as_deref()
                        .map_or(true, |d| d.trim().is_empty())
            }
            ReportType::ProductionAdvance | ReportType::QuickCount => false,
        }
    }
}

/// 라인 생성 요청: `POST /api/v1/reports/{id}/lines`
///
/// 워커는 코드, 문서번호, 이름 중 하나 이상으로 지정합니다.
/// 코드나 문서번호가 있으면 워커 디렉터리로 신원을 확인합니다.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLineRequest {
    pub worker_code: Option<String>,
    pub worker_document: Option<String>,
    pub worker_name: Option<String>,
    pub crew_id: Option<String>,
    pub area_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub hours: Option<f64>,
    pub task_description: Option<String>,
    pub quantity: Option<f64>,
}

/// 라인 수정 요청: `PATCH /api/v1/lines/{id}`
///
/// 각 필드: 누락 = 변경 없음, 값 = 덮어쓰기,
/// `clear` 목록에 포함 = NULL로 지움.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLineRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub crew_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub area_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub task_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub quantity: Option<Option<f64>>,
    #[serde(default)]
    pub clear: Vec<String>,
}

/// 라인 생성/수정 응답. 변경 후 세션 상태를 함께 돌려줍니다.
#[derive(Debug, Serialize)]
pub struct LineOutcome {
    pub line: LineItem,
    pub session_status: SessionStatus,
    /// 기존 미완료 라인을 이어서 채웠으면 true
    pub continued: bool,
}

const CLEARABLE_LINE_FIELDS: &[&str] = &[
    "crew_id",
    "area_id",
    "start_time",
    "end_time",
    "hours",
    "task_description",
    "quantity",
];

/// 검증된 라인 부분 업데이트
#[derive(Debug, Default)]
pub struct LinePatch {
    pub crew_id: Patch<String>,
    pub area_id: Patch<i64>,
    pub start_time: Patch<String>,
    pub end_time: Patch<String>,
    pub hours: Patch<f64>,
    pub task_description: Patch<String>,
    pub quantity: Patch<f64>,
}

impl LinePatch {
    pub fn is_empty(&self) -> bool {
        self.crew_id.is_unset()
            && self.area_id.is_unset()
            && self.start_time.is_unset()
            && self.end_time.is_unset()
            && self.hours.is_unset()
            && self.task_description.is_unset()
            && self.quantity.is_unset()
    }
}

impl TryFrom<UpdateLineRequest> for LinePatch {
    type Error = AppError;

    fn try_from(req: UpdateLineRequest) -> Result<Self, Self::Error> {
        let clear = ClearFlags::new(&req.clear, CLEARABLE_LINE_FIELDS)?;
        Ok(LinePatch {
            crew_id: Patch::from_parts(req.crew_id, clear.has("crew_id")),
            area_id: Patch::from_parts(req.area_id, clear.has("area_id")),
            start_time: Patch::from_parts(req.start_time, clear.has("start_time")),
            end_time: Patch::from_parts(req.end_time, clear.has("end_time")),
            hours: Patch::from_parts(req.hours, clear.has("hours")),
            task_description: Patch::from_parts(
                req.task_description,
                clear.has("task_description"),
            ),
            quantity: Patch::from_parts(req.quantity, clear.has("quantity")),
        })
    }
}
