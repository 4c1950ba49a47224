//! # 보고서 세션 모델 정의
//!
//! 교대(shift) 한 번 동안의 보고 활동을 나타내는 구조체와 열거형입니다.
//!
//! ## 세션 흐름
//! ```text
//! open_or_create() → OPEN ──(모든 라인 완료)──▶ CLOSED
//!                     ▲                           │
//!                     └────(미완료 라인 추가)─────┘
//! ```
//!
//! 보고서 종류(`ReportType`)는 닫힌 집합입니다. 종류별로 구역 요구사항,
//! 만료 여부, 자동 마감 여부가 다릅니다.

use crate::error::AppError;
use crate::models::patch::double_option;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 보고서 종류 (닫힌 열거형)
///
/// DB와 JSON에는 `SUPPORT_HOURS`처럼 대문자 스네이크 케이스로 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    /// 시간제 지원: 구역은 라인 단위로 지정
    SupportHours,
    /// 위생 작업: 구역 없음, 라인마다 작업 내용 필수
    Sanitation,
    /// 작업 진척: 세션 구역 필수, 라인마다 수량 필수
    ProductionAdvance,
    /// 빠른 집계: 세션 구역 필수
    QuickCount,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::SupportHours => "SUPPORT_HOURS",
            ReportType::Sanitation => "SANITATION",
            ReportType::ProductionAdvance => "PRODUCTION_ADVANCE",
            ReportType::QuickCount => "QUICK_COUNT",
        }
    }

    /// 세션에 만료 시각을 두는 종류인지 (SUPPORT_HOURS, SANITATION)
    pub fn has_expiry(&self) -> bool {
        matches!(self, ReportType::SupportHours | ReportType::Sanitation)
    }

    /// 라인 완료 여부로 자동 마감되는 종류인지
    pub fn auto_closes(&self) -> bool {
        self.has_expiry()
    }

    /// 세션(헤더) 수준에서 구역이 필요한지
    pub fn requires_session_area(&self) -> bool {
        matches!(self, ReportType::ProductionAdvance | ReportType::QuickCount)
    }
}

/// 원래 시스템의 스페인어 이름도 받아들입니다.
/// `APOYOS_HORAS`처럼 정규 목록과 다른 철자는 받지 않습니다.
impl FromStr for ReportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SUPPORT_HOURS" | "APOYO_HORAS" => Ok(ReportType::SupportHours),
            "SANITATION" | "SANEAMIENTO" => Ok(ReportType::Sanitation),
            "PRODUCTION_ADVANCE" | "TRABAJO_AVANCE" => Ok(ReportType::ProductionAdvance),
            "QUICK_COUNT" | "CONTEO_RAPIDO" => Ok(ReportType::QuickCount),
            other => Err(AppError::validation(
                "report_type",
                format!("unknown report type `{}`", other),
            )),
        }
    }
}

/// 교대 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Shift {
    Day,
    Night,
}

impl FromStr for Shift {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Day" | "DAY" | "Dia" | "Día" | "DIA" => Ok(Shift::Day),
            "Night" | "NIGHT" | "Noche" | "NOCHE" => Ok(Shift::Night),
            other => Err(AppError::validation(
                "shift",
                format!("unknown shift `{}`", other),
            )),
        }
    }
}

/// 세션 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// 보고서 세션 엔티티: `report_sessions` 테이블 한 행 (+ 구역 이름)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportSession {
    /// 세션 고유 식별자 (UUIDv7)
    pub id: String,
    /// 보고 날짜 (YYYY-MM-DD)
    pub report_date: String,
    pub shift: Shift,
    pub report_type: ReportType,
    /// PRODUCTION_ADVANCE / QUICK_COUNT에서만 채워짐
    pub area_id: Option<i64>,
    /// `areas` 테이블과 LEFT JOIN한 구역 이름
    pub area_name: Option<String>,
    pub creator_id: String,
    pub creator_name: String,
    pub notes: Option<String>,
    pub status: SessionStatus,
    /// 소프트 삭제 플래그. OPEN/CLOSED와는 별개입니다.
    pub is_active: bool,
    /// SUPPORT_HOURS / SANITATION에서만 설정
    pub expires_at: Option<String>,
    pub closed_at: Option<String>,
    /// 같은 튜플로 새 세션이 열리면 이전 세션에 기록됩니다.
    pub superseded_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ReportSession {
    /// 만료 시각이 지났는지 확인합니다.
    ///
    /// 만료가 없는 종류는 항상 false. 만료 시각을 해석할 수 없으면
    /// 만료된 것으로 봅니다 (새 세션을 여는 쪽이 안전).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if !self.report_type.has_expiry() {
            return false;
        }
        match self.expires_at.as_deref() {
            Some(ts) => match crate::services::clock::parse_timestamp(ts) {
                Some(expires) => expires <= now,
                None => true,
            },
            None => false,
        }
    }

    /// `open_or_create`가 그대로 돌려줄 수 있는 세션인지
    pub fn is_live_open(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Open
            && self.is_active
            && self.superseded_at.is_none()
            && !self.is_expired(now)
    }
}

/// 세션 열기 요청: `POST /api/v1/reports`
///
/// 종류/교대는 문자열로 받아서 직접 파싱합니다. 잘못된 값이면
/// 필드 이름이 담긴 검증 에러를 돌려주기 위해서입니다.
#[derive(Debug, Deserialize)]
pub struct OpenReportRequest {
    pub report_date: Option<String>,
    pub shift: Option<String>,
    pub report_type: Option<String>,
    pub area_id: Option<i64>,
    pub notes: Option<String>,
}

/// 세션 헤더 수정 요청: `PATCH /api/v1/reports/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub report_date: Option<String>,
    pub shift: Option<String>,
    pub area_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub clear: Vec<String>,
}

/// 활성/비활성 전환 요청: `PATCH /api/v1/reports/{id}/active`
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// 목록 조회 쿼리: `GET /api/v1/reports?from=...&type=...`
#[derive(Debug, Default, Deserialize)]
pub struct ListReportsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub shift: Option<String>,
    pub area_id: Option<i64>,
    pub creator_id: Option<String>,
    pub active: Option<bool>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order_by: Option<String>,
    pub dir: Option<String>,
}

/// 페이지네이션된 목록 응답
#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub items: Vec<ReportSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_accepts_canonical_and_legacy_names() {
        assert_eq!("SUPPORT_HOURS".parse::<ReportType>().unwrap(), ReportType::SupportHours);
        assert_eq!("APOYO_HORAS".parse::<ReportType>().unwrap(), ReportType::SupportHours);
        assert_eq!("SANEAMIENTO".parse::<ReportType>().unwrap(), ReportType::Sanitation);
        assert_eq!("CONTEO_RAPIDO".parse::<ReportType>().unwrap(), ReportType::QuickCount);
    }

    #[test]
    fn divergent_hours_spelling_is_rejected() {
        let err = "APOYOS_HORAS".parse::<ReportType>().unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "report_type", .. }));
    }

    #[test]
    fn shift_accepts_spanish_spellings() {
        assert_eq!("Día".parse::<Shift>().unwrap(), Shift::Day);
        assert_eq!("Dia".parse::<Shift>().unwrap(), Shift::Day);
        assert_eq!("Noche".parse::<Shift>().unwrap(), Shift::Night);
        assert!("Tarde".parse::<Shift>().is_err());
    }

    #[test]
    fn only_hour_and_sanitation_reports_expire() {
        assert!(ReportType::SupportHours.has_expiry());
        assert!(ReportType::Sanitation.has_expiry());
        assert!(!ReportType::ProductionAdvance.has_expiry());
        assert!(!ReportType::QuickCount.has_expiry());
    }
}
