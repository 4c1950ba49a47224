use crate::models::ReportType;
use serde::{Deserialize, Serialize};

/// 구역 참조 데이터 (읽기 전용)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub is_support_hours: bool,
    pub is_production_advance: bool,
    pub is_quick_count: bool,
    pub is_active: bool,
}

impl Area {
    /// 이 구역을 해당 보고서 종류에서 쓸 수 있는지
    ///
    /// SANITATION은 구역을 쓰지 않으므로 항상 false입니다.
    pub fn allows(&self, report_type: ReportType) -> bool {
        match report_type {
            ReportType::SupportHours => self.is_support_hours,
            ReportType::ProductionAdvance => self.is_production_advance,
            ReportType::QuickCount => self.is_quick_count,
            ReportType::Sanitation => false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AreaQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}
