//! # 워커(작업자) 모델
//!
//! 외부 워커 디렉터리가 원본이고, `workers` 테이블은 로컬 미러(캐시)입니다.

use serde::{Deserialize, Serialize};

/// `workers` 캐시 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkerRecord {
    /// 5자리로 0-패딩된 내부 코드 (기본키)
    pub code: String,
    /// 국가 신분증 번호 (8자리)
    pub document: Option<String>,
    pub full_name: String,
    pub sex: Option<String>,
    pub is_active: bool,
    /// 마지막으로 디렉터리에서 갱신한 시각 (ISO 8601)
    pub refreshed_at: String,
}

/// 조회 질의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Code,
    Document,
}

/// 결과를 어디서 가져왔는지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Cache,
    Directory,
}

/// 호출자에게 돌려주는 정규화된 워커 정보
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedWorker {
    pub code: String,
    pub document: Option<String>,
    pub name: String,
}

impl From<WorkerRecord> for ResolvedWorker {
    fn from(record: WorkerRecord) -> Self {
        Self {
            code: record.code,
            document: record.document,
            name: record.full_name,
        }
    }
}

/// 디렉터리가 돌려준 워커 (원본 레코드)
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryWorker {
    pub code: String,
    pub first_names: String,
    pub last_names: String,
    pub sex: Option<String>,
    pub document: Option<String>,
}

impl DirectoryWorker {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names.trim(), self.last_names.trim())
            .trim()
            .to_string()
    }
}

/// `GET /api/v1/workers/lookup?q=...`
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub q: Option<String>,
}

/// 조회 결과 응답
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub ok: bool,
    pub kind: LookupKind,
    /// 정규화된 질의 (코드는 0-패딩, 문서번호는 그대로)
    pub query: String,
    pub worker: ResolvedWorker,
    pub source: LookupSource,
}
