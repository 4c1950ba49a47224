//! # 워커 조회기 (cache-aside)
//!
//! 자유 형식 질의를 정규화된 워커 정보로 바꿉니다.
//!
//! ## 분류
//! - 공백 제거 후 정확히 숫자 8자리 → 문서번호(`Document`)
//! - 그 외 → 내부 코드(`Code`), 5자리로 0-패딩
//! - 20자를 넘으면 조회 전에 `InvalidCode`
//!
//! ## 조회 경로
//! ```text
//! Code     ─▶ 캐시 ─(miss)─▶ NotFound           (원격 조회 없음)
//! Document ─▶ 캐시 ─(hit)──▶ 반환 + (오래됐으면) 백그라운드 갱신
//!                 └(miss)─▶ 디렉터리 ─▶ upsert ─▶ 반환
//! ```
//!
//! 캐시에 비활성(`is_active = 0`)으로 남은 워커는 없는 워커와 같이 `NotFound`입니다.
//!
//! 백그라운드 갱신은 `tokio::spawn`으로 분리되어 호출자의 응답을
//! 늦추거나 실패시키지 않습니다. 갱신 실패는 로그만 남깁니다.
//! 같은 문서번호의 갱신은 한 번에 하나만 돕니다.

use crate::db;
use crate::error::AppError;
use crate::models::{
    DirectoryWorker, LookupKind, LookupSource, Resolution, ResolvedWorker, WorkerRecord,
};
use crate::services::clock;
use crate::services::directory::{DirectoryError, DirectoryLookup, WorkerDirectory};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// 내부 코드의 정규 폭
pub const CODE_WIDTH: usize = 5;
/// 문서번호 길이
pub const DOCUMENT_LEN: usize = 8;
/// 질의 최대 길이
pub const MAX_QUERY_LEN: usize = 20;

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        AppError::DirectoryUnavailable(e.to_string())
    }
}

/// 분류가 끝난 질의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedQuery {
    pub kind: LookupKind,
    /// 코드는 0-패딩, 문서번호는 그대로
    pub normalized: String,
}

/// 코드를 정규 폭으로 0-패딩합니다. 이미 더 길면 그대로 둡니다.
pub fn normalize_code(code: &str) -> String {
    format!("{:0>width$}", code.trim(), width = CODE_WIDTH)
}

fn is_document(q: &str) -> bool {
    q.len() == DOCUMENT_LEN && q.bytes().all(|b| b.is_ascii_digit())
}

/// 질의를 문서번호/코드로 분류합니다.
pub fn classify(raw: &str) -> Result<ClassifiedQuery, AppError> {
    let q = raw.trim();
    if q.is_empty() {
        return Err(AppError::validation("q", "a worker code or document is required"));
    }
    if q.chars().count() > MAX_QUERY_LEN {
        return Err(AppError::InvalidCode(format!(
            "query is longer than {} characters",
            MAX_QUERY_LEN
        )));
    }

    if is_document(q) {
        Ok(ClassifiedQuery {
            kind: LookupKind::Document,
            normalized: q.to_string(),
        })
    } else {
        Ok(ClassifiedQuery {
            kind: LookupKind::Code,
            normalized: normalize_code(q),
        })
    }
}

/// 디렉터리 레코드를 캐시 행으로 바꿉니다.
/// 디렉터리가 문서번호를 주지 않으면 조회에 쓴 문서번호를 기록합니다.
fn cache_record(worker: &DirectoryWorker, queried_document: Option<&str>) -> WorkerRecord {
    WorkerRecord {
        code: normalize_code(&worker.code),
        document: worker
            .document
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .or_else(|| queried_document.map(str::to_string)),
        full_name: worker.full_name(),
        sex: worker.sex.clone(),
        is_active: true,
        refreshed_at: clock::now_timestamp(),
    }
}

/// 워커 조회기. 라우트와 라인/크루 서비스가 공유합니다.
#[derive(Clone)]
pub struct WorkerResolver {
    pool: SqlitePool,
    directory: Arc<dyn WorkerDirectory>,
    stale_after: Duration,
    /// 갱신 중인 문서번호
    refreshing: Arc<Mutex<HashSet<String>>>,
}

/// 갱신 작업이 끝나면(패닉 포함) 문서번호를 집합에서 뺍니다.
struct RefreshSlot {
    refreshing: Arc<Mutex<HashSet<String>>>,
    document: String,
}

impl RefreshSlot {
    /// 이미 갱신 중이면 None
    fn claim(refreshing: &Arc<Mutex<HashSet<String>>>, document: &str) -> Option<Self> {
        let inserted = refreshing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.to_string());

        inserted.then(|| Self {
            refreshing: Arc::clone(refreshing),
            document: document.to_string(),
        })
    }
}

impl Drop for RefreshSlot {
    fn drop(&mut self) {
        self.refreshing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.document);
    }
}

impl WorkerResolver {
    pub fn new(pool: SqlitePool, directory: Arc<dyn WorkerDirectory>, refresh_days: i64) -> Self {
        Self {
            pool,
            directory,
            stale_after: Duration::days(refresh_days),
            refreshing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn directory(&self) -> &Arc<dyn WorkerDirectory> {
        &self.directory
    }

    /// 자유 형식 질의를 분류해서 조회합니다.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution, AppError> {
        let classified = classify(raw)?;
        match classified.kind {
            LookupKind::Code => self.resolve_code_normalized(&classified.normalized).await,
            LookupKind::Document => self.resolve_document_normalized(&classified.normalized).await,
        }
    }

    /// 코드로 명시된 참조를 조회합니다 (분류 생략).
    pub async fn resolve_code(&self, code: &str) -> Result<Resolution, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::validation("worker_code", "must not be empty"));
        }
        if code.chars().count() > MAX_QUERY_LEN {
            return Err(AppError::InvalidCode(format!(
                "code is longer than {} characters",
                MAX_QUERY_LEN
            )));
        }
        self.resolve_code_normalized(&normalize_code(code)).await
    }

    /// 문서번호로 명시된 참조를 조회합니다.
    pub async fn resolve_document(&self, document: &str) -> Result<Resolution, AppError> {
        let document = document.trim();
        if !is_document(document) {
            return Err(AppError::validation(
                "worker_document",
                format!("`{}` is not an {}-digit document number", document, DOCUMENT_LEN),
            ));
        }
        self.resolve_document_normalized(document).await
    }

    async fn resolve_code_normalized(&self, code: &str) -> Result<Resolution, AppError> {
        let cached = db::find_worker_by_code(&self.pool, code).await?;

        tracing::info!(
            q = %code,
            kind = "code",
            cache_hit = cached.is_some(),
            directory_called = false,
            "Worker lookup"
        );

        let record = cached
            .filter(|w| w.is_active)
            .ok_or(AppError::NotFound("worker"))?;
        Ok(Resolution {
            ok: true,
            kind: LookupKind::Code,
            query: code.to_string(),
            worker: ResolvedWorker::from(record),
            source: LookupSource::Cache,
        })
    }

    async fn resolve_document_normalized(&self, document: &str) -> Result<Resolution, AppError> {
        if let Some(record) = db::find_worker_by_document(&self.pool, document).await? {
            tracing::info!(
                q = %document,
                kind = "document",
                cache_hit = true,
                directory_called = false,
                "Worker lookup"
            );

            if !record.is_active {
                return Err(AppError::NotFound("worker"));
            }
            if self.is_stale(&record) {
                self.spawn_refresh(document.to_string());
            }

            return Ok(Resolution {
                ok: true,
                kind: LookupKind::Document,
                query: document.to_string(),
                worker: ResolvedWorker::from(record),
                source: LookupSource::Cache,
            });
        }

        let lookup = self.directory.lookup_by_document(document).await;
        let outcome = match &lookup {
            Ok(DirectoryLookup::Found(_)) => "found",
            Ok(DirectoryLookup::NotFound) => "not_found",
            Err(_) => "error",
        };

        tracing::info!(
            q = %document,
            kind = "document",
            cache_hit = false,
            directory_called = true,
            outcome,
            "Worker lookup"
        );

        let worker = match lookup? {
            DirectoryLookup::Found(worker) => worker,
            DirectoryLookup::NotFound => return Err(AppError::NotFound("worker")),
        };

        let record = cache_record(&worker, Some(document));
        db::upsert_worker(&self.pool, &record).await?;

        Ok(Resolution {
            ok: true,
            kind: LookupKind::Document,
            query: document.to_string(),
            worker: ResolvedWorker::from(record),
            source: LookupSource::Directory,
        })
    }

    /// 마지막 갱신 시각을 해석할 수 없으면 오래된 것으로 봅니다.
    fn is_stale(&self, record: &WorkerRecord) -> bool {
        match clock::parse_timestamp(&record.refreshed_at) {
            Some(refreshed) => Utc::now() - refreshed >= self.stale_after,
            None => true,
        }
    }

    /// 백그라운드 갱신을 띄웁니다. 결과를 기다리지 않습니다.
    fn spawn_refresh(&self, document: String) {
        let Some(slot) = RefreshSlot::claim(&self.refreshing, &document) else {
            tracing::debug!(q = %document, "Worker cache refresh already in flight");
            return;
        };
        let pool = self.pool.clone();
        let directory = Arc::clone(&self.directory);

        tokio::spawn(async move {
            let _slot = slot;
            match refresh_document(&pool, directory.as_ref(), &document).await {
                Ok(true) => tracing::debug!(q = %document, "Worker cache refreshed"),
                Ok(false) => {
                    tracing::debug!(q = %document, "Directory no longer knows worker; cache kept")
                }
                Err(e) => tracing::warn!(q = %document, error = %e, "Worker cache refresh failed"),
            }
        });
    }
}

/// 디렉터리에서 다시 읽어 캐시를 덮어씁니다. 갱신했으면 true.
async fn refresh_document(
    pool: &SqlitePool,
    directory: &dyn WorkerDirectory,
    document: &str,
) -> Result<bool, AppError> {
    match directory.lookup_by_document(document).await? {
        DirectoryLookup::Found(worker) => {
            db::upsert_worker(pool, &cache_record(&worker, Some(document))).await?;
            Ok(true)
        }
        DirectoryLookup::NotFound => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{deactivate_worker, memory_pool, seed_worker, FakeDirectory};

    #[test]
    fn eight_digits_is_a_document() {
        let q = classify(" 12345678 ").unwrap();
        assert_eq!(q.kind, LookupKind::Document);
        assert_eq!(q.normalized, "12345678");
    }

    #[test]
    fn short_values_are_padded_codes() {
        let q = classify("123").unwrap();
        assert_eq!(q.kind, LookupKind::Code);
        assert_eq!(q.normalized, "00123");

        // 숫자 7자리는 문서번호가 아님
        assert_eq!(classify("1234567").unwrap().kind, LookupKind::Code);
    }

    #[test]
    fn over_length_query_is_rejected_before_lookup() {
        let err = classify("123456789012345678901").unwrap_err();
        assert!(matches!(err, AppError::InvalidCode(_)));
    }

    #[test]
    fn empty_query_names_the_field() {
        assert!(matches!(
            classify("   ").unwrap_err(),
            AppError::Validation { field: "q", .. }
        ));
    }

    #[tokio::test]
    async fn code_lookup_never_calls_the_directory() {
        let pool = memory_pool().await;
        let directory = Arc::new(FakeDirectory::new());
        let resolver = WorkerResolver::new(pool.clone(), directory.clone(), 7);

        let err = resolver.resolve("42").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("worker")));
        assert_eq!(directory.calls(), 0);

        seed_worker(&pool, "00042", Some("11112222"), "Rosa Paredes", 0).await;
        let found = resolver.resolve("42").await.unwrap();
        assert_eq!(found.worker.name, "Rosa Paredes");
        assert_eq!(found.source, LookupSource::Cache);
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn first_document_lookup_calls_once_then_serves_from_cache() {
        let pool = memory_pool().await;
        let directory = Arc::new(FakeDirectory::new().with_worker("123", "12345678", "Ana", "Quispe"));
        let resolver = WorkerResolver::new(pool.clone(), directory.clone(), 7);

        let first = resolver.resolve("12345678").await.unwrap();
        assert_eq!(first.source, LookupSource::Directory);
        assert_eq!(first.worker.code, "00123");
        assert_eq!(directory.calls(), 1);

        let cached = db::find_worker_by_code(&pool, "00123").await.unwrap().unwrap();
        assert_eq!(cached.document.as_deref(), Some("12345678"));

        let second = resolver.resolve("12345678").await.unwrap();
        assert_eq!(second.source, LookupSource::Cache);
        assert_eq!(directory.calls(), 1);

        // 코드로도 바로 찾을 수 있어야 함
        let by_code = resolver.resolve("123").await.unwrap();
        assert_eq!(by_code.worker.name, "Ana Quispe");
    }

    #[tokio::test]
    async fn stale_cache_hit_returns_immediately_and_refreshes_in_background() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00123", Some("12345678"), "Ana Old", 10).await;
        let directory = Arc::new(FakeDirectory::new().with_worker("123", "12345678", "Ana", "Nueva"));
        let resolver = WorkerResolver::new(pool.clone(), directory.clone(), 7);

        let hit = resolver.resolve("12345678").await.unwrap();
        assert_eq!(hit.source, LookupSource::Cache);
        assert_eq!(hit.worker.name, "Ana Old");

        let mut refreshed = false;
        for _ in 0..100 {
            let row = db::find_worker_by_code(&pool, "00123").await.unwrap().unwrap();
            if row.full_name == "Ana Nueva" {
                refreshed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(refreshed, "background refresh never landed");
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_cache_hit_does_not_refresh() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00123", Some("12345678"), "Ana", 1).await;
        let directory = Arc::new(FakeDirectory::new());
        let resolver = WorkerResolver::new(pool, directory.clone(), 7);

        resolver.resolve("12345678").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn directory_not_found_and_unavailable_stay_distinct() {
        let pool = memory_pool().await;
        let resolver = WorkerResolver::new(pool.clone(), Arc::new(FakeDirectory::new()), 7);
        assert!(matches!(
            resolver.resolve("99999999").await.unwrap_err(),
            AppError::NotFound("worker")
        ));

        let down = WorkerResolver::new(pool, Arc::new(FakeDirectory::unavailable()), 7);
        assert!(matches!(
            down.resolve("99999999").await.unwrap_err(),
            AppError::DirectoryUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn explicit_document_must_have_eight_digits() {
        let pool = memory_pool().await;
        let resolver = WorkerResolver::new(pool, Arc::new(FakeDirectory::new()), 7);
        assert!(matches!(
            resolver.resolve_document("1234").await.unwrap_err(),
            AppError::Validation { field: "worker_document", .. }
        ));
    }

    #[tokio::test]
    async fn inactive_cached_worker_is_not_found() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00055", Some("55556666"), "Baja", 0).await;
        deactivate_worker(&pool, "00055").await;
        let directory = Arc::new(FakeDirectory::new().with_worker("55", "55556666", "Baja", "Nueva"));
        let resolver = WorkerResolver::new(pool, directory.clone(), 7);

        assert!(matches!(
            resolver.resolve("55").await.unwrap_err(),
            AppError::NotFound("worker")
        ));
        assert!(matches!(
            resolver.resolve("55556666").await.unwrap_err(),
            AppError::NotFound("worker")
        ));
        assert!(matches!(
            resolver.resolve_code("00055").await.unwrap_err(),
            AppError::NotFound("worker")
        ));
        // 비활성 행은 디렉터리로 되살리지 않음
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn burst_of_stale_hits_refreshes_once() {
        let pool = memory_pool().await;
        seed_worker(&pool, "00123", Some("12345678"), "Ana Old", 10).await;
        let directory = Arc::new(
            FakeDirectory::new()
                .with_worker("123", "12345678", "Ana", "Nueva")
                .with_delay(std::time::Duration::from_millis(100)),
        );
        let resolver = WorkerResolver::new(pool.clone(), directory.clone(), 7);

        for _ in 0..5 {
            let hit = resolver.resolve("12345678").await.unwrap();
            assert_eq!(hit.source, LookupSource::Cache);
        }

        let mut refreshed = false;
        for _ in 0..100 {
            let row = db::find_worker_by_code(&pool, "00123").await.unwrap().unwrap();
            if row.full_name == "Ana Nueva" {
                refreshed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(refreshed, "background refresh never landed");

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert_eq!(directory.calls(), 1);
        assert!(resolver.refreshing.lock().unwrap().is_empty());
    }
}
