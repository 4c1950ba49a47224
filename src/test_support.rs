//! 테스트 공용 픽스처: 메모리/파일 DB, 시드 데이터, 가짜 디렉터리, 호출자

use crate::middleware::auth::AuthUser;
use crate::models::DirectoryWorker;
use crate::services::clock;
use crate::services::directory::{DirectoryError, DirectoryLookup, WorkerDirectory};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

pub const AREA_FILLETING: i64 = 1;
pub const AREA_INTAKE: i64 = 2;
pub const AREA_PACKING: i64 = 3;
pub const AREA_RETIRED: i64 = 4;

/// 마이그레이션과 구역 시드가 적용된 메모리 DB (연결 1개)
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("memory database");

    prepare(&pool).await;
    pool
}

/// 연결 5개짜리 파일 DB. 운영과 같은 WAL + busy_timeout 설정입니다.
///
/// `TempDir`이 drop되면 파일이 지워지므로 테스트가 끝날 때까지 잡고 있어야 합니다.
pub async fn file_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("trabunda.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(StdDuration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("file database");

    prepare(&pool).await;
    (pool, dir)
}

async fn prepare(pool: &SqlitePool) {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .expect("migrations");

    sqlx::query(
        r#"
        INSERT INTO areas (id, name, is_support_hours, is_production_advance, is_quick_count, is_active)
        VALUES (1, 'Fileteo', 1, 1, 1, 1),
               (2, 'Recepcion', 1, 0, 0, 1),
               (3, 'Empaque', 0, 1, 1, 1),
               (4, 'Antigua', 1, 1, 1, 0)
        "#,
    )
    .execute(pool)
    .await
    .expect("seed areas");
}

/// 캐시에 워커를 넣습니다. `days_old`만큼 과거에 갱신된 것으로 기록합니다.
pub async fn seed_worker(
    pool: &SqlitePool,
    code: &str,
    document: Option<&str>,
    full_name: &str,
    days_old: i64,
) {
    let refreshed_at = clock::format_timestamp(Utc::now() - Duration::days(days_old));
    sqlx::query(
        "INSERT INTO workers (code, document, full_name, sex, is_active, refreshed_at) \
         VALUES (?, ?, ?, NULL, 1, ?)",
    )
    .bind(code)
    .bind(document)
    .bind(full_name)
    .bind(refreshed_at)
    .execute(pool)
    .await
    .expect("seed worker");
}

/// 캐시의 워커를 비활성으로 표시합니다.
pub async fn deactivate_worker(pool: &SqlitePool, code: &str) {
    sqlx::query("UPDATE workers SET is_active = 0 WHERE code = ?")
        .bind(code)
        .execute(pool)
        .await
        .expect("deactivate worker");
}

pub fn supervisor(id: &str) -> AuthUser {
    AuthUser {
        user_id: id.to_string(),
        name: format!("Supervisor {}", id),
        roles: vec!["SUPERVISOR".to_string()],
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: "admin".to_string(),
        name: "Admin".to_string(),
        roles: vec!["ADMINISTRADOR".to_string()],
    }
}

/// 호출 횟수를 세는 메모리 디렉터리
pub struct FakeDirectory {
    workers: Vec<DirectoryWorker>,
    unavailable: bool,
    delay: Option<StdDuration>,
    calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            workers: Vec::new(),
            unavailable: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 모든 호출이 전송 실패로 끝나는 디렉터리
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn with_worker(mut self, code: &str, document: &str, first: &str, last: &str) -> Self {
        self.workers.push(DirectoryWorker {
            code: code.to_string(),
            first_names: first.to_string(),
            last_names: last.to_string(),
            sex: None,
            document: Some(document.to_string()),
        });
        self
    }

    /// 응답마다 `delay`만큼 늦게 답합니다.
    pub fn with_delay(mut self, delay: StdDuration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(
        &self,
        matches: impl Fn(&DirectoryWorker) -> bool,
    ) -> Result<DirectoryLookup, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(DirectoryError::Transport("connection refused".to_string()));
        }
        Ok(self
            .workers
            .iter()
            .find(|w| matches(w))
            .cloned()
            .map(DirectoryLookup::Found)
            .unwrap_or(DirectoryLookup::NotFound))
    }
}

#[async_trait]
impl WorkerDirectory for FakeDirectory {
    async fn lookup_by_code(&self, code: &str) -> Result<DirectoryLookup, DirectoryError> {
        self.answer(|w| w.code == code).await
    }

    async fn lookup_by_document(
        &self,
        document: &str,
    ) -> Result<DirectoryLookup, DirectoryError> {
        self.answer(|w| w.document.as_deref() == Some(document)).await
    }
}

/// 공용 조회기 (빈 디렉터리)
pub fn resolver(pool: &SqlitePool) -> crate::services::resolver::WorkerResolver {
    crate::services::resolver::WorkerResolver::new(pool.clone(), Arc::new(FakeDirectory::new()), 7)
}
