//! # 외부 워커 디렉터리 클라이언트
//!
//! 워커 신원의 원본은 외부 GraphQL 서비스입니다. 이 모듈은
//! `getWorker` 뮤테이션 한 번으로 워커를 조회합니다.
//!
//! 결과는 세 가지로 명확히 구분합니다:
//! - `Ok(DirectoryLookup::Found(..))`: 워커 있음
//! - `Ok(DirectoryLookup::NotFound)`: 디렉터리가 "없음"이라고 답함
//! - `Err(DirectoryError)`: 전송 실패나 프로토콜 위반 (빈 본문, 잘못된 JSON, 비정상 상태 코드)
//!
//! 문서번호 조회는 디렉터리 버전에 따라 인자 이름이 달라서
//! `dni` → `documento` → `porDni` 순서로 시도합니다.
//! "없음" 응답은 즉시 멈추고, 프로토콜 실패일 때만 다음 인자로 넘어갑니다.

use crate::models::DirectoryWorker;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// 디렉터리 호출 에러
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// 연결 실패, 타임아웃
    #[error("transport error: {0}")]
    Transport(String),

    /// 응답은 왔지만 해석할 수 없음
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// 조회 결과 (에러가 아닌 경우)
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryLookup {
    Found(DirectoryWorker),
    NotFound,
}

/// 워커 디렉터리 추상화. 테스트에서는 메모리 구현으로 바꿔 끼웁니다.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn lookup_by_code(&self, code: &str) -> Result<DirectoryLookup, DirectoryError>;

    async fn lookup_by_document(&self, document: &str)
        -> Result<DirectoryLookup, DirectoryError>;
}

/// GraphQL 인자 이름과 쿼리 문자열 한 쌍
struct LookupStrategy {
    arg: &'static str,
    query: &'static str,
}

const BY_CODE: LookupStrategy = LookupStrategy {
    arg: "codigo",
    query: r#"mutation GetWorkerByCodigo($codigo:String!){
  getWorker(codigo:$codigo){ ok worker{ id nombres apellidos sexo dni } errors { message } }
}"#,
};

const DOCUMENT_STRATEGIES: [LookupStrategy; 3] = [
    LookupStrategy {
        arg: "dni",
        query: r#"mutation GetWorkerByDni($dni:String!){
  getWorker(dni:$dni){ ok worker{ id nombres apellidos sexo dni } errors { message } }
}"#,
    },
    LookupStrategy {
        arg: "documento",
        query: r#"mutation GetWorkerByDocumento($documento:String!){
  getWorker(documento:$documento){ ok worker{ id nombres apellidos dni } errors { message } }
}"#,
    },
    LookupStrategy {
        arg: "porDni",
        query: r#"mutation GetWorkerByPorDni($porDni:String!){
  getWorker(porDni:$porDni){ ok worker{ id nombres apellidos dni } errors { message } }
}"#,
    },
];

// ── GraphQL 응답 구조 ──

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(rename = "getWorker")]
    get_worker: Option<GetWorkerPayload>,
}

#[derive(Debug, Deserialize)]
struct GetWorkerPayload {
    #[serde(default)]
    ok: bool,
    worker: Option<GraphQlWorker>,
    #[serde(default)]
    errors: Option<Vec<GraphQlMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlWorker {
    /// 디렉터리에 따라 문자열 또는 숫자
    id: serde_json::Value,
    nombres: Option<String>,
    apellidos: Option<String>,
    sexo: Option<String>,
    dni: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: Option<String>,
}

fn join_messages(messages: &[GraphQlMessage]) -> String {
    messages
        .iter()
        .filter_map(|m| m.message.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// HTTP 상태와 응답 본문을 조회 결과로 해석합니다.
fn interpret_response(status_ok: bool, status: u16, body: &str) -> Result<DirectoryLookup, DirectoryError> {
    if !status_ok {
        return Err(DirectoryError::Protocol(format!("HTTP {}", status)));
    }
    if body.trim().is_empty() {
        return Err(DirectoryError::Protocol("empty response body".to_string()));
    }

    let payload: GraphQlResponse = serde_json::from_str(body)
        .map_err(|e| DirectoryError::Protocol(format!("malformed JSON: {}", e)))?;

    let get_worker = payload.data.and_then(|d| d.get_worker).ok_or_else(|| {
        if payload.errors.is_empty() {
            DirectoryError::Protocol("response has no getWorker payload".to_string())
        } else {
            DirectoryError::Protocol(join_messages(&payload.errors))
        }
    })?;

    let worker = match (get_worker.ok, get_worker.worker) {
        (true, Some(worker)) => worker,
        _ => {
            if let Some(errors) = get_worker.errors.as_deref().filter(|e| !e.is_empty()) {
                tracing::debug!(errors = %join_messages(errors), "getWorker reported no worker");
            }
            return Ok(DirectoryLookup::NotFound);
        }
    };

    let code = match &worker.id {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(DirectoryError::Protocol(format!(
                "unexpected worker id `{}`",
                other
            )))
        }
    };
    if code.is_empty() {
        return Err(DirectoryError::Protocol("worker id is empty".to_string()));
    }

    Ok(DirectoryLookup::Found(DirectoryWorker {
        code,
        first_names: worker.nombres.unwrap_or_default(),
        last_names: worker.apellidos.unwrap_or_default(),
        sex: worker.sexo.filter(|s| !s.trim().is_empty()),
        document: worker.dni.filter(|s| !s.trim().is_empty()),
    }))
}

/// reqwest 기반 GraphQL 디렉터리 클라이언트
pub struct HttpWorkerDirectory {
    http_client: reqwest::Client,
    url: String,
}

impl HttpWorkerDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    async fn get_worker(
        &self,
        strategy: &LookupStrategy,
        value: &str,
    ) -> Result<DirectoryLookup, DirectoryError> {
        tracing::debug!(url = %self.url, arg = strategy.arg, value = %value, "Querying worker directory");

        let mut variables = serde_json::Map::new();
        variables.insert(strategy.arg.to_string(), json!(value));

        let response = self
            .http_client
            .post(&self.url)
            .json(&json!({
                "query": strategy.query,
                "variables": variables,
            }))
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        interpret_response(status.is_success(), status.as_u16(), &body)
    }
}

#[async_trait]
impl WorkerDirectory for HttpWorkerDirectory {
    async fn lookup_by_code(&self, code: &str) -> Result<DirectoryLookup, DirectoryError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(DirectoryLookup::NotFound);
        }
        self.get_worker(&BY_CODE, code).await
    }

    async fn lookup_by_document(
        &self,
        document: &str,
    ) -> Result<DirectoryLookup, DirectoryError> {
        let document = document.trim();
        if document.is_empty() {
            return Ok(DirectoryLookup::NotFound);
        }

        let mut last_error = None;
        for strategy in &DOCUMENT_STRATEGIES {
            match self.get_worker(strategy, document).await {
                Ok(lookup) => return Ok(lookup),
                Err(e) => {
                    tracing::warn!(arg = strategy.arg, error = %e, "Document lookup strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DirectoryError::Protocol("no lookup strategy succeeded".to_string())))
    }
}
