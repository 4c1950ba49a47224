//! # 서비스 계층
//!
//! 라우트 핸들러와 DB 쿼리 사이의 도메인 규칙을 담습니다.
//!
//! - `clock`: HH:MM 파싱, 자정 넘김 보정, 타임스탬프
//! - `crews`: 크루 생성/배정, 수율과 처리량 요약
//! - `directory`: 외부 워커 디렉터리 트레이트와 GraphQL 클라이언트
//! - `line_engine`: 라인 생성/수정/삭제와 종류별 필수 필드
//! - `report_state`: 세션 열기, 상태 재계산, 가시성, 목록
//! - `resolver`: 워커 조회 (캐시 우선, 필요 시 디렉터리)

pub mod clock;
pub mod crews;
pub mod directory;
pub mod line_engine;
pub mod report_state;
pub mod resolver;
