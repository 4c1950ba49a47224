//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `area`: 구역 참조 데이터
//! - `crew`: 크루와 크루-작업자 배정, 수율 집계
//! - `line`: 보고서 라인과 부분 업데이트
//! - `patch`: PATCH 요청의 세 가지 상태(누락/지정/삭제)
//! - `session`: 보고서 세션, 종류, 교대, 상태
//! - `worker`: 워커 캐시와 조회 결과
//!
//! `pub use X::*;`로 재공개하여 `crate::models::LineItem`처럼 짧게 접근합니다.

pub mod area;
pub mod crew;
pub mod line;
pub mod patch;
pub mod session;
pub mod worker;

pub use area::*;
pub use crew::*;
pub use line::*;
pub use patch::*;
pub use session::*;
pub use worker::*;
