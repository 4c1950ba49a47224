//! # 부분 업데이트(PATCH) 값 모델
//!
//! PATCH 요청에서 필드마다 세 가지 상태를 구분해야 합니다:
//! - 언급 안 함 → 그대로 둠 (`Patch::Unset`)
//! - 값 지정 → 덮어씀 (`Patch::Set`)
//! - 명시적 삭제 → NULL로 (`Patch::Clear`)
//!
//! JSON의 `null`만으로는 삭제하지 않습니다. 요청 본문의 `clear` 목록에
//! 필드 이름이 있어야만 `Clear`가 됩니다. 실수로 필드가 지워지는 것을 막습니다.

use crate::error::AppError;
use serde::{Deserialize, Deserializer};

/// 필드 하나에 대한 부분 업데이트 값
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Unset,
    Set(T),
    Clear,
}

impl<T> Patch<T> {
    /// 요청 본문의 원시 값과 clear 플래그로 Patch를 만듭니다.
    ///
    /// - clear 플래그가 있으면 값과 관계없이 `Clear`
    /// - `Some(Some(v))` → `Set(v)`
    /// - 필드 누락(`None`)이나 플래그 없는 `null`(`Some(None)`) → `Unset`
    pub fn from_parts(value: Option<Option<T>>, clear_requested: bool) -> Self {
        if clear_requested {
            return Patch::Clear;
        }
        match value {
            Some(Some(v)) => Patch::Set(v),
            _ => Patch::Unset,
        }
    }

    /// 현재 값에 Patch를 적용한 결과를 반환합니다.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unset => current,
            Patch::Set(v) => Some(v),
            Patch::Clear => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }
}

/// `#[serde(default, deserialize_with = "double_option")]`와 함께 사용합니다.
///
/// 필드 누락 → `None`, `null` → `Some(None)`, 값 → `Some(Some(v))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 요청의 `clear` 목록. 허용된 필드 이름만 받습니다.
#[derive(Debug)]
pub struct ClearFlags<'a> {
    fields: &'a [String],
}

impl<'a> ClearFlags<'a> {
    /// 허용 목록에 없는 필드 이름이 있으면 `clear` 필드에 대한 검증 에러를 반환합니다.
    pub fn new(fields: &'a [String], allowed: &[&str]) -> Result<Self, AppError> {
        if let Some(unknown) = fields.iter().find(|f| !allowed.contains(&f.as_str())) {
            return Err(AppError::validation(
                "clear",
                format!("field `{}` cannot be cleared", unknown),
            ));
        }
        Ok(Self { fields })
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}
