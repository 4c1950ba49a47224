//! # 시간 유틸리티
//!
//! - `HH:MM`(또는 `HH:MM:SS`) 근무 시각 파싱
//! - 자정을 넘는 교대(shift wrap) 보정과 근무 시간 계산
//! - DB에 저장하는 ISO 8601 타임스탬프 생성/파싱
//!
//! 근무 구간 규칙: 종료가 시작보다 이르면 24시간을 더합니다.
//! 보정 후 구간이 0 이하이거나 18시간을 넘으면 거부합니다.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

/// 한 라인의 최대 근무 시간 (분)
pub const MAX_SPAN_MINUTES: i64 = 18 * 60;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// DB 타임스탬프 포맷 (SQLite의 strftime('%Y-%m-%dT%H:%M:%fZ')와 같은 모양)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// "HH:MM" 또는 "HH:MM:SS"를 파싱합니다.
pub fn parse_time(t: &str) -> Option<NaiveTime> {
    let t = t.trim();
    NaiveTime::parse_from_str(t, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
        .ok()
}

/// 시각을 검증하고 "HH:MM" 형태로 정규화합니다.
pub fn normalize_time(field: &'static str, t: &str) -> Result<String, AppError> {
    let time = parse_time(t)
        .ok_or_else(|| AppError::validation(field, format!("`{}` is not a valid HH:MM time", t)))?;
    Ok(time.format("%H:%M").to_string())
}

fn minutes_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

/// 시작~종료 구간을 분 단위로 계산합니다 (자정 넘김 보정 포함).
///
/// 보정 후 구간이 0 이하이거나 18시간을 넘으면 `end_time` 검증 에러이며,
/// 메시지에 계산된 구간을 포함합니다.
pub fn span_minutes(start: &str, end: &str) -> Result<i64, AppError> {
    let start_t = parse_time(start).ok_or_else(|| {
        AppError::validation("start_time", format!("`{}` is not a valid HH:MM time", start))
    })?;
    let end_t = parse_time(end).ok_or_else(|| {
        AppError::validation("end_time", format!("`{}` is not a valid HH:MM time", end))
    })?;

    let mut diff = minutes_of_day(end_t) - minutes_of_day(start_t);
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }

    if diff <= 0 || diff > MAX_SPAN_MINUTES {
        return Err(AppError::validation(
            "end_time",
            format!(
                "span {} → {} is {} (must be greater than 00:00 and at most 18:00)",
                start,
                end,
                format_minutes(diff)
            ),
        ));
    }

    Ok(diff)
}

/// 구간을 시간 단위(소수 둘째 자리)로 반환합니다.
pub fn span_hours(start: &str, end: &str) -> Result<f64, AppError> {
    let minutes = span_minutes(start, end)?;
    Ok(round2(minutes as f64 / 60.0))
}

/// 명시적으로 받은 근무 시간(hours)을 검증합니다.
pub fn validate_hours(hours: f64) -> Result<f64, AppError> {
    if !hours.is_finite() || hours <= 0.0 || hours > (MAX_SPAN_MINUTES as f64) / 60.0 {
        return Err(AppError::validation(
            "hours",
            format!("{} is outside (0, 18] hours", hours),
        ));
    }
    Ok(hours)
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// "YYYY-MM-DD" 보고 날짜를 검증합니다.
pub fn parse_report_date(field: &'static str, s: &str) -> Result<String, AppError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(field, format!("`{}` is not a YYYY-MM-DD date", s)))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_shift_wraps_past_midnight() {
        assert_eq!(span_hours("22:00", "06:00").unwrap(), 8.0);
    }

    #[test]
    fn zero_span_is_rejected() {
        let err = span_hours("08:00", "08:00").unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "end_time", .. }));
        assert!(err.to_string().contains("00:00"));
    }

    #[test]
    fn wrapped_span_over_eighteen_hours_is_rejected() {
        // 08:00 → 03:00 은 보정 후 19시간
        let err = span_hours("08:00", "03:00").unwrap_err();
        assert!(err.to_string().contains("19:00"), "{}", err);
    }

    #[test]
    fn wrapped_span_within_limit_is_accepted() {
        assert_eq!(span_hours("20:00", "03:00").unwrap(), 7.0);
        assert_eq!(span_minutes("18:00", "12:00").unwrap(), 18 * 60);
    }

    #[test]
    fn seconds_are_accepted_and_fractional_hours_rounded() {
        assert_eq!(span_hours("07:00:00", "15:20").unwrap(), 8.33);
    }

    #[test]
    fn malformed_time_names_the_field() {
        let err = span_hours("7am", "15:00").unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "start_time", .. }));
    }

    #[test]
    fn explicit_hours_are_bounded() {
        assert!(validate_hours(8.5).is_ok());
        assert!(validate_hours(0.0).is_err());
        assert!(validate_hours(18.5).is_err());
    }

    #[test]
    fn timestamps_round_trip_through_the_db_format() {
        let ts = "2026-02-16T12:00:00.000Z";
        let parsed = parse_timestamp(ts).unwrap();
        assert_eq!(format_timestamp(parsed), ts);
    }

    #[test]
    fn report_date_must_be_iso() {
        assert_eq!(parse_report_date("report_date", "2026-03-01").unwrap(), "2026-03-01");
        assert!(parse_report_date("report_date", "01/03/2026").is_err());
    }
}
