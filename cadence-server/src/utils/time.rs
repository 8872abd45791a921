//! Time helpers - business-timezone conversions
//!
//! All month/year → timestamp conversion happens at the API handler layer;
//! repositories and the points engine only see `i64` Unix millis.

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Date at h/m/s → Unix millis in the given timezone
///
/// DST gap fallback: if the local time does not exist, fall back to UTC.
fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, sec).unwrap_or_default();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Half-open `[start, end)` millis of one calendar month in the given timezone
pub fn month_bounds_millis(year: i32, month: u32, tz: Tz) -> AppResult<(i64, i64)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month:02}")))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month:02}")))?;

    Ok((
        date_hms_to_millis(start, 0, 0, 0, tz),
        date_hms_to_millis(end, 0, 0, 0, tz),
    ))
}

/// Half-open `[start, end)` millis of one calendar year in the given timezone
pub fn year_bounds_millis(year: i32, tz: Tz) -> AppResult<(i64, i64)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid year: {year}")))?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid year: {year}")))?;

    Ok((
        date_hms_to_millis(start, 0, 0, 0, tz),
        date_hms_to_millis(end, 0, 0, 0, tz),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds_cover_whole_month() {
        let (start, end) = month_bounds_millis(2025, 3, chrono_tz::Tz::UTC).unwrap();
        // 2025-03-01T00:00:00Z .. 2025-04-01T00:00:00Z
        assert_eq!(start, 1_740_787_200_000);
        assert_eq!(end, 1_743_465_600_000);
    }

    #[test]
    fn test_month_bounds_december_rolls_into_next_year() {
        let (start, end) = month_bounds_millis(2024, 12, chrono_tz::Tz::UTC).unwrap();
        let (jan_start, _) = month_bounds_millis(2025, 1, chrono_tz::Tz::UTC).unwrap();
        assert!(start < end);
        assert_eq!(end, jan_start);
    }

    #[test]
    fn test_month_bounds_rejects_invalid_month() {
        assert!(month_bounds_millis(2025, 13, chrono_tz::Tz::UTC).is_err());
        assert!(month_bounds_millis(2025, 0, chrono_tz::Tz::UTC).is_err());
    }

    #[test]
    fn test_year_bounds_contain_each_month() {
        let tz = chrono_tz::Tz::UTC;
        let (year_start, year_end) = year_bounds_millis(2025, tz).unwrap();
        for month in 1..=12 {
            let (m_start, m_end) = month_bounds_millis(2025, month, tz).unwrap();
            assert!(year_start <= m_start);
            assert!(m_end <= year_end);
        }
    }
}
