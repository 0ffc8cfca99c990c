//! Conversion between UTC timestamps and local dates and times of the configured time zone, as
//! well as Spanish date formatting.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Get the local date of a timestamp
pub fn local_date(timestamp: &DateTime<Utc>, time_zone: &chrono_tz::Tz) -> NaiveDate {
    timestamp.with_timezone(time_zone).date_naive()
}

pub fn local_date_time(timestamp: &DateTime<Utc>, time_zone: &chrono_tz::Tz) -> NaiveDateTime {
    timestamp.with_timezone(time_zone).naive_local()
}

/// Get the current local date
pub fn today(time_zone: &chrono_tz::Tz) -> NaiveDate {
    local_date(&Utc::now(), time_zone)
}

/// Convert a local date and time into a UTC timestamp.
///
/// For ambiguous local times (at the end of daylight saving time), the earlier point in time is
/// used. Local times within the gap at the beginning of daylight saving time are shifted by one
/// hour.
pub fn timestamp_from_local(local: &NaiveDateTime, time_zone: &chrono_tz::Tz) -> DateTime<Utc> {
    match time_zone.from_local_datetime(local) {
        LocalResult::Single(dt) => dt.to_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.to_utc(),
        LocalResult::None => local
            .checked_add_signed(chrono::Duration::hours(1))
            .and_then(|shifted| time_zone.from_local_datetime(&shifted).earliest())
            .map(|dt| dt.to_utc())
            .unwrap_or(local.and_utc()),
    }
}

/// Get the UTC timestamp of the beginning of the given local date
pub fn begin_of_day(date: NaiveDate, time_zone: &chrono_tz::Tz) -> DateTime<Utc> {
    timestamp_from_local(&date.and_time(chrono::NaiveTime::MIN), time_zone)
}

/// Get the range of UTC timestamps `[begin, end)` covering the local dates from `first` to `last`
/// (inclusive).
pub fn day_range(
    first: NaiveDate,
    last: NaiveDate,
    time_zone: &chrono_tz::Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        begin_of_day(first, time_zone),
        begin_of_day(last + chrono::Duration::days(1), time_zone),
    )
}

/// Get the Monday of the week (Monday to Sunday) containing the given date
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Format a date in Spanish long form, e.g. "Viernes, 17 de octubre de 2026"
pub fn spanish_long_date(date: &NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTH_NAMES[date.month0() as usize].to_lowercase(),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_long_date() {
        assert_eq!(
            spanish_long_date(&NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()),
            "Sábado, 17 de octubre de 2026"
        );
        assert_eq!(
            spanish_long_date(&NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()),
            "Viernes, 2 de enero de 2026"
        );
    }

    #[test]
    fn test_monday_of_week() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        assert_eq!(monday_of_week(monday), monday);
        assert_eq!(
            monday_of_week(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
            monday
        );
        assert_eq!(
            monday_of_week(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()),
            monday
        );
    }

    #[test]
    fn test_timestamp_from_local() {
        let tz = chrono_tz::America::Santiago;
        // Chilean summer time (UTC-3)
        let local = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            timestamp_from_local(&local, &tz),
            Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
        );
        // Chilean winter time (UTC-4)
        let local = NaiveDate::from_ymd_opt(2026, 7, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            timestamp_from_local(&local, &tz),
            Utc.with_ymd_and_hms(2026, 7, 15, 13, 0, 0).unwrap()
        );
        assert_eq!(
            local_date_time(&timestamp_from_local(&local, &tz), &tz),
            local
        );
    }

    #[test]
    fn test_day_range() {
        let tz = chrono_tz::Europe::Madrid;
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let (begin, end) = day_range(date, date, &tz);
        assert_eq!(begin, Utc.with_ymd_and_hms(2026, 6, 30, 22, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 7, 1, 22, 0, 0).unwrap());
    }
}
