//! Pure projection of events into a monthly calendar grid with Monday-first weeks.

use crate::web::time_calculation::MONTH_NAMES;
use chrono::{Datelike, NaiveDate};

/// A month of a specific year, as shown by the calendar page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
}

impl CalendarMonth {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Create the month from the raw `year` and `month` query parameters.
    ///
    /// Falls back to the month containing `today` if any of the parameters is missing, can not be
    /// parsed or is out of range.
    pub fn from_query_params(year: Option<&str>, month: Option<&str>, today: NaiveDate) -> Self {
        let parsed = year
            .zip(month)
            .and_then(|(year, month)| {
                Some((year.trim().parse().ok()?, month.trim().parse().ok()?))
            })
            .map(|(year, month)| Self { year, month });
        match parsed {
            Some(m) if m.first_day().is_some() => m,
            _ => Self::containing(today),
        }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Spanish name of the month, e.g. "Octubre"
    pub fn name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).clamp(1, 12) - 1]
    }

    /// First and last date of the month
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.first_day()?;
        let next = self.next().first_day()?;
        Some((first, next.pred_opt()?))
    }
}

/// A single day cell of the calendar grid
#[derive(Debug)]
pub struct CalendarDay<T> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<T>,
}

/// One week of the calendar. Days outside the month are `None`.
pub type CalendarWeek<T> = [Option<CalendarDay<T>>; 7];

/// Build the week-by-day grid of the given month, with the `events` sorted into the days by their
/// local date.
///
/// The events are expected to be ordered by start time; their order within a day is kept. Events
/// with a date outside the month are ignored.
pub fn build_calendar_grid<T>(
    month: CalendarMonth,
    today: NaiveDate,
    events: impl IntoIterator<Item = (NaiveDate, T)>,
) -> Vec<CalendarWeek<T>> {
    let Some((first, last)) = month.date_range() else {
        return vec![];
    };
    let offset = first.weekday().num_days_from_monday() as usize;
    let days_in_month = last.day() as usize;
    let num_weeks = (offset + days_in_month).div_ceil(7);

    let mut weeks: Vec<CalendarWeek<T>> = (0..num_weeks)
        .map(|_| std::array::from_fn(|_| None))
        .collect();
    for date in first.iter_days().take(days_in_month) {
        let index = offset + date.day0() as usize;
        weeks[index / 7][index % 7] = Some(CalendarDay {
            date,
            is_today: date == today,
            events: vec![],
        });
    }
    for (date, event) in events {
        if date < first || date > last {
            continue;
        }
        let index = offset + date.day0() as usize;
        if let Some(day) = &mut weeks[index / 7][index % 7] {
            day.events.push(event);
        }
    }
    weeks
}
