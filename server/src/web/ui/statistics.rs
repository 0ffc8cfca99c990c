//! Pure projection of a week's events into usage statistics.

use crate::data_store::models::{EventState, EventWithRoom};
use crate::web::time_calculation::{local_date, WEEKDAY_NAMES};
use chrono::Datelike;

/// Event counts of one week (Monday to Sunday)
#[derive(Debug, PartialEq)]
pub struct WeekStatistics {
    /// Number of events per weekday, starting with Monday
    pub per_weekday: [usize; 7],
    /// Number of events per lifecycle state, in the order of [EventState::ALL]
    pub per_state: [usize; 4],
    /// Room names with their number of events, most used room first
    pub per_room: Vec<(String, usize)>,
    pub total: usize,
}

impl WeekStatistics {
    /// Count the given events. The caller is responsible for only passing the events of a single
    /// week.
    pub fn from_events(events: &[EventWithRoom], time_zone: &chrono_tz::Tz) -> Self {
        let mut per_weekday = [0; 7];
        let mut per_state = [0; 4];
        let mut per_room: Vec<(String, usize)> = vec![];
        for event in events {
            let weekday = local_date(&event.event.start_time, time_zone)
                .weekday()
                .num_days_from_monday();
            per_weekday[weekday as usize] += 1;
            if let Some(index) = EventState::ALL
                .iter()
                .position(|s| *s == event.event.state)
            {
                per_state[index] += 1;
            }
            match per_room.iter_mut().find(|(name, _)| *name == event.room.name) {
                Some((_, count)) => *count += 1,
                None => per_room.push((event.room.name.clone(), 1)),
            }
        }
        per_room.sort_by(|(name_a, count_a), (name_b, count_b)| {
            count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
        });
        Self {
            per_weekday,
            per_state,
            per_room,
            total: events.len(),
        }
    }

    /// Rows of the weekday chart: name, count and bar width in percent
    pub fn weekday_rows(&self) -> Vec<StatisticsRow> {
        let max = self.per_weekday.iter().copied().max().unwrap_or(0);
        WEEKDAY_NAMES
            .iter()
            .zip(self.per_weekday)
            .map(|(name, count)| StatisticsRow::new(name.to_string(), count, max))
            .collect()
    }

    /// Rows of the state summary: label, count and share of the total in percent
    pub fn state_rows(&self) -> Vec<StatisticsRow> {
        EventState::ALL
            .iter()
            .zip(self.per_state)
            .map(|(state, count)| StatisticsRow::new(state.label().to_owned(), count, self.total))
            .collect()
    }

    pub fn room_rows(&self) -> Vec<StatisticsRow> {
        let max = self.per_room.first().map(|(_, count)| *count).unwrap_or(0);
        self.per_room
            .iter()
            .map(|(name, count)| StatisticsRow::new(name.clone(), *count, max))
            .collect()
    }
}

pub struct StatisticsRow {
    pub label: String,
    pub count: usize,
    pub percentage: u32,
}

impl StatisticsRow {
    fn new(label: String, count: usize, reference: usize) -> Self {
        Self {
            label,
            count,
            percentage: bar_percentage(count, reference),
        }
    }
}

/// Percentage of `count` relative to `reference`, rounded to the nearest integer. 0 if the
/// reference is 0.
pub fn bar_percentage(count: usize, reference: usize) -> u32 {
    if reference == 0 {
        0
    } else {
        ((count * 100 + reference / 2) / reference) as u32
    }
}
