//! Booking rules of the room registry: the fixed occupancy window of an event, the overlap check
//! between bookings of the same room and the automatic lifecycle transitions of events.
//!
//! The functions in this module are pure. The data_store implementations use them (or express
//! the same conditions in SQL) when checking bookings and updating event states.

use crate::data_store::models::{Event, EventState};
use crate::data_store::{EventId, RoomId};
use chrono::{DateTime, Duration, Utc};

/// Length of the span, following an event's start, during which the room is occupied.
pub fn occupancy_duration() -> Duration {
    Duration::hours(1) + Duration::minutes(58)
}

/// Time after the start at which an active event is finished automatically.
pub fn auto_finish_delay() -> Duration {
    Duration::hours(2)
}

/// End of the occupancy window `[start, start + 1h58m)` of an event starting at `start`.
pub fn occupied_until(start: &DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_signed(occupancy_duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whether an event in the given state blocks its room for its occupancy window.
pub fn blocks_room(state: EventState) -> bool {
    matches!(state, EventState::Scheduled | EventState::Active)
}

/// Check if the occupancy windows of two bookings starting at `a` and `b` overlap.
///
/// The windows are half-open, so two bookings starting exactly one occupancy duration apart do
/// not overlap.
pub fn occupancy_overlaps(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    (*b - *a).abs() < occupancy_duration()
}

/// A requested booking, to be checked against the existing events.
#[derive(Debug, Clone)]
pub struct BookingCandidate {
    pub room_id: RoomId,
    pub start: DateTime<Utc>,
    pub state: EventState,
    /// Id of the event being edited. This event is never considered a conflict.
    pub event_id: Option<EventId>,
}

/// Description of the existing booking that prevents a requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConflict {
    pub event_name: String,
    pub start: DateTime<Utc>,
}

impl BookingCandidate {
    /// Whether the candidate needs to be checked for conflicts at all. Cancelled or finished
    /// events don't occupy their room.
    pub fn requires_check(&self) -> bool {
        blocks_room(self.state)
    }

    /// Check if the given existing event prevents this booking.
    pub fn conflicts_with(&self, existing: &Event) -> bool {
        self.requires_check()
            && existing.room_id == self.room_id
            && Some(existing.id) != self.event_id
            && blocks_room(existing.state)
            && occupancy_overlaps(&self.start, &existing.start_time)
    }
}

/// Find the earliest existing event that conflicts with the booking candidate.
pub fn find_conflict<'a>(
    candidate: &BookingCandidate,
    existing: impl IntoIterator<Item = &'a Event>,
) -> Option<BookingConflict> {
    existing
        .into_iter()
        .filter(|event| candidate.conflicts_with(event))
        .min_by_key(|event| (event.start_time, event.id))
        .map(|event| BookingConflict {
            event_name: event.name.clone(),
            start: event.start_time,
        })
}

/// Calculate the state an event should be in at time `now`, applying the automatic transitions
/// scheduled → active (at the start) and active → finished (2 hours after the start).
///
/// Both transitions are applied in this order, so an event that is still scheduled long after
/// its start goes directly to finished. Manually set states (finished, cancelled) are kept.
pub fn next_state(state: EventState, start: &DateTime<Utc>, now: &DateTime<Utc>) -> EventState {
    let mut state = state;
    if state == EventState::Scheduled && *start <= *now {
        state = EventState::Active;
    }
    if state == EventState::Active && *start <= *now - auto_finish_delay() {
        state = EventState::Finished;
    }
    state
}
