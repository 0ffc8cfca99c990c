//! The backend part of the application: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [SalasStore] trait. This object can be shared between threads in a
//! global application state and be used to create [SalasStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [SalasStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [SalasStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests.

use crate::auth_session::SessionToken;
use crate::booking::BookingConflict;
use crate::cli_error::CliError;
use crate::data_store::auth_token::Privilege;
use crate::setup;
use auth_token::{AuthToken, GlobalAuthToken};
use models::EventState;
use std::fmt::{Display, Formatter};

pub mod auth_token;
pub mod models;
mod postgres;
mod schema;
#[cfg(test)]
pub mod store_mock;

/// Get a [SalasStore] instance, connected to the database configured in the environment.
///
/// See [setup::get_database_url_from_env] for the configuration variables.
pub fn get_store_from_env() -> Result<impl SalasStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| CliError::DatabaseConnectionError(err.to_string()))
}

pub type EventId = i32;
pub type RoomId = i32;
pub type NoteId = i32;
pub type UserId = i32;

pub trait SalasStoreFacade {
    /// Check the password of the user with the given username. On success, the user id is stored
    /// in the given session token.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the user does not exist, is not active or the
    /// password is wrong.
    fn authenticate_with_password(
        &mut self,
        username: &str,
        password: &str,
        session_token: &mut SessionToken,
    ) -> Result<(), StoreError>;

    /// Get an [AuthToken] instance for a client, representing the access roles of the user
    /// stored in the client's session.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the session's user does not exist anymore or has
    /// been deactivated.
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError>;

    /// Get the name of the user the AuthToken has been issued for
    fn get_own_username(&mut self, auth_token: &AuthToken) -> Result<String, StoreError>;

    /// Get the list of rooms, sorted by name. Inactive rooms are only included, if
    /// `include_inactive` is true, which requires the [Privilege::ManageRooms] privilege.
    fn get_rooms(
        &mut self,
        auth_token: &AuthToken,
        include_inactive: bool,
    ) -> Result<Vec<models::Room>, StoreError>;
    fn get_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
    ) -> Result<models::Room, StoreError>;
    fn create_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::NewRoom,
    ) -> Result<RoomId, StoreError>;
    fn update_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        room: models::NewRoom,
    ) -> Result<(), StoreError>;

    /// Get a filtered list of events with their rooms.
    ///
    /// Events are returned in chronological order, i.e. sorted by (start_time, id)
    fn get_events_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: EventFilter,
    ) -> Result<Vec<models::EventWithRoom>, StoreError>;
    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::EventWithRoom, StoreError>;
    /// Create a new event, after checking the booking for conflicts with existing events in the
    /// same room.
    ///
    /// The conflict check and the insertion are executed in a single serializable transaction.
    /// Returns `Err(StoreError::BookingConflict(_))` if the room is not available.
    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<EventId, StoreError>;
    /// Update an existing event, with the same conflict check as [Self::create_event]. The event
    /// itself is excluded from the check.
    fn update_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        event: models::NewEvent,
    ) -> Result<(), StoreError>;
    /// Mark the event as finished, regardless of its current state
    fn finish_event(&mut self, auth_token: &AuthToken, event_id: EventId)
        -> Result<(), StoreError>;
    /// Apply the automatic lifecycle transitions of all events for the point in time `now`.
    ///
    /// See [crate::booking::next_state] for the rules.
    fn update_event_states(
        &mut self,
        auth_token: &AuthToken,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<models::StateTransitionCounts, StoreError>;

    /// Get the notes of the AuthToken's user, most recently modified first
    fn get_notes(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Note>, StoreError>;
    /// Get a single note of the AuthToken's user. Notes of other users are reported as
    /// `NotExisting`.
    fn get_note(
        &mut self,
        auth_token: &AuthToken,
        note_id: NoteId,
    ) -> Result<models::Note, StoreError>;
    fn create_note(
        &mut self,
        auth_token: &AuthToken,
        note: models::NewNote,
    ) -> Result<NoteId, StoreError>;
    fn update_note(
        &mut self,
        auth_token: &AuthToken,
        note_id: NoteId,
        note: models::NewNote,
    ) -> Result<(), StoreError>;
    fn delete_note(&mut self, auth_token: &AuthToken, note_id: NoteId) -> Result<(), StoreError>;

    fn get_users(
        &mut self,
        auth_token: &GlobalAuthToken,
    ) -> Result<Vec<models::UserWithGroups>, StoreError>;
    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::NewUser,
        groups: Vec<String>,
    ) -> Result<UserId, StoreError>;
    fn set_user_password_hash(
        &mut self,
        auth_token: &GlobalAuthToken,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;
    /// Rooms management for the command line interface, without a user's AuthToken
    fn get_all_rooms(
        &mut self,
        auth_token: &GlobalAuthToken,
    ) -> Result<Vec<models::Room>, StoreError>;
    fn create_room_globally(
        &mut self,
        auth_token: &GlobalAuthToken,
        room: models::NewRoom,
    ) -> Result<RoomId, StoreError>;
    fn set_room_active(
        &mut self,
        auth_token: &GlobalAuthToken,
        room_id: RoomId,
        is_active: bool,
    ) -> Result<(), StoreError>;
}

/// Filter options for retrieving events from the store via
/// [SalasStoreFacade::get_events_filtered]
///
/// Can be constructed through the EventFilterBuilder
#[derive(Default, Clone, Debug)]
pub struct EventFilter {
    /// Filter for events starting at or after the given point in time
    pub after: Option<chrono::DateTime<chrono::Utc>>,
    /// Filter for events starting before the given point in time
    pub before: Option<chrono::DateTime<chrono::Utc>>,
    /// Filter for events in any of the given states
    pub states: Option<Vec<EventState>>,
    /// Filter for events in the given room
    pub room: Option<RoomId>,
}

impl EventFilter {
    /// Checks if a given event matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual events in software.
    pub fn matches(&self, event: &models::Event) -> bool {
        if let Some(after) = self.after {
            if event.start_time < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if event.start_time >= before {
                return false;
            }
        }
        if let Some(states) = &self.states {
            if !states.contains(&event.state) {
                return false;
            }
        }
        if let Some(room) = self.room {
            if event.room_id != room {
                return false;
            }
        }
        true
    }
}

/// Builder for constructing EventFilter objects
#[derive(Default)]
pub struct EventFilterBuilder {
    result: EventFilter,
}

impl EventFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include events starting at or after the given point in time
    pub fn after(mut self, after: chrono::DateTime<chrono::Utc>) -> Self {
        self.result.after = Some(after);
        self
    }
    /// Only include events starting before the given point in time
    pub fn before(mut self, before: chrono::DateTime<chrono::Utc>) -> Self {
        self.result.before = Some(before);
        self
    }
    /// Only include events in one of the given lifecycle states
    pub fn state_is_one_of(mut self, states: Vec<EventState>) -> Self {
        self.result.states = Some(states);
        self
    }
    pub fn in_room(mut self, room: RoomId) -> Self {
        self.result.room = Some(room);
        self
    }

    pub fn build(self) -> EventFilter {
        self.result
    }
}

pub trait SalasStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn SalasStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists
    ConflictEntityExists,
    /// The client is not authorized for this action. It would need one of the access roles
    /// qualifying for the `required_privilege`.
    PermissionDenied { required_privilege: Privilege },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
    /// The event could not be stored, because its room is already booked by another event at
    /// that time.
    BookingConflict(Option<BookingConflict>),
}

/// Name of the exclusion constraint on the events table, which prevents overlapping bookings.
const BOOKING_EXCLUSION_CONSTRAINT: &str = "events_room_occupancy_exclusion";

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(_, ref info)
                if info.constraint_name() == Some(BOOKING_EXCLUSION_CONSTRAINT) =>
            {
                Self::BookingConflict(None)
            }
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::PermissionDenied { required_privilege } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege required.", required_privilege)
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
            Self::BookingConflict(Some(conflict)) => write!(
                f,
                "Room is already booked by event \"{}\" starting at {}.",
                conflict.event_name, conflict.start
            ),
            Self::BookingConflict(None) => {
                f.write_str("Room is already booked by another event at that time.")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Error returned when converting a raw database value into one of our enums fails
#[derive(Debug)]
pub struct EnumMemberNotExistingError {
    pub member_value: String,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for {} enum",
            self.member_value, self.enum_name
        )
    }
}
