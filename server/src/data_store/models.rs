use crate::data_store::{EnumMemberNotExistingError, EventId, NoteId, RoomId, UserId};
use chrono::{DateTime, Utc};
use diesel::deserialize::FromSql;
use diesel::prelude::*;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};

#[derive(Clone, Debug, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::rooms)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::rooms)]
pub struct NewRoom {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub room_id: RoomId,
    pub notes: String,
    pub requires_laptop: bool,
    pub requires_projector: bool,
    pub laptop_number: Option<String>,
    pub state: EventState,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// An event, together with the room it is booked for
#[derive(Clone, Debug)]
pub struct EventWithRoom {
    pub event: Event,
    pub room: Room,
}

/// Data of an event to be created or updated.
///
/// The end of the occupancy window and the creator are not part of this struct. The data_store
/// implementation derives them from the start time and the AuthToken, respectively.
#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::events)]
#[diesel(treat_none_as_null = true)]
pub struct NewEvent {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub room_id: RoomId,
    pub notes: String,
    pub requires_laptop: bool,
    pub requires_projector: bool,
    pub laptop_number: Option<String>,
    pub state: EventState,
}

impl From<Event> for NewEvent {
    fn from(value: Event) -> Self {
        Self {
            name: value.name,
            start_time: value.start_time,
            room_id: value.room_id,
            notes: value.notes,
            requires_laptop: value.requires_laptop,
            requires_projector: value.requires_projector,
            laptop_number: value.laptop_number,
            state: value.state,
        }
    }
}

/// Lifecycle state of an event
#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy, Hash)]
#[diesel(sql_type = diesel::sql_types::Integer)]
#[repr(i32)]
pub enum EventState {
    Scheduled = 0,
    Active = 1,
    Finished = 2,
    Cancelled = 3,
}

impl EventState {
    pub const ALL: [EventState; 4] = [
        EventState::Scheduled,
        EventState::Active,
        EventState::Finished,
        EventState::Cancelled,
    ];

    /// Human-readable (Spanish) name of the state
    pub fn label(&self) -> &'static str {
        match self {
            EventState::Scheduled => "Programado",
            EventState::Active => "En curso",
            EventState::Finished => "Finalizado",
            EventState::Cancelled => "Cancelado",
        }
    }

    /// Identifier of the state, used in CSS classes
    pub fn slug(&self) -> &'static str {
        match self {
            EventState::Scheduled => "scheduled",
            EventState::Active => "active",
            EventState::Finished => "finished",
            EventState::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<i32> for EventState {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventState::Scheduled),
            1 => Ok(EventState::Active),
            2 => Ok(EventState::Finished),
            3 => Ok(EventState::Cancelled),
            _ => Err(EnumMemberNotExistingError {
                member_value: value.to_string(),
                enum_name: "EventState",
            }),
        }
    }
}

impl From<EventState> for i32 {
    fn from(value: EventState) -> Self {
        value as i32
    }
}

impl<DB> ToSql<diesel::sql_types::Integer, DB> for EventState
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    i32: ToSql<diesel::sql_types::Integer, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value: i32 = (*self).into();
        value.to_sql(&mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Integer, DB> for EventState
where
    DB: diesel::backend::Backend,
    i32: FromSql<diesel::sql_types::Integer, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = i32::from_sql(bytes)?;
        x.try_into()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

/// Number of events changed by one run of the automatic lifecycle update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StateTransitionCounts {
    pub activated: usize,
    pub finished: usize,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::notes)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Data of a note to be created or updated. The owner is taken from the AuthToken.
#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::notes)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
}

/// The fixed set of background colors of notes
#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy, Default)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum NoteColor {
    #[default]
    Green,
    Pink,
    Red,
    Orange,
    Gray,
    Blue,
    Purple,
    Fuchsia,
}

impl NoteColor {
    pub const ALL: [NoteColor; 8] = [
        NoteColor::Green,
        NoteColor::Pink,
        NoteColor::Red,
        NoteColor::Orange,
        NoteColor::Gray,
        NoteColor::Blue,
        NoteColor::Purple,
        NoteColor::Fuchsia,
    ];

    /// CSS hex notation of the color, as stored in the database
    pub fn hex(&self) -> &'static str {
        match self {
            NoteColor::Green => "#009885",
            NoteColor::Pink => "#C90166",
            NoteColor::Red => "#AE192D",
            NoteColor::Orange => "#ff6b35",
            NoteColor::Gray => "#6c757d",
            NoteColor::Blue => "#0052cc",
            NoteColor::Purple => "#6f42c1",
            NoteColor::Fuchsia => "#e83e8c",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoteColor::Green => "Verde",
            NoteColor::Pink => "Rosa",
            NoteColor::Red => "Rojo",
            NoteColor::Orange => "Naranja",
            NoteColor::Gray => "Gris",
            NoteColor::Blue => "Azul",
            NoteColor::Purple => "Morado",
            NoteColor::Fuchsia => "Fucsia",
        }
    }
}

impl std::str::FromStr for NoteColor {
    type Err = EnumMemberNotExistingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteColor::ALL
            .into_iter()
            .find(|c| c.hex() == s)
            .ok_or_else(|| EnumMemberNotExistingError {
                member_value: s.to_string(),
                enum_name: "NoteColor",
            })
    }
}

impl<DB> ToSql<diesel::sql_types::Text, DB> for NoteColor
where
    DB: diesel::backend::Backend,
    str: ToSql<diesel::sql_types::Text, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        self.hex().to_sql(out)
    }
}

impl<DB> FromSql<diesel::sql_types::Text, DB> for NoteColor
where
    DB: diesel::backend::Backend,
    String: FromSql<diesel::sql_types::Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = String::from_sql(bytes)?;
        x.parse()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
}

/// A user account together with the names of the groups it is member of
#[derive(Clone, Debug)]
pub struct UserWithGroups {
    pub user: User,
    pub groups: Vec<String>,
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name=super::schema::user_groups)]
pub struct UserGroupMembership {
    pub user_id: UserId,
    pub group_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_color_from_hex() {
        assert_eq!("#009885".parse::<NoteColor>().ok(), Some(NoteColor::Green));
        assert_eq!("#e83e8c".parse::<NoteColor>().ok(), Some(NoteColor::Fuchsia));
        assert!("#000000".parse::<NoteColor>().is_err());
        assert_eq!(NoteColor::default().hex(), "#009885");
    }

    #[test]
    fn test_event_state_from_int() {
        for state in EventState::ALL {
            assert_eq!(EventState::try_from(i32::from(state)).ok(), Some(state));
        }
        assert!(EventState::try_from(4).is_err());
    }
}
