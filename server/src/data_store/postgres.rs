use super::{
    models, schema, EventFilter, EventId, NoteId, RoomId, SalasStore, SalasStoreFacade,
    StoreError, UserId,
};
use crate::auth_session::{verify_password, SessionToken};
use crate::booking::{self, BookingCandidate, BookingConflict};
use crate::data_store::auth_token::{AccessRole, AuthToken, GlobalAuthToken, Privilege};
use crate::data_store::models::EventState;
use diesel::expression::AsExpression;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::collections::HashMap;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl SalasStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn SalasStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

impl SalasStoreFacade for PgDataStoreFacade {
    fn authenticate_with_password(
        &mut self,
        the_username: &str,
        the_password: &str,
        session_token: &mut SessionToken,
    ) -> Result<(), StoreError> {
        use schema::users::dsl::*;

        let user = users
            .filter(username.eq(the_username))
            .filter(is_active)
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .optional()?;
        match user {
            Some(user) if verify_password(the_password, &user.password_hash) => {
                session_token.set_user(user.id);
                Ok(())
            }
            _ => Err(StoreError::NotExisting),
        }
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        let the_user_id = session_token.get_user_id().ok_or(StoreError::NotExisting)?;

        self.connection.transaction(|connection| {
            let user = schema::users::table
                .filter(schema::users::id.eq(the_user_id))
                .select(models::User::as_select())
                .first::<models::User>(connection)?;
            let groups = schema::user_groups::table
                .filter(schema::user_groups::user_id.eq(the_user_id))
                .select(schema::user_groups::group_name)
                .load::<String>(connection)?;

            let roles = AccessRole::roles_for_user(&user, &groups);
            if roles.is_empty() {
                return Err(StoreError::NotExisting);
            }
            Ok(AuthToken::create_for_session(user.id, roles))
        })
    }

    fn get_own_username(&mut self, auth_token: &AuthToken) -> Result<String, StoreError> {
        use schema::users::dsl::*;

        users
            .filter(id.eq(auth_token.user_id()))
            .select(username)
            .first::<String>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_rooms(
        &mut self,
        auth_token: &AuthToken,
        include_inactive: bool,
    ) -> Result<Vec<models::Room>, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ShowEvents)?;
        if include_inactive {
            auth_token.check_privilege(Privilege::ManageRooms)?;
        }

        let mut query = rooms.into_boxed();
        if !include_inactive {
            query = query.filter(is_active);
        }
        query
            .order_by((name.asc(), id.asc()))
            .select(models::Room::as_select())
            .load::<models::Room>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
    ) -> Result<models::Room, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageRooms)?;

        rooms
            .filter(id.eq(room_id))
            .select(models::Room::as_select())
            .first::<models::Room>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::NewRoom,
    ) -> Result<RoomId, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        insert_room(&mut self.connection, room)
    }

    fn update_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        room: models::NewRoom,
    ) -> Result<(), StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageRooms)?;

        let count = diesel::update(rooms)
            .filter(id.eq(room_id))
            .set(&room)
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_events_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: EventFilter,
    ) -> Result<Vec<models::EventWithRoom>, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(Privilege::ShowEvents)?;

        self.connection.transaction(|connection| {
            let the_events = events
                .filter(event_filter_to_sql(filter))
                .order_by((start_time.asc(), id.asc()))
                .select(models::Event::as_select())
                .load::<models::Event>(connection)?;
            let mut room_ids: Vec<RoomId> = the_events.iter().map(|e| e.room_id).collect();
            room_ids.sort_unstable();
            room_ids.dedup();

            let the_rooms: HashMap<RoomId, models::Room> = schema::rooms::table
                .filter(schema::rooms::id.eq_any(room_ids))
                .select(models::Room::as_select())
                .load::<models::Room>(connection)?
                .into_iter()
                .map(|room| (room.id, room))
                .collect();

            the_events
                .into_iter()
                .map(|event| -> Result<models::EventWithRoom, StoreError> {
                    let room = the_rooms.get(&event.room_id).cloned().ok_or_else(|| {
                        StoreError::InvalidDataInDatabase(format!(
                            "Room {} of event {} does not exist",
                            event.room_id, event.id
                        ))
                    })?;
                    Ok(models::EventWithRoom { event, room })
                })
                .collect()
        })
    }

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::EventWithRoom, StoreError> {
        use schema::events;
        use schema::rooms;
        auth_token.check_privilege(Privilege::ShowEvents)?;

        let (event, room) = events::table
            .inner_join(rooms::table)
            .filter(events::id.eq(event_id))
            .select((models::Event::as_select(), models::Room::as_select()))
            .first::<(models::Event, models::Room)>(&mut self.connection)?;
        Ok(models::EventWithRoom { event, room })
    }

    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<EventId, StoreError> {
        use schema::events;
        auth_token.check_privilege(Privilege::ManageEvents)?;

        let candidate = BookingCandidate {
            room_id: event.room_id,
            start: event.start_time,
            state: event.state,
            event_id: None,
        };
        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                check_booking(connection, &candidate)?;
                diesel::insert_into(events::table)
                    .values((
                        &event,
                        events::occupied_until.eq(booking::occupied_until(&event.start_time)),
                        events::created_by.eq(auth_token.user_id()),
                    ))
                    .returning(events::id)
                    .get_result::<EventId>(connection)
                    .map_err(|e| e.into())
            })
    }

    fn update_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        event: models::NewEvent,
    ) -> Result<(), StoreError> {
        use schema::events;
        auth_token.check_privilege(Privilege::ManageEvents)?;

        let candidate = BookingCandidate {
            room_id: event.room_id,
            start: event.start_time,
            state: event.state,
            event_id: Some(event_id),
        };
        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                check_booking(connection, &candidate)?;
                let count = diesel::update(events::table)
                    .filter(events::id.eq(event_id))
                    .set((
                        &event,
                        events::occupied_until.eq(booking::occupied_until(&event.start_time)),
                    ))
                    .execute(connection)?;
                if count == 0 {
                    return Err(StoreError::NotExisting);
                }
                Ok(())
            })
    }

    fn finish_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(Privilege::FinishEvents)?;

        let count = diesel::update(events)
            .filter(id.eq(event_id))
            .set(state.eq(EventState::Finished))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn update_event_states(
        &mut self,
        auth_token: &AuthToken,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<models::StateTransitionCounts, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(Privilege::ShowDashboard)?;

        self.connection.transaction(|connection| {
            let activated = diesel::update(events)
                .filter(state.eq(EventState::Scheduled))
                .filter(start_time.le(now))
                .set(state.eq(EventState::Active))
                .execute(connection)?;
            let finished = diesel::update(events)
                .filter(state.eq(EventState::Active))
                .filter(start_time.le(now - booking::auto_finish_delay()))
                .set(state.eq(EventState::Finished))
                .execute(connection)?;
            Ok(models::StateTransitionCounts {
                activated,
                finished,
            })
        })
    }

    fn get_notes(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Note>, StoreError> {
        use schema::notes::dsl::*;
        auth_token.check_privilege(Privilege::ManageNotes)?;

        notes
            .filter(owner_id.eq(auth_token.user_id()))
            .order_by((last_modified.desc(), id.desc()))
            .select(models::Note::as_select())
            .load::<models::Note>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_note(
        &mut self,
        auth_token: &AuthToken,
        note_id: NoteId,
    ) -> Result<models::Note, StoreError> {
        use schema::notes::dsl::*;
        auth_token.check_privilege(Privilege::ManageNotes)?;

        notes
            .filter(id.eq(note_id))
            .filter(owner_id.eq(auth_token.user_id()))
            .select(models::Note::as_select())
            .first::<models::Note>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_note(
        &mut self,
        auth_token: &AuthToken,
        note: models::NewNote,
    ) -> Result<NoteId, StoreError> {
        use schema::notes::dsl::*;
        auth_token.check_privilege(Privilege::ManageNotes)?;

        diesel::insert_into(notes)
            .values((
                &note,
                owner_id.eq(auth_token.user_id()),
                last_modified.eq(diesel::dsl::now),
            ))
            .returning(id)
            .get_result::<NoteId>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn update_note(
        &mut self,
        auth_token: &AuthToken,
        note_id: NoteId,
        note: models::NewNote,
    ) -> Result<(), StoreError> {
        use schema::notes::dsl::*;
        auth_token.check_privilege(Privilege::ManageNotes)?;

        let count = diesel::update(notes)
            .filter(id.eq(note_id))
            .filter(owner_id.eq(auth_token.user_id()))
            .set((&note, last_modified.eq(diesel::dsl::now)))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn delete_note(&mut self, auth_token: &AuthToken, note_id: NoteId) -> Result<(), StoreError> {
        use schema::notes::dsl::*;
        auth_token.check_privilege(Privilege::ManageNotes)?;

        let count = diesel::delete(notes)
            .filter(id.eq(note_id))
            .filter(owner_id.eq(auth_token.user_id()))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_users(
        &mut self,
        auth_token: &GlobalAuthToken,
    ) -> Result<Vec<models::UserWithGroups>, StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;

        self.connection.transaction(|connection| {
            let the_users = schema::users::table
                .order_by(schema::users::username.asc())
                .select(models::User::as_select())
                .load::<models::User>(connection)?;
            let user_ids: Vec<UserId> = the_users.iter().map(|u| u.id).collect();
            let memberships = schema::user_groups::table
                .filter(schema::user_groups::user_id.eq_any(&user_ids))
                .order_by(schema::user_groups::group_name.asc())
                .select(models::UserGroupMembership::as_select())
                .load::<models::UserGroupMembership>(connection)?;
            Ok(attach_groups(the_users, memberships))
        })
    }

    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::NewUser,
        groups: Vec<String>,
    ) -> Result<UserId, StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;

        self.connection.transaction(|connection| {
            let new_user_id = diesel::insert_into(schema::users::table)
                .values(&user)
                .returning(schema::users::id)
                .get_result::<UserId>(connection)?;
            if !groups.is_empty() {
                diesel::insert_into(schema::user_groups::table)
                    .values(
                        groups
                            .into_iter()
                            .map(|group_name| models::UserGroupMembership {
                                user_id: new_user_id,
                                group_name,
                            })
                            .collect::<Vec<_>>(),
                    )
                    .execute(connection)?;
            }
            Ok(new_user_id)
        })
    }

    fn set_user_password_hash(
        &mut self,
        auth_token: &GlobalAuthToken,
        the_username: &str,
        the_password_hash: &str,
    ) -> Result<(), StoreError> {
        use schema::users::dsl::*;
        auth_token.check_privilege(Privilege::ManageUsers)?;

        let count = diesel::update(users)
            .filter(username.eq(the_username))
            .set(password_hash.eq(the_password_hash))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_all_rooms(
        &mut self,
        auth_token: &GlobalAuthToken,
    ) -> Result<Vec<models::Room>, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageRooms)?;

        rooms
            .order_by((name.asc(), id.asc()))
            .select(models::Room::as_select())
            .load::<models::Room>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_room_globally(
        &mut self,
        auth_token: &GlobalAuthToken,
        room: models::NewRoom,
    ) -> Result<RoomId, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        insert_room(&mut self.connection, room)
    }

    fn set_room_active(
        &mut self,
        auth_token: &GlobalAuthToken,
        room_id: RoomId,
        active: bool,
    ) -> Result<(), StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageRooms)?;

        let count = diesel::update(rooms)
            .filter(id.eq(room_id))
            .set(is_active.eq(active))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }
}

fn insert_room(connection: &mut PgConnection, room: models::NewRoom) -> Result<RoomId, StoreError> {
    use schema::rooms::dsl::*;

    diesel::insert_into(rooms)
        .values(&room)
        .returning(id)
        .get_result::<RoomId>(connection)
        .map_err(|e| e.into())
}

/// Search for an existing event which prevents the booking candidate and return it as
/// `StoreError::BookingConflict`.
///
/// Must be called in the same serializable transaction as the subsequent write.
fn check_booking(
    connection: &mut PgConnection,
    candidate: &BookingCandidate,
) -> Result<(), StoreError> {
    use schema::events::dsl::*;

    if !candidate.requires_check() {
        return Ok(());
    }
    let window = booking::occupancy_duration();
    let mut query = events
        .filter(room_id.eq(candidate.room_id))
        .filter(state.eq_any([EventState::Scheduled, EventState::Active]))
        .filter(start_time.gt(candidate.start - window))
        .filter(start_time.lt(candidate.start + window))
        .into_boxed();
    if let Some(own_id) = candidate.event_id {
        query = query.filter(id.ne(own_id));
    }
    let conflicting = query
        .order_by((start_time.asc(), id.asc()))
        .select(models::Event::as_select())
        .first::<models::Event>(connection)
        .optional()?;

    match conflicting {
        Some(event) => Err(StoreError::BookingConflict(Some(BookingConflict {
            event_name: event.name,
            start: event.start_time,
        }))),
        None => Ok(()),
    }
}

type BoxedBoolExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, diesel::pg::Pg, SqlType = diesel::sql_types::Bool> + 'a>;

fn event_filter_to_sql<'a>(filter: EventFilter) -> BoxedBoolExpression<'a, schema::events::table> {
    use schema::events::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::events::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    if let Some(after) = filter.after {
        expression = Box::new(expression.as_expression().and(start_time.ge(after)));
    }
    if let Some(before) = filter.before {
        expression = Box::new(expression.as_expression().and(start_time.lt(before)));
    }
    if let Some(states) = filter.states {
        expression = Box::new(expression.as_expression().and(state.eq_any(states)));
    }
    if let Some(room) = filter.room {
        expression = Box::new(expression.as_expression().and(room_id.eq(room)));
    }
    expression
}

/// Combine users with their group memberships, keeping the order of `users`.
fn attach_groups(
    users: Vec<models::User>,
    memberships: Vec<models::UserGroupMembership>,
) -> Vec<models::UserWithGroups> {
    let mut groups_by_user: HashMap<UserId, Vec<String>> = HashMap::new();
    for membership in memberships {
        groups_by_user
            .entry(membership.user_id)
            .or_default()
            .push(membership.group_name);
    }
    users
        .into_iter()
        .map(|user| models::UserWithGroups {
            groups: groups_by_user.remove(&user.id).unwrap_or_default(),
            user,
        })
        .collect()
}
