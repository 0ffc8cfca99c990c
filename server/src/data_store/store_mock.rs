use crate::auth_session::{verify_password, SessionToken};
use crate::booking::{self, BookingCandidate};
use crate::data_store::auth_token::{AccessRole, AuthToken, GlobalAuthToken, Privilege};
use crate::data_store::models::{
    Event, EventWithRoom, NewEvent, NewNote, NewRoom, NewUser, Note, Room, StateTransitionCounts,
    User, UserWithGroups,
};
use crate::data_store::{
    EventFilter, EventId, NoteId, RoomId, SalasStore, SalasStoreFacade, StoreError, UserId,
};
use std::sync::Mutex;

/**
 * A mock [SalasStore] implementation for testing.
 *
 * The simulated database consists of the [StoreMockData] structure with vectors of entities. These
 * can be directly modified by the tests.
 *
 * The interface functions of this mock check the AuthToken's privileges, entity existence and
 * booking conflicts like the real implementation. In addition, the [StoreMockData::next_error]
 * attribute can be set to simulate a database error.
 */
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

impl SalasStore for StoreMock {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn SalasStoreFacade + 'a>, StoreError> {
        Ok(Box::new(StoreMockFacade { store: self }))
    }
}

#[derive(Default)]
pub struct StoreMockData {
    pub users: Vec<UserWithGroups>,
    pub rooms: Vec<Room>,
    pub events: Vec<Event>,
    pub notes: Vec<Note>,
    /// If not none, the next call to a store facade method will return this error.
    pub next_error: Option<StoreError>,
    next_id: i32,
}

impl StoreMockData {
    fn generate_id(&mut self) -> i32 {
        self.next_id += 1;
        1000 + self.next_id
    }

    fn event_with_room(&self, event: &Event) -> Result<EventWithRoom, StoreError> {
        let room = self
            .rooms
            .iter()
            .find(|r| r.id == event.room_id)
            .cloned()
            .ok_or_else(|| StoreError::InvalidDataInDatabase("Room does not exist".to_owned()))?;
        Ok(EventWithRoom {
            event: event.clone(),
            room,
        })
    }

    fn check_booking(&self, candidate: &BookingCandidate) -> Result<(), StoreError> {
        if !self.rooms.iter().any(|r| r.id == candidate.room_id) {
            return Err(StoreError::InvalidInputData(
                "ForeignKeyViolation".to_owned(),
            ));
        }
        match booking::find_conflict(candidate, &self.events) {
            Some(conflict) => Err(StoreError::BookingConflict(Some(conflict))),
            None => Ok(()),
        }
    }
}

struct StoreMockFacade<'a> {
    store: &'a StoreMock,
}

impl StoreMockFacade<'_> {
    fn lock_data(&self) -> Result<std::sync::MutexGuard<'_, StoreMockData>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        Ok(data)
    }
}

impl SalasStoreFacade for StoreMockFacade<'_> {
    fn authenticate_with_password(
        &mut self,
        username: &str,
        password: &str,
        session_token: &mut SessionToken,
    ) -> Result<(), StoreError> {
        let data = self.lock_data()?;
        let user = data
            .users
            .iter()
            .map(|u| &u.user)
            .find(|u| u.username == username && u.is_active)
            .ok_or(StoreError::NotExisting)?;
        if !verify_password(password, &user.password_hash) {
            return Err(StoreError::NotExisting);
        }
        session_token.set_user(user.id);
        Ok(())
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        let data = self.lock_data()?;
        let user_id = session_token.get_user_id().ok_or(StoreError::NotExisting)?;
        let user = data
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .ok_or(StoreError::NotExisting)?;
        let roles = AccessRole::roles_for_user(&user.user, &user.groups);
        if roles.is_empty() {
            return Err(StoreError::NotExisting);
        }
        Ok(AuthToken::create_for_session(user_id, roles))
    }

    fn get_own_username(&mut self, auth_token: &AuthToken) -> Result<String, StoreError> {
        let data = self.lock_data()?;
        data.users
            .iter()
            .find(|u| u.user.id == auth_token.user_id())
            .map(|u| u.user.username.clone())
            .ok_or(StoreError::NotExisting)
    }

    fn get_rooms(
        &mut self,
        auth_token: &AuthToken,
        include_inactive: bool,
    ) -> Result<Vec<Room>, StoreError> {
        auth_token.check_privilege(Privilege::ShowEvents)?;
        if include_inactive {
            auth_token.check_privilege(Privilege::ManageRooms)?;
        }
        let data = self.lock_data()?;
        let mut result: Vec<Room> = data
            .rooms
            .iter()
            .filter(|r| include_inactive || r.is_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    fn get_room(&mut self, auth_token: &AuthToken, room_id: RoomId) -> Result<Room, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let data = self.lock_data()?;
        data.rooms
            .iter()
            .find(|r| r.id == room_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_room(&mut self, auth_token: &AuthToken, room: NewRoom) -> Result<RoomId, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let mut data = self.lock_data()?;
        let id = data.generate_id();
        data.rooms.push(Room {
            id,
            name: room.name,
            description: room.description,
            is_active: room.is_active,
        });
        Ok(id)
    }

    fn update_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        room: NewRoom,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let mut data = self.lock_data()?;
        let existing = data
            .rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or(StoreError::NotExisting)?;
        existing.name = room.name;
        existing.description = room.description;
        existing.is_active = room.is_active;
        Ok(())
    }

    fn get_events_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: EventFilter,
    ) -> Result<Vec<EventWithRoom>, StoreError> {
        auth_token.check_privilege(Privilege::ShowEvents)?;
        let data = self.lock_data()?;
        let mut result = data
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| data.event_with_room(e))
            .collect::<Result<Vec<_>, _>>()?;
        result.sort_by_key(|e| (e.event.start_time, e.event.id));
        Ok(result)
    }

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<EventWithRoom, StoreError> {
        auth_token.check_privilege(Privilege::ShowEvents)?;
        let data = self.lock_data()?;
        let event = data
            .events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or(StoreError::NotExisting)?;
        data.event_with_room(event)
    }

    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: NewEvent,
    ) -> Result<EventId, StoreError> {
        auth_token.check_privilege(Privilege::ManageEvents)?;
        let mut data = self.lock_data()?;
        data.check_booking(&BookingCandidate {
            room_id: event.room_id,
            start: event.start_time,
            state: event.state,
            event_id: None,
        })?;
        let id = data.generate_id();
        data.events.push(Event {
            id,
            name: event.name,
            start_time: event.start_time,
            room_id: event.room_id,
            notes: event.notes,
            requires_laptop: event.requires_laptop,
            requires_projector: event.requires_projector,
            laptop_number: event.laptop_number,
            state: event.state,
            created_by: auth_token.user_id(),
            created_at: chrono::Utc::now(),
        });
        Ok(id)
    }

    fn update_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        event: NewEvent,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageEvents)?;
        let mut data = self.lock_data()?;
        data.check_booking(&BookingCandidate {
            room_id: event.room_id,
            start: event.start_time,
            state: event.state,
            event_id: Some(event_id),
        })?;
        let existing = data
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(StoreError::NotExisting)?;
        existing.name = event.name;
        existing.start_time = event.start_time;
        existing.room_id = event.room_id;
        existing.notes = event.notes;
        existing.requires_laptop = event.requires_laptop;
        existing.requires_projector = event.requires_projector;
        existing.laptop_number = event.laptop_number;
        existing.state = event.state;
        Ok(())
    }

    fn finish_event(&mut self, auth_token: &AuthToken, event_id: EventId) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::FinishEvents)?;
        let mut data = self.lock_data()?;
        let existing = data
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(StoreError::NotExisting)?;
        existing.state = crate::data_store::models::EventState::Finished;
        Ok(())
    }

    fn update_event_states(
        &mut self,
        auth_token: &AuthToken,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<StateTransitionCounts, StoreError> {
        use crate::data_store::models::EventState;
        auth_token.check_privilege(Privilege::ShowDashboard)?;
        let mut data = self.lock_data()?;
        let mut counts = StateTransitionCounts::default();
        for event in data.events.iter_mut() {
            let new_state = booking::next_state(event.state, &event.start_time, &now);
            if event.state == EventState::Scheduled && new_state != EventState::Scheduled {
                counts.activated += 1;
            }
            if new_state == EventState::Finished && event.state != EventState::Finished {
                counts.finished += 1;
            }
            event.state = new_state;
        }
        Ok(counts)
    }

    fn get_notes(&mut self, auth_token: &AuthToken) -> Result<Vec<Note>, StoreError> {
        auth_token.check_privilege(Privilege::ManageNotes)?;
        let data = self.lock_data()?;
        let mut result: Vec<Note> = data
            .notes
            .iter()
            .filter(|n| n.owner_id == auth_token.user_id())
            .cloned()
            .collect();
        result.sort_by_key(|n| std::cmp::Reverse((n.last_modified, n.id)));
        Ok(result)
    }

    fn get_note(&mut self, auth_token: &AuthToken, note_id: NoteId) -> Result<Note, StoreError> {
        auth_token.check_privilege(Privilege::ManageNotes)?;
        let data = self.lock_data()?;
        data.notes
            .iter()
            .find(|n| n.id == note_id && n.owner_id == auth_token.user_id())
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_note(&mut self, auth_token: &AuthToken, note: NewNote) -> Result<NoteId, StoreError> {
        auth_token.check_privilege(Privilege::ManageNotes)?;
        let mut data = self.lock_data()?;
        let id = data.generate_id();
        let now = chrono::Utc::now();
        data.notes.push(Note {
            id,
            title: note.title,
            content: note.content,
            color: note.color,
            owner_id: auth_token.user_id(),
            created_at: now,
            last_modified: now,
        });
        Ok(id)
    }

    fn update_note(
        &mut self,
        auth_token: &AuthToken,
        note_id: NoteId,
        note: NewNote,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageNotes)?;
        let mut data = self.lock_data()?;
        let existing = data
            .notes
            .iter_mut()
            .find(|n| n.id == note_id && n.owner_id == auth_token.user_id())
            .ok_or(StoreError::NotExisting)?;
        existing.title = note.title;
        existing.content = note.content;
        existing.color = note.color;
        existing.last_modified = chrono::Utc::now();
        Ok(())
    }

    fn delete_note(&mut self, auth_token: &AuthToken, note_id: NoteId) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageNotes)?;
        let mut data = self.lock_data()?;
        let count_before = data.notes.len();
        data.notes
            .retain(|n| !(n.id == note_id && n.owner_id == auth_token.user_id()));
        if data.notes.len() == count_before {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_users(&mut self, auth_token: &GlobalAuthToken) -> Result<Vec<UserWithGroups>, StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;
        let data = self.lock_data()?;
        let mut result = data.users.clone();
        result.sort_by(|a, b| a.user.username.cmp(&b.user.username));
        Ok(result)
    }

    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: NewUser,
        groups: Vec<String>,
    ) -> Result<UserId, StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;
        let mut data = self.lock_data()?;
        if data.users.iter().any(|u| u.user.username == user.username) {
            return Err(StoreError::ConflictEntityExists);
        }
        let id = data.generate_id();
        data.users.push(UserWithGroups {
            user: User {
                id,
                username: user.username,
                password_hash: user.password_hash,
                is_superuser: user.is_superuser,
                is_staff: user.is_staff,
                is_active: user.is_active,
            },
            groups,
        });
        Ok(id)
    }

    fn set_user_password_hash(
        &mut self,
        auth_token: &GlobalAuthToken,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;
        let mut data = self.lock_data()?;
        let user = data
            .users
            .iter_mut()
            .find(|u| u.user.username == username)
            .ok_or(StoreError::NotExisting)?;
        user.user.password_hash = password_hash.to_owned();
        Ok(())
    }

    fn get_all_rooms(&mut self, auth_token: &GlobalAuthToken) -> Result<Vec<Room>, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let data = self.lock_data()?;
        let mut result = data.rooms.clone();
        result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    fn create_room_globally(
        &mut self,
        auth_token: &GlobalAuthToken,
        room: NewRoom,
    ) -> Result<RoomId, StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let mut data = self.lock_data()?;
        let id = data.generate_id();
        data.rooms.push(Room {
            id,
            name: room.name,
            description: room.description,
            is_active: room.is_active,
        });
        Ok(id)
    }

    fn set_room_active(
        &mut self,
        auth_token: &GlobalAuthToken,
        room_id: RoomId,
        is_active: bool,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageRooms)?;
        let mut data = self.lock_data()?;
        let room = data
            .rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or(StoreError::NotExisting)?;
        room.is_active = is_active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::{EventState, NoteColor};

    fn admin_token() -> AuthToken {
        AuthToken::create_for_test(1, vec![AccessRole::User, AccessRole::Admin])
    }

    fn store_with_room() -> StoreMock {
        let store = StoreMock::default();
        store.data.lock().unwrap().rooms.push(Room {
            id: 1,
            name: "Sala A".to_string(),
            description: "".to_string(),
            is_active: true,
        });
        store
    }

    fn new_event(start: &str) -> NewEvent {
        NewEvent {
            name: "Reunión".to_string(),
            start_time: start.parse().unwrap(),
            room_id: 1,
            notes: "".to_string(),
            requires_laptop: false,
            requires_projector: false,
            laptop_number: None,
            state: EventState::Scheduled,
        }
    }

    #[test]
    fn test_create_event_conflict() {
        let store = store_with_room();
        let mut facade = store.get_facade().unwrap();
        let token = admin_token();
        facade
            .create_event(&token, new_event("2026-10-16T09:00:00Z"))
            .unwrap();
        let result = facade.create_event(&token, new_event("2026-10-16T10:30:00Z"));
        assert!(matches!(result, Err(StoreError::BookingConflict(Some(_)))));
        facade
            .create_event(&token, new_event("2026-10-16T11:00:00Z"))
            .unwrap();
        assert_eq!(store.data.lock().unwrap().events.len(), 2);
    }

    #[test]
    fn test_update_event_does_not_conflict_with_itself() {
        let store = store_with_room();
        let mut facade = store.get_facade().unwrap();
        let token = admin_token();
        let id = facade
            .create_event(&token, new_event("2026-10-16T09:00:00Z"))
            .unwrap();
        let mut changed = new_event("2026-10-16T09:00:00Z");
        changed.name = "Reunión mensual".to_string();
        facade.update_event(&token, id, changed).unwrap();
        assert_eq!(
            facade.get_event(&token, id).unwrap().event.name,
            "Reunión mensual"
        );
    }

    #[test]
    fn test_update_event_states() {
        let store = store_with_room();
        let mut facade = store.get_facade().unwrap();
        let token = admin_token();
        facade
            .create_event(&token, new_event("2026-10-16T07:00:00Z"))
            .unwrap();
        facade
            .create_event(&token, new_event("2026-10-16T11:30:00Z"))
            .unwrap();
        facade
            .create_event(&token, new_event("2026-10-16T14:00:00Z"))
            .unwrap();
        let counts = facade
            .update_event_states(&token, "2026-10-16T12:00:00Z".parse().unwrap())
            .unwrap();
        assert_eq!(
            counts,
            StateTransitionCounts {
                activated: 2,
                finished: 1
            }
        );
        let states: Vec<EventState> = store
            .data
            .lock()
            .unwrap()
            .events
            .iter()
            .map(|e| e.state)
            .collect();
        assert_eq!(
            states,
            vec![
                EventState::Finished,
                EventState::Active,
                EventState::Scheduled
            ]
        );
    }

    #[test]
    fn test_notes_are_private() {
        let store = StoreMock::default();
        let mut facade = store.get_facade().unwrap();
        let token = admin_token();
        let other_token = AuthToken::create_for_test(2, vec![AccessRole::User, AccessRole::Admin]);
        let id = facade
            .create_note(
                &token,
                NewNote {
                    title: "Llamar".to_string(),
                    content: "Técnico".to_string(),
                    color: NoteColor::Green,
                },
            )
            .unwrap();
        assert!(matches!(
            facade.get_note(&other_token, id),
            Err(StoreError::NotExisting)
        ));
        assert!(matches!(
            facade.delete_note(&other_token, id),
            Err(StoreError::NotExisting)
        ));
        assert_eq!(facade.get_notes(&token).unwrap().len(), 1);
        assert!(facade.get_notes(&other_token).unwrap().is_empty());
    }

    #[test]
    fn test_permission_checked() {
        let store = store_with_room();
        let mut facade = store.get_facade().unwrap();
        let user_token = AuthToken::create_for_test(3, vec![AccessRole::User]);
        assert!(matches!(
            facade.create_event(&user_token, new_event("2026-10-16T09:00:00Z")),
            Err(StoreError::PermissionDenied {
                required_privilege: Privilege::ManageEvents
            })
        ));
        assert_eq!(facade.get_rooms(&user_token, false).unwrap().len(), 1);
    }
}
