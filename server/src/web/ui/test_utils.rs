//! Sample data and helpers for the endpoint tests

use crate::auth_session::{hash_password, SessionToken};
use crate::data_store::auth_token::MANAGER_GROUP_NAME;
use crate::data_store::models::{Event, EventState, Note, NoteColor, Room, User, UserWithGroups};
use crate::data_store::store_mock::StoreMock;
use crate::data_store::{EventId, RoomId, UserId};
use crate::web::ui::util::create_session_cookie;
use crate::web::AppState;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const TEST_SECRET: &str = "not-so-secret-test-secret";
pub const ADMIN_ID: UserId = 1;
pub const MANAGER_ID: UserId = 2;
pub const USER_ID: UserId = 3;
pub const ROOM_A: RoomId = 11;
pub const ROOM_B: RoomId = 12;
pub const INACTIVE_ROOM: RoomId = 13;
pub const ADMIN_PASSWORD: &str = "contraseña-segura";

fn user(id: UserId, username: &str, is_staff: bool, groups: Vec<String>) -> UserWithGroups {
    UserWithGroups {
        user: User {
            id,
            username: username.to_owned(),
            password_hash: String::new(),
            is_superuser: false,
            is_staff,
            is_active: true,
        },
        groups,
    }
}

fn room(id: RoomId, name: &str, is_active: bool) -> Room {
    Room {
        id,
        name: name.to_owned(),
        description: String::new(),
        is_active,
    }
}

/// Create a StoreMock with an administrator, a manager, a plain user and three rooms, one of them
/// inactive.
pub fn sample_store() -> Arc<StoreMock> {
    let store = StoreMock::default();
    {
        let mut data = store.data.lock().unwrap();
        let mut admin = user(ADMIN_ID, "admin", true, vec![]);
        admin.user.password_hash = hash_password(ADMIN_PASSWORD).unwrap();
        data.users.push(admin);
        data.users.push(user(
            MANAGER_ID,
            "gestora",
            false,
            vec![MANAGER_GROUP_NAME.to_owned()],
        ));
        data.users.push(user(USER_ID, "usuario", false, vec![]));
        data.rooms.push(room(ROOM_A, "Sala A", true));
        data.rooms.push(room(ROOM_B, "Sala B", true));
        data.rooms.push(room(INACTIVE_ROOM, "Sala Antigua", false));
    }
    Arc::new(store)
}

pub fn app_state(store: Arc<StoreMock>) -> AppState {
    AppState {
        store,
        secret: TEST_SECRET.to_owned(),
        time_zone: chrono_tz::America::Santiago,
        allowed_hosts: vec!["localhost".to_owned()],
    }
}

/// Add an event to the store mock, bypassing all checks
pub fn add_event(
    store: &StoreMock,
    id: EventId,
    name: &str,
    room_id: RoomId,
    start_time: DateTime<Utc>,
    state: EventState,
) {
    store.data.lock().unwrap().events.push(Event {
        id,
        name: name.to_owned(),
        start_time,
        room_id,
        notes: String::new(),
        requires_laptop: false,
        requires_projector: false,
        laptop_number: None,
        state,
        created_by: ADMIN_ID,
        created_at: Utc::now(),
    });
}

pub fn add_note(store: &StoreMock, id: i32, title: &str, owner_id: UserId) {
    let timestamp = Utc::now() - chrono::Duration::days(1);
    store.data.lock().unwrap().notes.push(Note {
        id,
        title: title.to_owned(),
        content: format!("Contenido de {}", title),
        color: NoteColor::Green,
        owner_id,
        created_at: timestamp,
        last_modified: timestamp,
    });
}

/// Session cookie of a logged-in user
pub fn session_cookie(user_id: UserId) -> Cookie<'static> {
    let mut session_token = SessionToken::new();
    session_token.set_user(user_id);
    create_session_cookie(&session_token, TEST_SECRET)
}

pub fn location_header<B>(response: &ServiceResponse<B>) -> &str {
    response
        .headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub async fn body_to_string<B: MessageBody>(response: ServiceResponse<B>) -> String {
    String::from_utf8(actix_web::test::read_body(response).await.to_vec()).unwrap()
}
