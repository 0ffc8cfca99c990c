use crate::booking::BookingConflict;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{Event, EventState, NewEvent, Room};
use crate::data_store::{EventId, StoreError};
use crate::web::time_calculation::{local_date_time, timestamp_from_local};
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{BoolFormValue, FormValue, ValidateFormValue};
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::sub_templates::form_inputs::{
    CheckboxTemplate, FormFieldTemplate, InputConfiguration, InputSize, InputType, SelectEntry,
    SelectTemplate,
};
use crate::web::ui::{util, validation};
use crate::web::AppState;
use actix_web::web::{Form, Html};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use serde::Deserialize;
use std::borrow::Cow;

#[get("/crear/")]
pub async fn new_event_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (rooms, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageEvents)?;
        Ok((store.get_rooms(&auth, false)?, auth))
    })
    .await??;

    let form_data = EventFormData::for_new_event();
    let tmpl = EditEventFormTemplate::new(&req, &auth, &form_data, &rooms, None)?;
    Ok(Html::new(tmpl.render()?))
}

#[post("/crear/")]
pub async fn new_event(
    state: web::Data<AppState>,
    data: Form<EventFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (rooms, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageEvents)?;
        Ok((store.get_rooms(&auth, false)?, auth))
    })
    .await??;

    let mut form_data = data.into_inner();
    let room_ids: Vec<i32> = rooms.iter().map(|r| r.id).collect();
    let event = form_data.validate(&room_ids, &state.time_zone);

    let result = if let Some(event) = event {
        let store = state.store.clone();
        let auth_clone = auth.clone();
        let store_result = web::block(move || -> Result<_, StoreError> {
            let mut store = store.get_facade()?;
            store.create_event(&auth_clone, event)?;
            Ok(())
        })
        .await?;
        form_data.handle_booking_conflict(store_result, &state.time_zone)
    } else {
        util::FormSubmitResult::ValidationError
    };

    let tmpl = EditEventFormTemplate::new(&req, &auth, &form_data, &rooms, None)?;
    util::create_edit_form_response(
        result,
        &tmpl,
        "El evento fue creado.",
        util::url_after_event_change(&req, &auth)?,
        &req,
    )
}

#[get("/editar/{event_id}/")]
pub async fn edit_event_form(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (event, rooms, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageEvents)?;
        let event = store.get_event(&auth, event_id)?;
        let rooms = store.get_rooms(&auth, false)?;
        Ok((event, rooms, auth))
    })
    .await??;

    let rooms = rooms_including(rooms, event.room);
    let form_data = EventFormData::from_event(&event.event, &state.time_zone);
    let tmpl = EditEventFormTemplate::new(&req, &auth, &form_data, &rooms, Some(event_id))?;
    Ok(Html::new(tmpl.render()?))
}

#[post("/editar/{event_id}/")]
pub async fn edit_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    data: Form<EventFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (event, rooms, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageEvents)?;
        let event = store.get_event(&auth, event_id)?;
        let rooms = store.get_rooms(&auth, false)?;
        Ok((event, rooms, auth))
    })
    .await??;

    let rooms = rooms_including(rooms, event.room);
    let mut form_data = data.into_inner();
    let room_ids: Vec<i32> = rooms.iter().map(|r| r.id).collect();
    let event = form_data.validate(&room_ids, &state.time_zone);

    let result = if let Some(event) = event {
        let store = state.store.clone();
        let auth_clone = auth.clone();
        let store_result = web::block(move || -> Result<_, StoreError> {
            let mut store = store.get_facade()?;
            store.update_event(&auth_clone, event_id, event)
        })
        .await?;
        form_data.handle_booking_conflict(store_result, &state.time_zone)
    } else {
        util::FormSubmitResult::ValidationError
    };

    let tmpl = EditEventFormTemplate::new(&req, &auth, &form_data, &rooms, Some(event_id))?;
    util::create_edit_form_response(
        result,
        &tmpl,
        "Los cambios del evento fueron guardados.",
        util::url_after_event_change(&req, &auth)?,
        &req,
    )
}

/// Add the event's current room to the list of bookable (active) rooms, if it has been
/// deactivated in the meantime.
fn rooms_including(mut rooms: Vec<Room>, current_room: Room) -> Vec<Room> {
    if !rooms.iter().any(|r| r.id == current_room.id) {
        rooms.push(current_room);
    }
    rooms
}

/// Message for the user, explaining why a booking was rejected
fn booking_conflict_message(
    conflict: Option<&BookingConflict>,
    time_zone: &chrono_tz::Tz,
) -> String {
    match conflict {
        Some(conflict) => format!(
            "La sala ya está reservada por \"{}\" a las {}.",
            conflict.event_name,
            local_date_time(&conflict.start, time_zone).format("%H:%M del %d/%m/%Y")
        ),
        None => "La sala ya está reservada por otro evento en ese horario.".to_owned(),
    }
}

#[derive(Deserialize)]
struct EventFormData {
    name: FormValue<validation::ShortText<200>>,
    start_time: FormValue<validation::LocalDateTime>,
    room: FormValue<validation::Int32FromList>,
    notes: FormValue<String>,
    requires_laptop: BoolFormValue,
    requires_projector: BoolFormValue,
    laptop_number: FormValue<validation::OptionalShortText<50>>,
    state: FormValue<EventState>,
}

impl EventFormData {
    fn for_new_event() -> Self {
        Self {
            name: FormValue::empty(),
            start_time: FormValue::empty(),
            room: FormValue::empty(),
            notes: String::new().into(),
            requires_laptop: false.into(),
            requires_projector: false.into(),
            laptop_number: validation::OptionalShortText(None).into(),
            state: EventState::Scheduled.into(),
        }
    }

    fn from_event(event: &Event, time_zone: &chrono_tz::Tz) -> Self {
        Self {
            name: validation::ShortText(event.name.clone()).into(),
            start_time: validation::LocalDateTime(local_date_time(&event.start_time, time_zone))
                .into(),
            room: validation::Int32FromList(event.room_id).into(),
            notes: event.notes.clone().into(),
            requires_laptop: event.requires_laptop.into(),
            requires_projector: event.requires_projector.into(),
            laptop_number: validation::OptionalShortText(event.laptop_number.clone()).into(),
            state: event.state.into(),
        }
    }

    fn validate(&mut self, room_ids: &Vec<i32>, time_zone: &chrono_tz::Tz) -> Option<NewEvent> {
        let name = self.name.validate();
        let start_time = self.start_time.validate();
        let room = self.room.validate_with(room_ids);
        let notes = self.notes.validate();
        let laptop_number = self.laptop_number.validate();
        let state = self.state.validate();

        Some(NewEvent {
            name: name?.into_inner(),
            start_time: timestamp_from_local(&start_time?.into_inner(), time_zone),
            room_id: room?.into_inner(),
            notes: notes?.trim().to_owned(),
            requires_laptop: self.requires_laptop.get_value(),
            requires_projector: self.requires_projector.get_value(),
            laptop_number: laptop_number?.into_inner(),
            state: state?,
        })
    }

    /// Turn the result of storing the event into a [util::FormSubmitResult]. Booking conflicts are
    /// shown as validation error of the start time field.
    fn handle_booking_conflict(
        &mut self,
        result: Result<(), StoreError>,
        time_zone: &chrono_tz::Tz,
    ) -> util::FormSubmitResult {
        match result {
            Err(StoreError::BookingConflict(conflict)) => {
                self.start_time
                    .add_error(booking_conflict_message(conflict.as_ref(), time_zone));
                util::FormSubmitResult::ValidationError
            }
            result => result.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "edit_event_form.html")]
struct EditEventFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a EventFormData,
    room_entries: Vec<SelectEntry<'a>>,
    state_entries: Vec<SelectEntry<'a>>,
    post_url: url::Url,
    is_new_event: bool,
}

impl<'a> EditEventFormTemplate<'a> {
    fn new(
        request: &'a HttpRequest,
        auth: &'a AuthToken,
        form_data: &'a EventFormData,
        rooms: &'a [Room],
        event_id: Option<EventId>,
    ) -> Result<Self, AppError> {
        let post_url = match event_id {
            Some(event_id) => request.url_for("edit_event", [event_id.to_string()])?,
            None => request.url_for_static("new_event")?,
        };
        Ok(Self {
            base: BaseTemplateContext {
                request,
                page_title: if event_id.is_some() {
                    "Editar evento"
                } else {
                    "Nuevo evento"
                },
                auth_token: Some(auth),
                active_main_nav_button: if event_id.is_some() {
                    None
                } else {
                    Some(MainNavButton::NewEvent)
                },
            },
            form_data,
            room_entries: rooms
                .iter()
                .map(|room| SelectEntry {
                    value: Cow::Owned(room.id.to_string()),
                    text: if room.is_active {
                        Cow::Borrowed(room.name.as_str())
                    } else {
                        Cow::Owned(format!("{} (inactiva)", room.name))
                    },
                })
                .collect(),
            state_entries: EventState::ALL
                .iter()
                .map(|state| SelectEntry {
                    value: Cow::Borrowed(state.slug()),
                    text: Cow::Borrowed(state.label()),
                })
                .collect(),
            post_url,
            is_new_event: event_id.is_none(),
        })
    }
}

#[cfg(test)]
mod message_tests {
    use super::booking_conflict_message;
    use crate::booking::BookingConflict;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_booking_conflict_message() {
        let conflict = BookingConflict {
            event_name: "Charla".to_owned(),
            start: Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap(),
        };
        assert_eq!(
            booking_conflict_message(Some(&conflict), &chrono_tz::America::Santiago),
            "La sala ya está reservada por \"Charla\" a las 09:00 del 20/10/2026."
        );
    }
}
