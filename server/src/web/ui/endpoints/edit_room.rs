use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{NewRoom, Room};
use crate::data_store::RoomId;
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{BoolFormValue, FormValue, ValidateFormValue};
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::sub_templates::form_inputs::{
    CheckboxTemplate, FormFieldTemplate, InputConfiguration, InputType,
};
use crate::web::ui::{util, validation};
use crate::web::AppState;
use actix_web::web::{Form, Html};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use serde::Deserialize;

#[get("/salas/editar/{room_id}/")]
pub async fn edit_room_form(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let room_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (room, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageRooms)?;
        Ok((store.get_room(&auth, room_id)?, auth))
    })
    .await??;

    let form_data: RoomFormData = room.into();
    let tmpl = EditRoomFormTemplate::new(&req, &auth, &form_data, Some(room_id));
    Ok(Html::new(tmpl.render()?))
}

#[post("/salas/editar/{room_id}/")]
pub async fn edit_room(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
    data: Form<RoomFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let room_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let room = form_data.validate();

    let store = state.store.clone();
    let (result, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageRooms)?;
        // Unknown rooms are reported as 404, even if the submitted data is invalid
        store.get_room(&auth, room_id)?;
        let result: util::FormSubmitResult = match room {
            Some(room) => store.update_room(&auth, room_id, room).into(),
            None => util::FormSubmitResult::ValidationError,
        };
        Ok((result, auth))
    })
    .await??;

    let tmpl = EditRoomFormTemplate::new(&req, &auth, &form_data, Some(room_id));
    util::create_edit_form_response(
        result,
        &tmpl,
        "Los cambios de la sala fueron guardados.",
        req.url_for_static("manage_rooms")?,
        &req,
    )
}

#[get("/salas/crear/")]
pub async fn new_room_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let auth = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        util::authorize(&mut *store, &session_token, Privilege::ManageRooms)
    })
    .await??;

    let form_data = RoomFormData::for_new_room();
    let tmpl = EditRoomFormTemplate::new(&req, &auth, &form_data, None);
    Ok(Html::new(tmpl.render()?))
}

#[post("/salas/crear/")]
pub async fn new_room(
    state: web::Data<AppState>,
    data: Form<RoomFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let room = form_data.validate();

    let store = state.store.clone();
    let (result, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageRooms)?;
        let result: util::FormSubmitResult = match room {
            Some(room) => store.create_room(&auth, room).map(|_| ()).into(),
            None => util::FormSubmitResult::ValidationError,
        };
        Ok((result, auth))
    })
    .await??;

    let tmpl = EditRoomFormTemplate::new(&req, &auth, &form_data, None);
    util::create_edit_form_response(
        result,
        &tmpl,
        "La sala fue creada.",
        req.url_for_static("manage_rooms")?,
        &req,
    )
}

#[derive(Deserialize)]
struct RoomFormData {
    name: FormValue<validation::ShortText<100>>,
    description: FormValue<String>,
    is_active: BoolFormValue,
}

impl RoomFormData {
    fn for_new_room() -> Self {
        Self {
            name: FormValue::empty(),
            description: String::new().into(),
            is_active: true.into(),
        }
    }

    fn validate(&mut self) -> Option<NewRoom> {
        let name = self.name.validate();
        let description = self.description.validate();

        Some(NewRoom {
            name: name?.into_inner(),
            description: description?.trim().to_owned(),
            is_active: self.is_active.get_value(),
        })
    }
}

impl From<Room> for RoomFormData {
    fn from(value: Room) -> Self {
        Self {
            name: validation::ShortText(value.name).into(),
            description: value.description.into(),
            is_active: value.is_active.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "edit_room_form.html")]
struct EditRoomFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a RoomFormData,
    room_id: Option<RoomId>,
}

impl<'a> EditRoomFormTemplate<'a> {
    fn new(
        request: &'a HttpRequest,
        auth: &'a AuthToken,
        form_data: &'a RoomFormData,
        room_id: Option<RoomId>,
    ) -> Self {
        Self {
            base: BaseTemplateContext {
                request,
                page_title: if room_id.is_some() {
                    "Editar sala"
                } else {
                    "Nueva sala"
                },
                auth_token: Some(auth),
                active_main_nav_button: Some(MainNavButton::Rooms),
            },
            form_data,
            room_id,
        }
    }

    fn post_url(&self) -> Result<url::Url, AppError> {
        match self.room_id {
            Some(room_id) => Ok(self
                .base
                .request
                .url_for("edit_room", [room_id.to_string()])?),
            None => Ok(self.base.request.url_for_static("new_room")?),
        }
    }

    fn manage_rooms_url(&self) -> Result<url::Url, AppError> {
        Ok(self.base.request.url_for_static("manage_rooms")?)
    }
}

#[cfg(test)]
mod tests {
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};

    #[actix_web::test]
    async fn test_create_room() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/salas/crear/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([
                ("name", "Auditorio"),
                ("description", "Segundo piso, 80 personas"),
                ("is_active", "on"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        assert!(location_header(&res).ends_with("/salas/"));
        let data = store.data.lock().unwrap();
        let room = data.rooms.iter().find(|r| r.name == "Auditorio").unwrap();
        assert!(room.is_active);
        assert_eq!(room.description, "Segundo piso, 80 personas");
    }

    #[actix_web::test]
    async fn test_deactivate_room() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/salas/editar/12/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = body_to_string(res).await;
        assert!(body.contains("Sala B"));

        // An unchecked checkbox is not submitted at all
        let req = test::TestRequest::post()
            .uri("/salas/editar/12/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([("name", "Sala B"), ("description", "")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        let data = store.data.lock().unwrap();
        let room = data.rooms.iter().find(|r| r.id == ROOM_B).unwrap();
        assert!(!room.is_active);
    }

    #[actix_web::test]
    async fn test_edit_room_validation_and_not_found() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/salas/editar/11/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([("name", ""), ("description", ""), ("is_active", "on")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_to_string(res).await;
        assert!(body.contains("Este campo es obligatorio."));

        let req = test::TestRequest::get()
            .uri("/salas/editar/99/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    }
}
