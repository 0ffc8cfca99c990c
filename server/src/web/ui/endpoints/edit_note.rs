use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{NewNote, Note, NoteColor};
use crate::data_store::{NoteId, StoreError};
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{FormValue, ValidateFormValue};
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::sub_templates::form_inputs::{
    FormFieldTemplate, InputConfiguration, InputSize, InputType, SelectEntry, SelectTemplate,
};
use crate::web::ui::{util, validation};
use crate::web::AppState;
use actix_web::web::{Form, Html};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use serde::Deserialize;
use std::borrow::Cow;

#[get("/notas/crear/")]
pub async fn new_note_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let auth = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        util::authorize(&mut *store, &session_token, Privilege::ManageNotes)
    })
    .await??;

    let form_data = NoteFormData::default();
    let tmpl = EditNoteFormTemplate::new(&req, &auth, &form_data, None)?;
    Ok(Html::new(tmpl.render()?))
}

#[post("/notas/crear/")]
pub async fn new_note(
    state: web::Data<AppState>,
    data: Form<NoteFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let note = form_data.validate();

    let store = state.store.clone();
    let (result, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageNotes)?;
        let result: util::FormSubmitResult = match note {
            Some(note) => store.create_note(&auth, note).map(|_| ()).into(),
            None => util::FormSubmitResult::ValidationError,
        };
        Ok((result, auth))
    })
    .await??;

    let tmpl = EditNoteFormTemplate::new(&req, &auth, &form_data, None)?;
    util::create_edit_form_response(
        result,
        &tmpl,
        "La nota fue creada.",
        req.url_for_static("notes")?,
        &req,
    )
}

#[get("/notas/editar/{note_id}/")]
pub async fn edit_note_form(
    path: web::Path<NoteId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let note_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (note, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageNotes)?;
        Ok((store.get_note(&auth, note_id)?, auth))
    })
    .await??;

    let form_data: NoteFormData = note.into();
    let tmpl = EditNoteFormTemplate::new(&req, &auth, &form_data, Some(note_id))?;
    Ok(Html::new(tmpl.render()?))
}

#[post("/notas/editar/{note_id}/")]
pub async fn edit_note(
    path: web::Path<NoteId>,
    state: web::Data<AppState>,
    data: Form<NoteFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let note_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let note = form_data.validate();

    let store = state.store.clone();
    let (result, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageNotes)?;
        let result: util::FormSubmitResult = match note {
            Some(note) => match store.update_note(&auth, note_id, note) {
                // Notes of other users are not revealed
                Err(StoreError::NotExisting) => return Err(AppError::EntityNotFound),
                result => result.into(),
            },
            None => {
                // Make sure that the note exists and belongs to the user
                store.get_note(&auth, note_id)?;
                util::FormSubmitResult::ValidationError
            }
        };
        Ok((result, auth))
    })
    .await??;

    let tmpl = EditNoteFormTemplate::new(&req, &auth, &form_data, Some(note_id))?;
    util::create_edit_form_response(
        result,
        &tmpl,
        "Los cambios de la nota fueron guardados.",
        req.url_for_static("notes")?,
        &req,
    )
}

#[derive(Default, Deserialize)]
struct NoteFormData {
    title: FormValue<validation::ShortText<200>>,
    content: FormValue<validation::NonEmptyString>,
    color: FormValue<NoteColor>,
}

impl From<Note> for NoteFormData {
    fn from(value: Note) -> Self {
        Self {
            title: validation::ShortText(value.title).into(),
            content: validation::NonEmptyString(value.content).into(),
            color: value.color.into(),
        }
    }
}

impl NoteFormData {
    fn validate(&mut self) -> Option<NewNote> {
        let title = self.title.validate();
        let content = self.content.validate();
        let color = self.color.validate();

        Some(NewNote {
            title: title?.into_inner(),
            content: content?.into_inner(),
            color: color?,
        })
    }
}

#[derive(Template)]
#[template(path = "edit_note_form.html")]
struct EditNoteFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a NoteFormData,
    color_entries: Vec<SelectEntry<'a>>,
    post_url: url::Url,
    notes_url: url::Url,
    is_new_note: bool,
}

impl<'a> EditNoteFormTemplate<'a> {
    fn new(
        request: &'a HttpRequest,
        auth: &'a AuthToken,
        form_data: &'a NoteFormData,
        note_id: Option<NoteId>,
    ) -> Result<Self, AppError> {
        let post_url = match note_id {
            Some(note_id) => request.url_for("edit_note", [note_id.to_string()])?,
            None => request.url_for_static("new_note")?,
        };
        Ok(Self {
            base: BaseTemplateContext {
                request,
                page_title: if note_id.is_some() {
                    "Editar nota"
                } else {
                    "Nueva nota"
                },
                auth_token: Some(auth),
                active_main_nav_button: Some(MainNavButton::Notes),
            },
            form_data,
            color_entries: NoteColor::ALL
                .iter()
                .map(|color| SelectEntry {
                    value: Cow::Borrowed(color.hex()),
                    text: Cow::Borrowed(color.label()),
                })
                .collect(),
            post_url,
            notes_url: request.url_for_static("notes")?,
            is_new_note: note_id.is_none(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::data_store::models::NoteColor;
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};

    #[actix_web::test]
    async fn test_create_note() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/notas/crear/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/notas/crear/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([
                ("title", "Pedir proyector"),
                ("content", "Llamar a soporte técnico."),
                ("color", "#0052cc"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        assert!(location_header(&res).ends_with("/notas/"));
        let data = store.data.lock().unwrap();
        assert_eq!(data.notes.len(), 1);
        assert_eq!(data.notes[0].title, "Pedir proyector");
        assert_eq!(data.notes[0].color, NoteColor::Blue);
        assert_eq!(data.notes[0].owner_id, ADMIN_ID);
    }

    #[actix_web::test]
    async fn test_create_note_validation() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/notas/crear/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([("title", "Sin contenido"), ("content", "  "), ("color", "#123456")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_to_string(res).await;
        assert!(body.contains("Este campo es obligatorio."));
        assert!(body.contains("Seleccione un color válido."));
        assert!(store.data.lock().unwrap().notes.is_empty());
    }

    #[actix_web::test]
    async fn test_edit_note_of_other_user() {
        let store = sample_store();
        add_note(&store, 1, "Privada", MANAGER_ID);
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/notas/editar/1/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/notas/editar/1/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([("title", "Robada"), ("content", "x"), ("color", "#009885")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(store.data.lock().unwrap().notes[0].title, "Privada");
    }

    #[actix_web::test]
    async fn test_edit_own_note() {
        let store = sample_store();
        add_note(&store, 1, "Borrador", ADMIN_ID);
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/notas/editar/1/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([
                ("title", "Versión final"),
                ("content", "Texto revisado"),
                ("color", "#6f42c1"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        let data = store.data.lock().unwrap();
        assert_eq!(data.notes[0].title, "Versión final");
        assert_eq!(data.notes[0].color, NoteColor::Purple);
        assert!(data.notes[0].last_modified > data.notes[0].created_at);
    }

    #[actix_web::test]
    async fn test_edit_note_title_only() {
        let store = sample_store();
        add_note(&store, 1, "Borrador", ADMIN_ID);
        let previously_modified = store.data.lock().unwrap().notes[0].last_modified;
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/notas/editar/1/")
            .cookie(session_cookie(ADMIN_ID))
            .set_form([
                ("title", "Nuevo"),
                ("content", "Contenido de Borrador"),
                ("color", "#009885"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        let data = store.data.lock().unwrap();
        let note = &data.notes[0];
        assert_eq!(note.title, "Nuevo");
        assert_eq!(note.content, "Contenido de Borrador");
        assert_eq!(note.color, NoteColor::Green);
        assert_eq!(note.owner_id, ADMIN_ID);
        assert!(note.last_modified > previously_modified);
        assert!(note.last_modified > note.created_at);
    }
}
