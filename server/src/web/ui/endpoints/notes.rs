use crate::data_store::auth_token::Privilege;
use crate::data_store::models::Note;
use crate::web::time_calculation::local_date_time;
use crate::web::ui::colors::NoteColors;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;

#[get("/notas/")]
pub async fn notes(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (notes, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageNotes)?;
        Ok((store.get_notes(&auth)?, auth))
    })
    .await??;

    let cards = notes
        .iter()
        .map(|note| NoteCard::new(&req, note, &state.time_zone))
        .collect::<Result<Vec<_>, _>>()?;
    let tmpl = NotesTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Notas",
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Notes),
        },
        notes: cards,
        new_note_url: req.url_for_static("new_note_form")?.to_string(),
    };
    Ok(Html::new(tmpl.render()?))
}

struct NoteCard<'a> {
    note: &'a Note,
    /// CSS custom properties for the card's colors
    style: String,
    last_modified: String,
    edit_url: String,
    delete_url: String,
}

impl<'a> NoteCard<'a> {
    fn new(
        req: &HttpRequest,
        note: &'a Note,
        time_zone: &chrono_tz::Tz,
    ) -> Result<Self, AppError> {
        let colors =
            NoteColors::from_base_color_hex(note.color.hex()).map_err(AppError::InternalError)?;
        let note_id = note.id.to_string();
        Ok(Self {
            note,
            style: colors.as_css(),
            last_modified: local_date_time(&note.last_modified, time_zone)
                .format("%d/%m/%Y %H:%M")
                .to_string(),
            edit_url: req.url_for("edit_note_form", [&note_id])?.to_string(),
            delete_url: req.url_for("delete_note_form", [&note_id])?.to_string(),
        })
    }
}

mod filters {
    pub use crate::web::ui::askama_filters::ellipsis;
}

#[derive(Template)]
#[template(path = "notes.html")]
struct NotesTemplate<'a> {
    base: BaseTemplateContext<'a>,
    notes: Vec<NoteCard<'a>>,
    new_note_url: String,
}

#[cfg(test)]
mod tests {
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};

    #[actix_web::test]
    async fn test_notes_only_lists_own_notes() {
        let store = sample_store();
        add_note(&store, 1, "Comprar café", ADMIN_ID);
        add_note(&store, 2, "Nota ajena", MANAGER_ID);
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/notas/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = body_to_string(res).await;
        assert!(body.contains("Comprar café"));
        assert!(body.contains("/notas/editar/1/"));
        assert!(body.contains("--note-bg:"));
        assert!(!body.contains("Nota ajena"));
    }

    #[actix_web::test]
    async fn test_notes_forbidden_for_users() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/notas/")
            .cookie(session_cookie(USER_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
    }
}
