use crate::data_store::auth_token::Privilege;
use crate::data_store::models::Note;
use crate::data_store::NoteId;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::framework::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Redirect};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;

#[get("/notas/eliminar/{note_id}/")]
pub async fn delete_note_form(
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

    let tmpl = DeleteNoteFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Eliminar nota",
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Notes),
        },
        note: &note,
        post_url: req.url_for("delete_note", [note_id.to_string()])?,
        notes_url: req.url_for_static("notes")?,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/notas/eliminar/{note_id}/")]
pub async fn delete_note(
    path: web::Path<NoteId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let note_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageNotes)?;
        store.delete_note(&auth, note_id)?;
        Ok(())
    })
    .await??;

    req.add_flash_message(FlashMessage::new(FlashType::Success, "La nota fue eliminada."));
    Ok(Redirect::to(req.url_for_static("notes")?.to_string()).see_other())
}

#[derive(Template)]
#[template(path = "delete_note_form.html")]
struct DeleteNoteFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    note: &'a Note,
    post_url: url::Url,
    notes_url: url::Url,
}
