use crate::data_store::auth_token::Privilege;
use crate::data_store::EventId;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Redirect;
use actix_web::{post, web, HttpRequest, Responder};

#[post("/finalizar/{event_id}/")]
pub async fn finish_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let event_name = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::FinishEvents)?;
        let event = store.get_event(&auth, event_id)?;
        store.finish_event(&auth, event_id)?;
        Ok(event.event.name)
    })
    .await??;

    req.add_flash_message(FlashMessage::new(
        FlashType::Success,
        format!("El evento \"{}\" fue finalizado.", event_name),
    ));
    Ok(Redirect::to(req.url_for_static("dashboard")?.to_string()).see_other())
}
