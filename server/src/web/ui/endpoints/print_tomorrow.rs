use crate::data_store::auth_token::Privilege;
use crate::data_store::models::EventState;
use crate::data_store::EventFilterBuilder;
use crate::web::time_calculation::{day_range, spanish_long_date, today};
use crate::web::ui::error::AppError;
use crate::web::ui::event_view::{EventView, EventViewContext};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;

/// Print-friendly list of tomorrow's scheduled events. The page is self-contained (no shared base
/// template or stylesheet) and opens the browser's print dialog when loaded.
#[get("/imprimir-manana/")]
pub async fn print_tomorrow(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let today = today(&state.time_zone);
    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| AppError::InternalError("Date out of range".to_owned()))?;
    let (begin, end) = day_range(tomorrow, tomorrow, &state.time_zone);

    let store = state.store.clone();
    let (events, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::PrintSchedule)?;
        let filter = EventFilterBuilder::new()
            .after(begin)
            .before(end)
            .state_is_one_of(vec![EventState::Scheduled])
            .build();
        Ok((store.get_events_filtered(&auth, filter)?, auth))
    })
    .await??;

    let view_context = EventViewContext {
        request: &req,
        auth: &auth,
        time_zone: &state.time_zone,
        today,
    };
    let tmpl = PrintTomorrowTemplate {
        date_label: spanish_long_date(&tomorrow),
        events: view_context.view_all(&events)?,
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Template)]
#[template(path = "print_tomorrow.html")]
struct PrintTomorrowTemplate<'a> {
    date_label: String,
    events: Vec<EventView<'a>>,
}
