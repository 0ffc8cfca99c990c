use crate::data_store::auth_token::Privilege;
use crate::data_store::EventFilterBuilder;
use crate::web::time_calculation::{day_range, local_date, today, WEEKDAY_NAMES};
use crate::web::ui::calendar_grid::{build_calendar_grid, CalendarMonth, CalendarWeek};
use crate::web::ui::error::AppError;
use crate::web::ui::event_view::{EventView, EventViewContext};
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Query};
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use chrono::Datelike;
use serde::Deserialize;

#[get("/calendario/")]
pub async fn calendar(
    state: web::Data<AppState>,
    query: Query<CalendarQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let today = today(&state.time_zone);
    let month =
        CalendarMonth::from_query_params(query.year.as_deref(), query.month.as_deref(), today);
    let (first, last) = month
        .date_range()
        .ok_or_else(|| AppError::InternalError("Month out of range".to_owned()))?;
    let (begin, end) = day_range(first, last, &state.time_zone);
    let filter = EventFilterBuilder::new().after(begin).before(end).build();

    let store = state.store.clone();
    let (events, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ShowEvents)?;
        Ok((store.get_events_filtered(&auth, filter)?, auth))
    })
    .await??;

    let view_context = EventViewContext {
        request: &req,
        auth: &auth,
        time_zone: &state.time_zone,
        today,
    };
    let views = view_context.view_all(&events)?;
    let weeks = build_calendar_grid(
        month,
        today,
        views
            .into_iter()
            .map(|view| (local_date(&view.data.event.start_time, &state.time_zone), view)),
    );

    let title = format!("{} {}", month.name(), month.year);
    let tmpl = CalendarTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: &title,
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Calendar),
        },
        title: &title,
        weekday_names: &WEEKDAY_NAMES,
        weeks,
        previous_month_url: month_url(&req, month.previous())?,
        next_month_url: month_url(&req, month.next())?,
        today_url: if month == CalendarMonth::containing(today) {
            None
        } else {
            Some(req.url_for_static("calendar")?.to_string())
        },
    };
    Ok(Html::new(tmpl.render()?))
}

fn month_url(req: &HttpRequest, month: CalendarMonth) -> Result<String, AppError> {
    let mut url = req.url_for_static("calendar")?;
    url.query_pairs_mut()
        .append_pair("year", &month.year.to_string())
        .append_pair("month", &month.month.to_string());
    Ok(url.to_string())
}

/// Query parameters of the calendar page. They are parsed leniently by
/// [CalendarMonth::from_query_params], so they are kept as strings here.
#[derive(Deserialize)]
struct CalendarQuery {
    year: Option<String>,
    month: Option<String>,
}

#[derive(Template)]
#[template(path = "calendar.html")]
struct CalendarTemplate<'a> {
    base: BaseTemplateContext<'a>,
    title: &'a str,
    weekday_names: &'a [&'static str; 7],
    weeks: Vec<CalendarWeek<EventView<'a>>>,
    previous_month_url: String,
    next_month_url: String,
    /// Link back to the current month, if another month is shown
    today_url: Option<String>,
}
