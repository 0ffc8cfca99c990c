use crate::data_store::auth_token::Privilege;
use crate::data_store::models::{EventState, EventWithRoom};
use crate::data_store::EventFilterBuilder;
use crate::web::time_calculation::{day_range, today};
use crate::web::ui::error::AppError;
use crate::web::ui::event_view::{EventView, EventViewContext};
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Redirect};
use actix_web::{get, web, Either, HttpRequest, Responder};
use askama::Template;
use chrono::Utc;
use log::debug;

#[get("/")]
pub async fn dashboard(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let today = today(&state.time_zone);
    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| AppError::InternalError("Date out of range".to_owned()))?;
    let (today_begin, today_end) = day_range(today, today, &state.time_zone);
    let (tomorrow_begin, tomorrow_end) = day_range(tomorrow, tomorrow, &state.time_zone);

    let store = state.store.clone();
    let result = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ShowEvents)?;
        if !auth.has_privilege(Privilege::ShowDashboard) {
            return Ok(None);
        }
        let counts = store.update_event_states(&auth, Utc::now())?;
        debug!(
            "Automatic event state update: {} events activated, {} events finished",
            counts.activated, counts.finished
        );
        let lists = DashboardLists {
            active: store.get_events_filtered(
                &auth,
                EventFilterBuilder::new()
                    .state_is_one_of(vec![EventState::Active])
                    .build(),
            )?,
            today: store.get_events_filtered(
                &auth,
                EventFilterBuilder::new()
                    .after(today_begin)
                    .before(today_end)
                    .state_is_one_of(vec![EventState::Scheduled])
                    .build(),
            )?,
            tomorrow: store.get_events_filtered(
                &auth,
                EventFilterBuilder::new()
                    .after(tomorrow_begin)
                    .before(tomorrow_end)
                    .state_is_one_of(vec![EventState::Scheduled])
                    .build(),
            )?,
            finished_today: store
                .get_events_filtered(
                    &auth,
                    EventFilterBuilder::new()
                        .after(today_begin)
                        .before(today_end)
                        .state_is_one_of(vec![EventState::Finished])
                        .build(),
                )?
                .into_iter()
                .rev()
                .collect(),
        };
        Ok(Some((lists, auth)))
    })
    .await??;

    let Some((lists, auth)) = result else {
        return Ok(Either::Left(
            Redirect::to(req.url_for_static("calendar")?.to_string()).see_other(),
        ));
    };

    let view_context = EventViewContext {
        request: &req,
        auth: &auth,
        time_zone: &state.time_zone,
        today,
    };
    let tmpl = DashboardTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Panel",
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Dashboard),
        },
        active_events: view_context.view_all(&lists.active)?,
        today_events: view_context.view_all(&lists.today)?,
        tomorrow_events: view_context.view_all(&lists.tomorrow)?,
        finished_today_events: view_context.view_all(&lists.finished_today)?,
    };
    Ok(Either::Right(Html::new(tmpl.render()?)))
}

struct DashboardLists {
    active: Vec<EventWithRoom>,
    today: Vec<EventWithRoom>,
    tomorrow: Vec<EventWithRoom>,
    /// Most recent first
    finished_today: Vec<EventWithRoom>,
}

mod filters {
    pub use crate::web::ui::askama_filters::ellipsis;
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    base: BaseTemplateContext<'a>,
    active_events: Vec<EventView<'a>>,
    today_events: Vec<EventView<'a>>,
    tomorrow_events: Vec<EventView<'a>>,
    finished_today_events: Vec<EventView<'a>>,
}

#[cfg(test)]
mod tests {
    use crate::data_store::models::EventState;
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};
    use chrono::{Duration, Utc};

    #[actix_web::test]
    async fn test_dashboard_updates_event_states() {
        let store = sample_store();
        let now = Utc::now();
        add_event(
            &store,
            1,
            "Reunión en curso",
            ROOM_A,
            now - Duration::minutes(30),
            EventState::Scheduled,
        );
        add_event(
            &store,
            2,
            "Reunión pasada",
            ROOM_B,
            now - Duration::hours(3),
            EventState::Active,
        );
        add_event(
            &store,
            3,
            "Reunión cancelada",
            ROOM_A,
            now - Duration::hours(5),
            EventState::Cancelled,
        );
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = body_to_string(res).await;
        assert!(body.contains("Reunión en curso"));

        let data = store.data.lock().unwrap();
        let states: Vec<EventState> = data.events.iter().map(|e| e.state).collect();
        assert_eq!(
            states,
            vec![
                EventState::Active,
                EventState::Finished,
                EventState::Cancelled
            ]
        );
    }

    #[actix_web::test]
    async fn test_dashboard_redirects_non_admins() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .cookie(session_cookie(MANAGER_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::SEE_OTHER);
        assert!(location_header(&res).ends_with("/calendario/"));
    }
}
