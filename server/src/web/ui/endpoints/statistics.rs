use crate::data_store::auth_token::Privilege;
use crate::data_store::EventFilterBuilder;
use crate::web::time_calculation::{day_range, monday_of_week, today};
use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::statistics::{StatisticsRow, WeekStatistics};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use chrono::Duration;

#[get("/estadisticas/")]
pub async fn statistics(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let monday = monday_of_week(today(&state.time_zone));
    let sunday = monday + Duration::days(6);
    let (begin, end) = day_range(monday, sunday, &state.time_zone);

    let store = state.store.clone();
    let (events, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ShowStatistics)?;
        let filter = EventFilterBuilder::new().after(begin).before(end).build();
        Ok((store.get_events_filtered(&auth, filter)?, auth))
    })
    .await??;

    let statistics = WeekStatistics::from_events(&events, &state.time_zone);
    let tmpl = StatisticsTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Estadísticas",
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Statistics),
        },
        week_start: monday.format("%d/%m/%Y").to_string(),
        week_end: sunday.format("%d/%m/%Y").to_string(),
        total: statistics.total,
        weekday_rows: statistics.weekday_rows(),
        state_rows: statistics.state_rows(),
        room_rows: statistics.room_rows(),
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Template)]
#[template(path = "statistics.html")]
struct StatisticsTemplate<'a> {
    base: BaseTemplateContext<'a>,
    week_start: String,
    week_end: String,
    total: usize,
    weekday_rows: Vec<StatisticsRow>,
    state_rows: Vec<StatisticsRow>,
    room_rows: Vec<StatisticsRow>,
}

#[cfg(test)]
mod tests {
    use crate::data_store::models::EventState;
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};
    use chrono::{Duration, Utc};

    #[actix_web::test]
    async fn test_statistics_page() {
        let store = sample_store();
        add_event(
            &store,
            1,
            "Charla",
            ROOM_B,
            Utc::now(),
            EventState::Active,
        );
        add_event(
            &store,
            2,
            "Evento lejano",
            ROOM_A,
            Utc::now() + Duration::days(30),
            EventState::Scheduled,
        );
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/estadisticas/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = body_to_string(res).await;
        assert!(body.contains("Sala B"));
        assert!(!body.contains("Sala A"));
        assert!(body.contains("Lunes"));
    }

    #[actix_web::test]
    async fn test_statistics_forbidden_for_managers() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/estadisticas/")
            .cookie(session_cookie(MANAGER_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
    }
}
