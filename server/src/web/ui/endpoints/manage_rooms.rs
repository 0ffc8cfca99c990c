use crate::data_store::auth_token::Privilege;
use crate::data_store::models::Room;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::{BaseTemplateContext, MainNavButton};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;

#[get("/salas/")]
pub async fn manage_rooms(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (rooms, auth) = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = util::authorize(&mut *store, &session_token, Privilege::ManageRooms)?;
        Ok((store.get_rooms(&auth, true)?, auth))
    })
    .await??;

    let tmpl = ManageRoomsTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Salas",
            auth_token: Some(&auth),
            active_main_nav_button: Some(MainNavButton::Rooms),
        },
        rooms: &rooms,
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Template)]
#[template(path = "manage_rooms.html")]
struct ManageRoomsTemplate<'a> {
    base: BaseTemplateContext<'a>,
    rooms: &'a Vec<Room>,
}

impl ManageRoomsTemplate<'_> {
    fn edit_url(&self, room: &Room) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("edit_room_form", [room.id.to_string()])?
            .to_string())
    }

    fn new_room_url(&self) -> Result<String, AppError> {
        Ok(self.base.request.url_for_static("new_room_form")?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::web::ui::configure_app;
    use crate::web::ui::test_utils::*;
    use actix_web::{http, test, web, App};

    #[actix_web::test]
    async fn test_manage_rooms_lists_inactive_rooms() {
        let store = sample_store();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(app_state(store.clone()))),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/salas/")
            .cookie(session_cookie(ADMIN_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = body_to_string(res).await;
        assert!(body.contains("Sala A"));
        assert!(body.contains("Sala Antigua"));
        assert!(body.contains("/salas/editar/13/"));

        let req = test::TestRequest::get()
            .uri("/salas/")
            .cookie(session_cookie(MANAGER_ID))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
    }
}
