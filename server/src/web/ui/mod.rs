use crate::web::http_error_logging::error_logging_middleware;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::error_page::error_page_middleware;
use crate::web::ui::framework::flash::flash_middleware;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::middleware::from_fn;
use actix_web::{get, web, HttpResponse, Responder};
use rust_embed::Embed;

mod askama_filters;
mod calendar_grid;
mod colors;
mod endpoints;
pub mod error;
mod event_view;
mod form_values;
mod framework;
mod statistics;
mod sub_templates;
#[cfg(test)]
mod test_utils;
mod util;
mod validation;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .service(static_resources)
            .service(endpoints::auth::login_form)
            .service(endpoints::auth::login)
            .service(endpoints::auth::logout)
            .service(endpoints::dashboard::dashboard)
            .service(endpoints::finish_event::finish_event)
            .service(endpoints::edit_event::new_event_form)
            .service(endpoints::edit_event::new_event)
            .service(endpoints::edit_event::edit_event_form)
            .service(endpoints::edit_event::edit_event)
            .service(endpoints::calendar::calendar)
            .service(endpoints::statistics::statistics)
            .service(endpoints::notes::notes)
            .service(endpoints::edit_note::new_note_form)
            .service(endpoints::edit_note::new_note)
            .service(endpoints::edit_note::edit_note_form)
            .service(endpoints::edit_note::edit_note)
            .service(endpoints::delete_note::delete_note_form)
            .service(endpoints::delete_note::delete_note)
            .service(endpoints::print_tomorrow::print_tomorrow)
            .service(endpoints::manage_rooms::manage_rooms)
            .service(endpoints::edit_room::new_room_form)
            .service(endpoints::edit_room::new_room)
            .service(endpoints::edit_room::edit_room_form)
            .service(endpoints::edit_room::edit_room)
            .default_service(web::to(not_found_handler))
            .wrap(from_fn(error_logging_middleware))
            .wrap(from_fn(flash_middleware))
            .wrap(from_fn(error_page_middleware)),
    );
}

#[derive(Embed)]
#[folder = "static/"]
struct Resources;

impl Resources {
    fn handle_embedded_file(path: &str) -> HttpResponse {
        match Self::get(path) {
            Some(content) => HttpResponse::Ok()
                .content_type(mime_guess::from_path(path).first_or_octet_stream().as_ref())
                .append_header(CacheControl(vec![CacheDirective::MaxAge(86400 * 365)]))
                .body(content.data.into_owned()),
            None => {
                HttpResponse::NotFound().body(format!("Static resource file '{}' not found", path))
            }
        }
    }
}

#[get("/static/{_:.*}")]
async fn static_resources(path: web::Path<String>) -> impl Responder {
    Resources::handle_embedded_file(path.as_str())
}

async fn not_found_handler() -> Result<&'static str, AppError> {
    Err(AppError::PageNotFound)
}
