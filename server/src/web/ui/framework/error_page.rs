use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::BaseTemplateContext;
use crate::web::ui::util;
use actix_web::body::EitherBody;
use actix_web::http::{header, StatusCode};
use actix_web::web::Html;
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use askama::Template;

/// Middleware for replacing the plain text responses of errors with an HTML error page.
///
/// Responses of [AppError::NotAuthenticated] errors are replaced by a redirect to the login form,
/// which takes the user back to the requested page after logging in.
pub async fn error_page_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<EitherBody<B, String>>, actix_web::Error> {
    let response = next.call(req).await?;

    if response.response().error().is_some() {
        let (req, res) = response.into_parts();
        let error = res
            .error()
            .expect("We checked that res has an error, above.");
        let response = if let Some(app_error) = error.as_error::<AppError>() {
            generate_app_error_page(app_error, &req)
        } else {
            generate_generic_error_page(error.as_response_error(), &req)
        };
        Ok(actix_web::dev::ServiceResponse::new(
            req,
            response.map_body(|_, body| EitherBody::right(body)),
        ))
    } else {
        Ok(response.map_body(|_, body| EitherBody::left(body)))
    }
}

fn generate_app_error_page(
    app_error: &AppError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    if let AppError::NotAuthenticated { .. } = app_error {
        return match util::login_url_with_next(http_request) {
            Ok(url) => redirect_response(&url),
            Err(e) => generate_app_error_page(&e, http_request),
        };
    }
    let tmpl = AppErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: app_error.title(),
            auth_token: None,
            active_main_nav_button: None,
        },
        error: app_error,
    };
    render_template_or_show_error_as_string(tmpl, app_error, http_request)
}

fn redirect_response(url: &url::Url) -> HttpResponse<String> {
    let mut response = HttpResponse::with_body(StatusCode::SEE_OTHER, String::new());
    if let Ok(location) = header::HeaderValue::from_str(url.as_str()) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

fn generate_generic_error_page(
    error: &dyn ResponseError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    let tmpl = ErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: "Error",
            auth_token: None,
            active_main_nav_button: None,
        },
        error,
    };
    render_template_or_show_error_as_string(tmpl, error, http_request)
}

fn render_template_or_show_error_as_string(
    tmpl: impl Template,
    error: &dyn ResponseError,
    req: &HttpRequest,
) -> HttpResponse<String> {
    match tmpl.render() {
        Ok(body) => (Html::new(body), error.status_code()).respond_to(req),
        Err(err) => (
            format!(
                "Error: {}\n(Could not render nice error page: {})",
                error, err
            ),
            error.status_code(),
        )
            .respond_to(req),
    }
}

#[derive(Template)]
#[template(path = "app_error.html")]
struct AppErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a AppError,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a dyn ResponseError,
}
