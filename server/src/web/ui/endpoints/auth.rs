use crate::auth_session::SessionToken;
use crate::data_store::StoreError;
use crate::web::ui::error::AppError;
use crate::web::ui::framework::base_template::BaseTemplateContext;
use crate::web::ui::framework::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::util;
use crate::web::ui::util::LoginQueryParams;
use crate::web::AppState;
use actix_web::http::header;
use actix_web::web::{Form, Html, Query};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use serde::Deserialize;

#[get("/login/")]
pub async fn login_form(
    query: Query<LoginQueryParams>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let tmpl = LoginFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Iniciar sesión",
            auth_token: None,
            active_main_nav_button: None,
        },
        login_url: login_url(&req, &query)?,
        username: "",
        error: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/login/")]
pub async fn login(
    state: web::Data<AppState>,
    data: Form<LoginFormData>,
    query: Query<LoginQueryParams>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let data = data.into_inner();
    let username = data.username.trim().to_owned();
    let store = state.store.clone();
    let username_clone = username.clone();
    let result = web::block(move || -> Result<_, StoreError> {
        let mut store = store.get_facade()?;
        let mut session_token = SessionToken::new();
        store.authenticate_with_password(&username_clone, &data.password, &mut session_token)?;
        Ok(session_token)
    })
    .await?;

    let session_token = match result {
        Ok(session_token) => session_token,
        Err(StoreError::NotExisting) => {
            let tmpl = LoginFormTemplate {
                base: BaseTemplateContext {
                    request: &req,
                    page_title: "Iniciar sesión",
                    auth_token: None,
                    active_main_nav_button: None,
                },
                login_url: login_url(&req, &query)?,
                username: &username,
                error: Some("Usuario o contraseña incorrectos."),
            };
            return Ok(HttpResponse::UnprocessableEntity()
                .content_type(header::ContentType::html())
                .body(tmpl.render()?));
        }
        Err(e) => return Err(e.into()),
    };

    let target = match &query.next {
        Some(next) if util::is_safe_redirect_path(next) => next.clone(),
        _ => req.url_for_static("dashboard")?.to_string(),
    };
    req.add_flash_message(FlashMessage::new(
        FlashType::Success,
        format!("¡Bienvenido/a, {}!", username),
    ));
    Ok(HttpResponse::SeeOther()
        .cookie(util::create_session_cookie(&session_token, &state.secret))
        .append_header((header::LOCATION, target))
        .finish())
}

#[post("/logout/")]
pub async fn logout(req: HttpRequest) -> Result<impl Responder, AppError> {
    req.add_flash_message(FlashMessage::new(FlashType::Info, "Sesión cerrada."));
    Ok(HttpResponse::SeeOther()
        .cookie(util::create_session_removal_cookie())
        .append_header((
            header::LOCATION,
            req.url_for_static("login_form")?.to_string(),
        ))
        .finish())
}

/// URL of the login form's target, keeping the `next` parameter
fn login_url(req: &HttpRequest, query: &LoginQueryParams) -> Result<url::Url, AppError> {
    let mut url = req.url_for_static("login")?;
    if query.next.is_some() {
        url.set_query(Some(&serde_urlencoded::to_string(query)?));
    }
    Ok(url)
}

#[derive(Template)]
#[template(path = "login_form.html")]
struct LoginFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    login_url: url::Url,
    username: &'a str,
    error: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginFormData {
    username: String,
    password: String,
}
