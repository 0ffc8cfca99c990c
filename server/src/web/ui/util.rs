use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::{SalasStoreFacade, StoreError};
use crate::web::ui::error::AppError;
use crate::web::ui::framework::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::AppState;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::Method;
use actix_web::web::Redirect;
use actix_web::{Either, HttpRequest, HttpResponse};
use askama::Template;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(14 * 86400);
pub const SESSION_COOKIE_NAME: &str = "salas-session";

/// Extract the session token from the session token cookie and validate it
///
/// Missing, invalid or expired session tokens and sessions without an authenticated user result
/// in [AppError::NotAuthenticated], which redirects the client to the login form.
pub fn extract_session_token(
    app_state: &AppState,
    request: &HttpRequest,
) -> Result<SessionToken, AppError> {
    let session_token = SessionToken::from_string(
        request
            .cookie(SESSION_COOKIE_NAME)
            .ok_or(AppError::NotAuthenticated {
                session_error: None,
            })?
            .value(),
        &app_state.secret,
        SESSION_COOKIE_MAX_AGE,
    )
    .map_err(|session_error| AppError::NotAuthenticated {
        session_error: Some(session_error),
    })?;
    if session_token.get_user_id().is_none() {
        return Err(AppError::NotAuthenticated {
            session_error: None,
        });
    }
    Ok(session_token)
}

/// Get the AuthToken for the client's session and check it for the given `privilege`.
///
/// Sessions of users which have been deleted or deactivated in the meantime result in
/// [AppError::NotAuthenticated].
pub fn authorize(
    store: &mut dyn SalasStoreFacade,
    session_token: &SessionToken,
    privilege: Privilege,
) -> Result<AuthToken, AppError> {
    let auth = store
        .get_auth_token_for_session(session_token)
        .map_err(|e| match e {
            StoreError::NotExisting => AppError::NotAuthenticated {
                session_error: None,
            },
            e => e.into(),
        })?;
    auth.check_privilege(privilege)?;
    Ok(auth)
}

pub fn create_session_cookie(session_token: &SessionToken, secret: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session_token.as_string(secret));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(actix_web::cookie::time::Duration::seconds(
        SESSION_COOKIE_MAX_AGE.as_secs() as i64,
    ));
    cookie
}

pub fn create_session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Query parameters of the login form
#[derive(Deserialize, Serialize, Default)]
pub struct LoginQueryParams {
    /// Local path to redirect to after a successful login
    pub next: Option<String>,
}

/// Generate the URL of the login form, which takes the user back to the current page after logging
/// in. Only GET requests are remembered as the page to go back to.
pub fn login_url_with_next(request: &HttpRequest) -> Result<url::Url, AppError> {
    let mut url = request.url_for_static("login_form")?;
    if request.method() == Method::GET {
        let next = match request.query_string() {
            "" => request.path().to_owned(),
            query => format!("{}?{}", request.path(), query),
        };
        url.set_query(Some(&serde_urlencoded::to_string(LoginQueryParams {
            next: Some(next),
        })?));
    }
    Ok(url)
}

/// Check that a `next` redirect target is a path on this server (and not an absolute or
/// protocol-relative URL to another site).
pub fn is_safe_redirect_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Get the URL of the page to show after successfully creating or editing an event:
/// Administrators go to the dashboard, event managers to the calendar.
pub fn url_after_event_change(
    request: &HttpRequest,
    auth: &AuthToken,
) -> Result<url::Url, AppError> {
    Ok(if auth.has_privilege(Privilege::ShowDashboard) {
        request.url_for_static("dashboard")?
    } else {
        request.url_for_static("calendar")?
    })
}

/// Helper type for representing the different possible outcomes of submitting an edit form.
///
/// They are used to delegate creating appropriate response to [create_edit_form_response()].
pub enum FormSubmitResult {
    Success,
    ValidationError,
    TransactionConflict,
    UnexpectedError(AppError),
}

impl From<Result<(), StoreError>> for FormSubmitResult {
    fn from(value: Result<(), StoreError>) -> Self {
        match value {
            Ok(()) => FormSubmitResult::Success,
            Err(StoreError::TransactionConflict) => FormSubmitResult::TransactionConflict,
            Err(e) => FormSubmitResult::UnexpectedError(e.into()),
        }
    }
}

/// Helper function for generating the HTTP response of edit form submission endpoints.
///
/// On success, a flash message is added and the client is redirected to `success_redirect`.
/// Otherwise, the form (`tmpl`) is rendered again with an error flash message and an appropriate
/// HTTP status.
pub fn create_edit_form_response(
    result: FormSubmitResult,
    tmpl: &impl Template,
    success_message: &str,
    success_redirect: url::Url,
    request: &HttpRequest,
) -> Result<Either<Redirect, HttpResponse>, AppError> {
    match result {
        FormSubmitResult::Success => {
            request.add_flash_message(FlashMessage::new(FlashType::Success, success_message));
            Ok(Either::Left(
                Redirect::to(success_redirect.to_string()).see_other(),
            ))
        }
        FormSubmitResult::ValidationError => {
            request.add_flash_message(FlashMessage::new(
                FlashType::Error,
                "Los datos ingresados no son válidos. Por favor revise los campos marcados.",
            ));
            Ok(Either::Right(
                HttpResponse::UnprocessableEntity()
                    .content_type(actix_web::http::header::ContentType::html())
                    .body(tmpl.render()?),
            ))
        }
        FormSubmitResult::TransactionConflict => {
            request.add_flash_message(FlashMessage::new(
                FlashType::Warning,
                "No se pudo guardar debido a un acceso concurrente a la base de datos. Por favor \
                envíe el formulario nuevamente.",
            ));
            Ok(Either::Right(
                HttpResponse::ServiceUnavailable()
                    .content_type(actix_web::http::header::ContentType::html())
                    .body(tmpl.render()?),
            ))
        }
        FormSubmitResult::UnexpectedError(e) => Err(e),
    }
}
