//! Flash messages: short notifications that are shown on the next rendered page, e.g. after
//! redirecting the client from a form submission.
//!
//! The messages are carried between requests in a cookie (base64-encoded JSON), which is read and
//! updated by the [flash_middleware].

use actix_web::cookie::Cookie;
use actix_web::http::header::{HeaderValue, SET_COOKIE};
use actix_web::{HttpMessage, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlashType {
    Info,
    Success,
    Warning,
    Error,
}

impl FlashType {
    /// CSS class suffix for rendering the message
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashType::Info => "info",
            FlashType::Success => "success",
            FlashType::Warning => "warning",
            FlashType::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub flash_type: FlashType,
    pub message: String,
    /// If false, the message is hidden automatically after a few seconds
    pub keep_open: bool,
}

impl FlashMessage {
    pub fn new(flash_type: FlashType, message: impl Into<String>) -> Self {
        Self {
            flash_type,
            message: message.into(),
            keep_open: matches!(flash_type, FlashType::Warning | FlashType::Error),
        }
    }
}

struct Flashes {
    flashes: Vec<FlashMessage>,
    dirty: bool,
}

const COOKIE_NAME: &str = "flash";

impl Flashes {
    fn from_cookie(request: &HttpRequest) -> Result<Self, Box<dyn std::error::Error>> {
        let flashes = match request.cookie(COOKIE_NAME) {
            Some(cookie) if !cookie.value().is_empty() => {
                serde_json::from_slice(&URL_SAFE_NO_PAD.decode(cookie.value())?)?
            }
            _ => vec![],
        };
        Ok(Flashes {
            flashes,
            dirty: false,
        })
    }

    fn into_cookie(self) -> Cookie<'static> {
        let mut result = Cookie::new(
            COOKIE_NAME,
            URL_SAFE_NO_PAD.encode(
                serde_json::to_vec(&self.flashes).expect("Flashes should be serializable as JSON"),
            ),
        );
        result.set_path("/");
        result.set_http_only(true);
        if self.flashes.is_empty() {
            result.make_removal();
        }
        result
    }
}

pub trait FlashesInterface {
    fn add_flash_message(&self, flash: FlashMessage);

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage>;
}

impl FlashesInterface for HttpRequest {
    fn add_flash_message(&self, flash: FlashMessage) {
        if let Some(flashes) = self.extensions_mut().get_mut::<Flashes>() {
            flashes.flashes.push(flash);
            flashes.dirty = true;
            return;
        }
        // Must not be within the `if let` statement to avoid panicking of the `extensions` RefCell
        self.extensions_mut().insert(Flashes {
            flashes: vec![flash],
            dirty: true,
        });
    }

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage> {
        self.extensions_mut()
            .get_mut::<Flashes>()
            .map(|flashes| {
                if !flashes.flashes.is_empty() {
                    flashes.dirty = true;
                }
                std::mem::take(&mut flashes.flashes)
            })
            .unwrap_or_default()
    }
}

pub async fn flash_middleware(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<impl actix_web::body::MessageBody>,
) -> Result<actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, actix_web::Error> {
    // Ignore errors while parsing flashes from Request
    if let Ok(flashes) = Flashes::from_cookie(req.request()) {
        req.extensions_mut().insert(flashes);
    }

    let mut response = next.call(req).await?;

    let flashes = response.request().extensions_mut().remove::<Flashes>();
    if let Some(flashes) = flashes {
        if flashes.dirty {
            let cookie = flashes.into_cookie();
            let val = HeaderValue::from_str(&cookie.to_string())?;
            response.headers_mut().append(SET_COOKIE, val);
        }
    }
    Ok(response)
}

// Inspiration: https://docs.rs/actix-session/latest/src/actix_session/session.rs.html
