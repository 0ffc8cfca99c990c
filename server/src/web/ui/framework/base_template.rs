use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::web::ui::framework::flash::{FlashMessage, FlashesInterface};
use crate::web::ui::Resources;
use actix_web::error::UrlGenerationError;
use actix_web::HttpRequest;
use std::fmt::Write;

/// Common template data for all ui templates extending the `base.html` template
///
/// This struct must be a part of the template data structure, as the field `base`.
/// The contained data and functions can be used by the individual template's code, as well.
#[derive(Debug)]
pub struct BaseTemplateContext<'a> {
    /// The HTTP request the template is used to respond to. Used for creating ressource urls and
    /// extracting the flash messages
    pub request: &'a HttpRequest,
    /// HTML title
    pub page_title: &'a str,
    /// The authenticated user's AuthToken. Used for showing only the navigation links the user
    /// has access to. `None` on the login page and on error pages.
    pub auth_token: Option<&'a AuthToken>,
    pub active_main_nav_button: Option<MainNavButton>,
}

impl BaseTemplateContext<'_> {
    pub fn url_for_static(&self, file: &str) -> Result<String, UrlGenerationError> {
        let mut url = self.request.url_for("static_resources", [file])?;
        url.query_pairs_mut().append_pair(
            "hash",
            &Resources::get(file)
                .map(|f| bytes_to_hex(&f.metadata.sha256_hash()))
                .unwrap_or("unknown".to_string()),
        );
        Ok(url.to_string())
    }

    pub fn get_flashes(&self) -> Vec<FlashMessage> {
        self.request.get_and_clear_flashes()
    }

    /// Links of the main navigation bar, filtered by the privileges of the user
    pub fn main_nav_links(&self) -> Result<Vec<NavLink>, UrlGenerationError> {
        let Some(auth_token) = self.auth_token else {
            return Ok(vec![]);
        };
        MainNavButton::ALL
            .iter()
            .filter(|button| auth_token.has_privilege(button.required_privilege()))
            .map(|button| {
                Ok(NavLink {
                    url: self
                        .request
                        .url_for_static(button.endpoint_name())?
                        .to_string(),
                    label: button.label(),
                    active: self.active_main_nav_button == Some(*button),
                    new_tab: *button == MainNavButton::PrintTomorrow,
                })
            })
            .collect()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn logout_url(&self) -> Result<String, UrlGenerationError> {
        Ok(self.request.url_for_static("logout")?.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainNavButton {
    Dashboard,
    Calendar,
    NewEvent,
    Statistics,
    Notes,
    PrintTomorrow,
    Rooms,
}

impl MainNavButton {
    const ALL: [MainNavButton; 7] = [
        MainNavButton::Dashboard,
        MainNavButton::Calendar,
        MainNavButton::NewEvent,
        MainNavButton::Statistics,
        MainNavButton::Notes,
        MainNavButton::PrintTomorrow,
        MainNavButton::Rooms,
    ];

    fn label(&self) -> &'static str {
        match self {
            MainNavButton::Dashboard => "Panel",
            MainNavButton::Calendar => "Calendario",
            MainNavButton::NewEvent => "Nuevo evento",
            MainNavButton::Statistics => "Estadísticas",
            MainNavButton::Notes => "Notas",
            MainNavButton::PrintTomorrow => "Imprimir mañana",
            MainNavButton::Rooms => "Salas",
        }
    }

    fn endpoint_name(&self) -> &'static str {
        match self {
            MainNavButton::Dashboard => "dashboard",
            MainNavButton::Calendar => "calendar",
            MainNavButton::NewEvent => "new_event_form",
            MainNavButton::Statistics => "statistics",
            MainNavButton::Notes => "notes",
            MainNavButton::PrintTomorrow => "print_tomorrow",
            MainNavButton::Rooms => "manage_rooms",
        }
    }

    fn required_privilege(&self) -> Privilege {
        match self {
            MainNavButton::Dashboard => Privilege::ShowDashboard,
            MainNavButton::Calendar => Privilege::ShowEvents,
            MainNavButton::NewEvent => Privilege::ManageEvents,
            MainNavButton::Statistics => Privilege::ShowStatistics,
            MainNavButton::Notes => Privilege::ManageNotes,
            MainNavButton::PrintTomorrow => Privilege::PrintSchedule,
            MainNavButton::Rooms => Privilege::ManageRooms,
        }
    }
}

pub struct NavLink {
    pub url: String,
    pub label: &'static str,
    pub active: bool,
    /// Open the link in a new browser tab
    pub new_tab: bool,
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut output, b| {
        let _ = write!(output, "{:02x}", b);
        output
    })
}
