use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{EventState, EventWithRoom};
use crate::web::time_calculation::local_date_time;
use actix_web::error::UrlGenerationError;
use actix_web::HttpRequest;
use chrono::NaiveDate;

/// Display data of an event, precomputed for rendering it in templates
pub struct EventView<'a> {
    pub data: &'a EventWithRoom,
    /// Local start time, formatted as "HH:MM"
    pub time: String,
    /// Local start date, formatted as "dd/mm/yyyy"
    pub date: String,
    pub is_today: bool,
    pub is_tomorrow: bool,
    pub equipment: Vec<String>,
    /// Link to the edit form, if the user is allowed to edit events
    pub edit_url: Option<String>,
    /// URL for the finish action, if the event is active and the user may finish events
    pub finish_url: Option<String>,
}

impl EventView<'_> {
    pub fn state_label(&self) -> &'static str {
        self.data.event.state.label()
    }

    pub fn state_slug(&self) -> &'static str {
        self.data.event.state.slug()
    }
}

/// Equipment tags of an event, e.g. `["Laptop #3", "Proyector"]`
pub fn equipment_tags(event: &EventWithRoom) -> Vec<String> {
    let mut result = vec![];
    if event.event.requires_laptop {
        result.push(match &event.event.laptop_number {
            Some(number) => format!("Laptop #{}", number),
            None => "Laptop".to_owned(),
        });
    }
    if event.event.requires_projector {
        result.push("Proyector".to_owned());
    }
    result
}

/// Everything required for creating [EventView]s for a specific request
pub struct EventViewContext<'a> {
    pub request: &'a HttpRequest,
    pub auth: &'a AuthToken,
    pub time_zone: &'a chrono_tz::Tz,
    pub today: NaiveDate,
}

impl EventViewContext<'_> {
    pub fn view<'e>(&self, event: &'e EventWithRoom) -> Result<EventView<'e>, UrlGenerationError> {
        let local_start = local_date_time(&event.event.start_time, self.time_zone);
        let date = local_start.date();
        let edit_url = if self.auth.has_privilege(Privilege::ManageEvents) {
            Some(
                self.request
                    .url_for("edit_event_form", [event.event.id.to_string()])?
                    .to_string(),
            )
        } else {
            None
        };
        let finish_url = if event.event.state == EventState::Active
            && self.auth.has_privilege(Privilege::FinishEvents)
        {
            Some(
                self.request
                    .url_for("finish_event", [event.event.id.to_string()])?
                    .to_string(),
            )
        } else {
            None
        };
        Ok(EventView {
            data: event,
            time: local_start.format("%H:%M").to_string(),
            date: local_start.format("%d/%m/%Y").to_string(),
            is_today: date == self.today,
            is_tomorrow: self.today.succ_opt() == Some(date),
            equipment: equipment_tags(event),
            edit_url,
            finish_url,
        })
    }

    pub fn view_all<'e>(
        &self,
        events: &'e [EventWithRoom],
    ) -> Result<Vec<EventView<'e>>, UrlGenerationError> {
        events.iter().map(|e| self.view(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::{Event, Room};

    #[test]
    fn test_equipment_tags() {
        let mut event = EventWithRoom {
            event: Event {
                id: 1,
                name: "Charla".to_owned(),
                start_time: "2026-10-17T12:00:00Z".parse().unwrap(),
                room_id: 1,
                notes: String::new(),
                requires_laptop: true,
                requires_projector: true,
                laptop_number: Some("3".to_owned()),
                state: EventState::Scheduled,
                created_by: 1,
                created_at: Default::default(),
            },
            room: Room {
                id: 1,
                name: "Sala A".to_owned(),
                description: String::new(),
                is_active: true,
            },
        };
        assert_eq!(equipment_tags(&event), vec!["Laptop #3", "Proyector"]);
        event.event.laptop_number = None;
        event.event.requires_projector = false;
        assert_eq!(equipment_tags(&event), vec!["Laptop"]);
        event.event.requires_laptop = false;
        assert!(equipment_tags(&event).is_empty());
    }
}
