pub mod auth;
pub mod calendar;
pub mod dashboard;
pub mod delete_note;
pub mod edit_event;
pub mod edit_note;
pub mod edit_room;
pub mod finish_event;
pub mod manage_rooms;
pub mod notes;
pub mod print_tomorrow;
pub mod statistics;
