use crate::data_store::models::{EventState, NoteColor};
use crate::web::ui::form_values::{
    FormText, ParseFormText, FormTextParser,
};
use chrono::Datelike;
use std::fmt::Debug;

/// A string that is not empty or whitespace-only. Surrounding whitespace is removed.
#[derive(Default, Debug)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormText for NonEmptyString {
    fn into_form_text(self) -> String {
        self.0
    }
}
impl ParseFormText for NonEmptyString {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            Err("Este campo es obligatorio.".to_owned())
        } else {
            Ok(NonEmptyString(value.to_owned()))
        }
    }
}

/// A non-empty string of at most `MAX` characters. Surrounding whitespace is removed.
#[derive(Default, Debug)]
pub struct ShortText<const MAX: usize>(pub String);

impl<const MAX: usize> ShortText<MAX> {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const MAX: usize> FormText for ShortText<MAX> {
    fn into_form_text(self) -> String {
        self.0
    }
}
impl<const MAX: usize> ParseFormText for ShortText<MAX> {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        let value = NonEmptyString::parse_form_text(value)?.into_inner();
        check_max_length(&value, MAX)?;
        Ok(ShortText(value))
    }
}

/// An optional string of at most `MAX` characters. Empty (or whitespace-only) input is
/// represented as `None`.
#[derive(Default, Debug)]
pub struct OptionalShortText<const MAX: usize>(pub Option<String>);

impl<const MAX: usize> OptionalShortText<MAX> {
    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

impl<const MAX: usize> FormText for OptionalShortText<MAX> {
    fn into_form_text(self) -> String {
        self.0.unwrap_or_default()
    }
}
impl<const MAX: usize> ParseFormText for OptionalShortText<MAX> {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(OptionalShortText(None));
        }
        check_max_length(value, MAX)?;
        Ok(OptionalShortText(Some(value.to_owned())))
    }
}

fn check_max_length(value: &str, max: usize) -> Result<(), String> {
    let length = value.chars().count();
    if length > max {
        Err(format!(
            "Máximo {} caracteres permitidos (actualmente {}).",
            max, length
        ))
    } else {
        Ok(())
    }
}

#[derive(Default, Debug, PartialEq)]
pub struct Int32FromList(pub i32);

impl Int32FromList {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl FormText for Int32FromList {
    fn into_form_text(self) -> String {
        self.0.to_string()
    }
}

impl FormTextParser<Int32FromList> for &Vec<i32> {
    fn check_form_text(self, value: &'_ str) -> Result<Int32FromList, String> {
        let id: i32 = value
            .parse()
            .map_err(|_| "Seleccione una opción válida.".to_owned())?;
        if self.contains(&id) {
            Ok(Int32FromList(id))
        } else {
            Err("Seleccione una opción válida. La opción elegida no está disponible.".to_owned())
        }
    }
}

/// A local date and time, as submitted by an HTML `datetime-local` input
#[derive(Debug, PartialEq)]
pub struct LocalDateTime(pub chrono::NaiveDateTime);

impl LocalDateTime {
    pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9999;

    pub fn into_inner(self) -> chrono::NaiveDateTime {
        self.0
    }
}

impl FormText for LocalDateTime {
    fn into_form_text(self) -> String {
        self.0.format("%Y-%m-%dT%H:%M").to_string()
    }
}
impl ParseFormText for LocalDateTime {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("Este campo es obligatorio.".to_owned());
        }
        let date_time = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
            .map_err(|_| "Ingrese una fecha y hora válidas.".to_owned())?;
        if !LocalDateTime::YEAR_RANGE.contains(&date_time.year()) {
            return Err(format!(
                "Ingrese una fecha entre los años {} y {}.",
                LocalDateTime::YEAR_RANGE.start(),
                LocalDateTime::YEAR_RANGE.end()
            ));
        }
        Ok(LocalDateTime(date_time))
    }
}

impl FormText for EventState {
    fn into_form_text(self) -> String {
        self.slug().to_owned()
    }
}
impl ParseFormText for EventState {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        EventState::ALL
            .into_iter()
            .find(|state| state.slug() == value)
            .ok_or_else(|| "Seleccione un estado válido.".to_owned())
    }
}

impl FormText for NoteColor {
    fn into_form_text(self) -> String {
        self.hex().to_owned()
    }
}
impl ParseFormText for NoteColor {
    fn parse_form_text(value: &str) -> Result<Self, String> {
        value
            .parse()
            .map_err(|_| "Seleccione un color válido.".to_owned())
    }
}
