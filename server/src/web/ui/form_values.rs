//! Form field values of the booking, room and note forms.
//!
//! A [FormValue] keeps the raw text submitted for an input field, so the form can be rendered
//! again with the user's input and the validation errors next to the respective field. Checkbox
//! inputs are represented by [BoolFormValue].

use serde::de::IgnoredAny;
use serde::Deserialize;
use std::fmt::Debug;
use std::marker::PhantomData;

const MISSING_VALUE: &str = "Falta el valor en los datos del formulario";

/// Types which can be shown as the text of an HTML form input.
pub trait FormText: Debug {
    fn into_form_text(self) -> String;
}

/// [FormText] types which can be parsed from the submitted text on their own.
///
/// A [FormValue] of such a type is validated with [ValidateFormValue::validate].
pub trait ParseFormText: FormText + Sized {
    fn parse_form_text(text: &str) -> Result<Self, String>;
}

/// Additional data required to parse a submitted text into `R`, e.g. the list of selectable
/// ids for a select input. Used with [FormValue::validate_with].
pub trait FormTextParser<R: FormText> {
    fn check_form_text(self, text: &str) -> Result<R, String>;
}

impl FormText for String {
    fn into_form_text(self) -> String {
        self
    }
}

impl ParseFormText for String {
    fn parse_form_text(text: &str) -> Result<Self, String> {
        Ok(text.to_owned())
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct FormValue<T: FormText> {
    text: Option<String>,
    #[serde(skip)]
    errors: Vec<String>,
    #[serde(skip)]
    _type: PhantomData<T>,
}

impl<T: FormText> FormValue<T> {
    /// A value that was not submitted. Validating it fails; it renders as an empty input.
    pub fn empty() -> Self {
        Self {
            text: None,
            errors: Vec::new(),
            _type: PhantomData,
        }
    }

    pub fn validate_with<D: FormTextParser<T>>(&mut self, data: D) -> Option<T> {
        self.parse(|text| data.check_form_text(text))
    }

    fn parse(&mut self, parser: impl FnOnce(&str) -> Result<T, String>) -> Option<T> {
        let result = match &self.text {
            Some(text) => parser(text),
            None => Err(MISSING_VALUE.to_owned()),
        };
        result.map_err(|e| self.errors.push(e)).ok()
    }

    /// Attach an error that was found when checking the form as a whole, like a booking conflict
    /// reported for the start time.
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &Vec<String> {
        &self.errors
    }

    /// Text for the `value` attribute (or content) of the rendered input
    pub fn string_value(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

impl<T: FormText + Default> Default for FormValue<T> {
    fn default() -> Self {
        T::default().into()
    }
}

impl<T: FormText> From<T> for FormValue<T> {
    fn from(value: T) -> Self {
        Self {
            text: Some(value.into_form_text()),
            errors: Vec::new(),
            _type: PhantomData,
        }
    }
}

/// Adds [ValidateFormValue::validate] to every [FormValue] of a [ParseFormText] type.
pub trait ValidateFormValue<T> {
    fn validate(&mut self) -> Option<T>;
}

impl<T: ParseFormText> ValidateFormValue<T> for FormValue<T> {
    fn validate(&mut self) -> Option<T> {
        self.parse(T::parse_form_text)
    }
}

/// Value of a checkbox input. Browsers only submit checked checkboxes, so the value is true iff
/// the field is present in the form data, regardless of its content.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Option<IgnoredAny>")]
pub struct BoolFormValue {
    checked: bool,
    errors: Vec<String>,
}

impl BoolFormValue {
    pub fn get_value(&self) -> bool {
        self.checked
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &Vec<String> {
        &self.errors
    }
}

impl From<Option<IgnoredAny>> for BoolFormValue {
    fn from(field: Option<IgnoredAny>) -> Self {
        field.is_some().into()
    }
}

impl From<bool> for BoolFormValue {
    fn from(checked: bool) -> Self {
        Self {
            checked,
            errors: Vec::new(),
        }
    }
}
