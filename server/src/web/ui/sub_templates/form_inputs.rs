use crate::web::ui::form_values::{BoolFormValue, FormValue, FormText};
use askama::Template;
use serde::Serialize;
use std::borrow::Cow;

pub enum InputSize {
    Small,
    Normal,
    Large,
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    Text,
    DateTimeLocal,
    Textarea,
}

impl InputType {
    fn as_html_type_attr(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::DateTimeLocal => "datetime-local",
            InputType::Textarea => "textarea",
        }
    }
}

impl InputSize {
    fn css_class(&self) -> &'static str {
        match self {
            InputSize::Small => "input-small",
            InputSize::Normal => "input-normal",
            InputSize::Large => "input-large",
        }
    }
}

pub struct InputConfiguration<'a> {
    size: InputSize,
    input_type: InputType,
    info: Option<&'a str>,
    /// Number of rows of textarea inputs
    rows: u32,
}

impl Default for InputConfiguration<'_> {
    fn default() -> Self {
        Self {
            size: InputSize::Normal,
            input_type: InputType::Text,
            info: None,
            rows: 3,
        }
    }
}

impl<'a> InputConfiguration<'a> {
    pub fn builder() -> InputConfigurationBuilder<'a> {
        InputConfigurationBuilder::default()
    }
}

#[derive(Default)]
pub struct InputConfigurationBuilder<'a> {
    value: InputConfiguration<'a>,
}

impl<'a> InputConfigurationBuilder<'a> {
    pub fn size(mut self, size: InputSize) -> Self {
        self.value.size = size;
        self
    }
    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.value.input_type = input_type;
        self
    }
    pub fn info<'b: 'a>(mut self, info: &'b str) -> Self {
        self.value.info = Some(info);
        self
    }
    pub fn rows(mut self, rows: u32) -> Self {
        self.value.rows = rows;
        self
    }
    pub fn build(self) -> InputConfiguration<'a> {
        self.value
    }
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/form_field.html")]
pub struct FormFieldTemplate<'a, T: FormText> {
    name: &'a str,
    label: &'a str,
    config: InputConfiguration<'a>,
    data: &'a FormValue<T>,
}

impl<'a, T: FormText> FormFieldTemplate<'a, T> {
    pub fn new(
        data: &'a FormValue<T>,
        name: &'a str,
        label: &'a str,
        config: InputConfiguration<'a>,
    ) -> Self {
        Self {
            name,
            label,
            config,
            data,
        }
    }
}

#[derive(Serialize)]
pub struct SelectEntry<'a> {
    pub value: Cow<'a, str>,
    pub text: Cow<'a, str>,
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/select.html")]
pub struct SelectTemplate<'a, T: FormText> {
    name: &'a str,
    entries: &'a Vec<SelectEntry<'a>>,
    label: &'a str,
    config: InputConfiguration<'a>,
    data: &'a FormValue<T>,
}

impl<'a, T: FormText> SelectTemplate<'a, T> {
    pub fn new(
        data: &'a FormValue<T>,
        name: &'a str,
        entries: &'a Vec<SelectEntry<'a>>,
        label: &'a str,
        config: InputConfiguration<'a>,
    ) -> Self {
        Self {
            name,
            entries,
            label,
            config,
            data,
        }
    }
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/checkbox.html")]
pub struct CheckboxTemplate<'a> {
    name: &'a str,
    label: &'a str,
    info: Option<&'a str>,
    data: &'a BoolFormValue,
}

impl<'a> CheckboxTemplate<'a> {
    pub fn new(
        data: &'a BoolFormValue,
        name: &'a str,
        label: &'a str,
        info: Option<&'a str>,
    ) -> Self {
        Self {
            name,
            label,
            info,
            data,
        }
    }
}
