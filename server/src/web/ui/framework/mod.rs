//! Generic building blocks of the web user interface: the base template context, flash messages
//! and error pages

pub mod base_template;
pub mod error_page;
pub mod flash;
