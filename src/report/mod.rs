//! Report generation modules.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, status_line};
