//! Report generation.

pub mod generator;

pub use generator::{format_trend, generate_json_report, generate_markdown_report};
