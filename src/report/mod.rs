//! Report rendering.

pub mod generator;

pub use generator::{generate_json_report, generate_post_report, generate_profiles_report};
