//! Shared helpers for the tabula crates: JSON document files and timestamps.

pub mod json_file;
pub mod time;
