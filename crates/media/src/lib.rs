//! Files on disk around a generation request: uploaded inputs going in,
//! chart images coming out.

pub mod charts;
pub mod uploads;

pub use {
    charts::{ChartFile, find_latest},
    uploads::{UploadStore, UploadedFile},
};
