//! Core library for the attendance-tools command line application.
//!
//! A merge runs strictly left to right: [`io::excel_read`] splits each
//! uploaded workbook into sheets, [`normalize`] turns the clock-in/clock-out
//! cells into times of day, [`classify`] flags late arrivals and early
//! leaves, [`aggregate`] concatenates everything and computes the summary,
//! and [`io::excel_write`] serialises the merged dataset back into a single
//! sheet. [`pipeline`] wires the stages together.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use error::{Result, ToolError};
