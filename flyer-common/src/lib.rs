//! # Flyer Common Library
//!
//! Shared code for the flyer-distribution services:
//! - Error and result types
//! - Bootstrap configuration loading
//! - French tour-date parsing and formatting
//! - Database schema initialization and row models
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod tour_date;

pub use error::{Error, Result};
pub use tour_date::{format_tour_date, parse_tour_date, TourDate};
