//! Waffle charts of CSV leaderboards: load and rank the entrants, tile a
//! rectangle in proportion to their counts, and draw the result.

pub mod chart;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod render;

pub use error::{Error, Result};
