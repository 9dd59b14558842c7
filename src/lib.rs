//! Stopwatch for tagging what you are doing. Sessions of a chosen activity are timed, kept in
//! memory, and exported into CSV files on request.
//!

pub mod cli;
pub mod controller;
pub mod export;
pub mod tracker;
pub mod utils;
