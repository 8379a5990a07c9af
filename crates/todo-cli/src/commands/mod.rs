//! Command handlers

pub mod config;
pub mod profile;
pub mod stats;
pub mod sync;
pub mod task;
