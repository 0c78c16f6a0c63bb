pub mod browser;
pub mod calendar;
pub mod config;
pub mod data;
pub mod format;
pub mod text;
