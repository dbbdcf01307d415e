#![doc = include_str!("../README.md")]
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod record;
pub mod store;
