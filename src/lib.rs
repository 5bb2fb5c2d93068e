pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod gmail_api;
pub mod logging;
pub mod purge;
pub mod types;

pub use error::{Error, Result};
