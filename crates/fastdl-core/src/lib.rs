pub mod config;
pub mod logging;

pub mod engine;
pub mod error;
pub mod event;
pub mod fetch;
pub mod tailer;
pub mod validate;
