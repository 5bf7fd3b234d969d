#![allow(dead_code)]

pub mod backend;
pub mod config;
pub mod metrics;
pub mod models;
pub mod services;
pub mod sessions;
pub mod utils;

pub use config::Config;
pub use services::SessionContext;
pub use sessions::{
    load_session, AttemptSession, BasicSession, ConfirmOutcome, CrosswordSession, RapidSession,
};
