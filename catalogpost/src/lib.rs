use std::time::{SystemTime, UNIX_EPOCH};

pub mod asset_host;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod console;
pub mod draft;
pub mod env;
pub mod event;
pub mod item;
pub mod notification;
pub mod orchestrator;
pub mod rebuild;
pub mod submission;
pub mod validate;

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
