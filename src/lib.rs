//! Dose log and active-load tracker.
//!
//! The decay engine lives in `halflife-core`; this crate wraps it with
//! SQLite persistence ([`db`]), an HTTP API ([`api`]), a client for that API
//! ([`client`]) and terminal rendering ([`render`]).

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod render;
