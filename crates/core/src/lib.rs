//! Core business logic for pulse: the proactive trigger engine, action
//! executor, automation rules, and notification delivery pipeline.

pub mod services;

pub use services::*;
