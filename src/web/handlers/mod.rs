//! Request handlers, grouped by endpoint family

pub mod commands;
pub mod health;
pub mod process;
