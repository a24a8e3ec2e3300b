//! CLI commands.

pub mod ask;
pub mod chat;
pub mod info;
pub mod models;
mod session;
