mod admin;
mod commands;

pub use admin::health;
pub use commands::slash_command;
