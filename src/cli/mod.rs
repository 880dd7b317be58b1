//! Command-line interface definitions and subcommand handlers.

mod args;
mod commands;

pub use args::{Args, Command, RunArgs};
pub use commands::{list_featured, load_config, run_session, show_item};
