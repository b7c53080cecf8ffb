//! CLI commands module.

mod add;
mod attempt;
mod config;
mod library;
mod packets;
mod preview;
mod util;
mod view;

pub use add::AddCommand;
pub use attempt::{AttemptCommand, HistoryCommand};
pub use config::ConfigCommand;
pub use library::{DeleteCommand, ListCommand, ShowCommand};
pub use packets::PacketsCommand;
pub use preview::PreviewCommand;

pub(crate) use util::*;
