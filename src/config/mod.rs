#[cfg(feature = "cli")]
pub mod cli;
pub mod schedule_config;
pub mod server_config;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command};
pub use schedule_config::ScheduleConfig;
pub use server_config::ServerConfig;
