//! spotcli library
//!
//! A command-line client for the Spotify Web API. The library is split into
//! the API access layer ([`spotify`], [`management`]) and the command bodies
//! built on top of it ([`cli`]).
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Credential persistence
//! - `spotify` - Authorization, requests, paging and batches against the Web API
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use spotcli::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> spotcli::error::Result<()> {
//!     config::load_env().await?;
//!     cli::status(false).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints a user-facing message prefixed with a blue `o`.
///
/// ```ignore
/// info!("Logged in as {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a user-facing message prefixed with a green `✓`.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints the message to stderr with a red `!` and exits with status 1.
///
/// Only `main` should reach for this; library code returns
/// [`error::Error`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a recoverable problem to stderr with a yellow `!`.
///
/// ```ignore
/// warning!("Could not save {}: {}", name, err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
