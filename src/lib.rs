//! Stratus - cloud automation from the command line
//!
//! This crate provides the `stratus` binary and its shell-completion
//! machinery: static bash completion scripts, and zsh scripts that
//! rewrite the embedded bash output into zsh form at load time.

// Public modules
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{Result, StratusError};

/// Current version of Stratus
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
