//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - init and shared utilities (open_db, load_engine)
//! - `accounts` - list and add accounts
//! - `import` - CSV import
//! - `periods` - closed-period boundaries
//! - `targets` - stored category targets
//! - `recommend` - budget recommendations
//! - `serve` - web server

pub mod accounts;
pub mod core;
pub mod import;
pub mod periods;
pub mod recommend;
pub mod serve;
pub mod targets;

// Re-export command functions for main.rs
pub use accounts::*;
pub use core::*;
pub use import::*;
pub use periods::*;
pub use recommend::*;
pub use serve::*;
pub use targets::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
