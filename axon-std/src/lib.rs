//! Standard library plugins for axon
//!
//! Built-in tools that cover the common cases out of the box:
//! - File operations (read, write, list)
//! - Calculator (safe arithmetic evaluation)

mod calculator;
mod files;

pub use calculator::CalculatorPlugin;
pub use files::{ListDirectoryPlugin, ReadFilePlugin, WriteFilePlugin};
