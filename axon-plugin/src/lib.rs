//! Plugin system for axon.
//!
//! Plugins are the tool surface exposed to the LLM: each plugin declares a
//! name, a description, and a JSON parameter schema, and the chat layer turns
//! registered plugins into tool definitions the model can call.

mod plugin;
mod registry;

pub use plugin::{Permission, Plugin, PluginError, PluginOutput, Result};
pub use registry::PluginRegistry;
