use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Plugin error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PluginError>;

/// Capabilities a plugin needs in order to run.
///
/// The registry compares these against the permissions granted by the host
/// application; a plugin whose requirements exceed the grant is never
/// registered, so the capability simply does not exist for that session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permission {
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        execute: false,
    };

    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        execute: false,
    };

    pub const ALL: Self = Self {
        read: true,
        write: true,
        execute: true,
    };

    pub const NONE: Self = Self {
        read: false,
        write: false,
        execute: false,
    };

    /// Returns true when every capability in `required` is granted here.
    pub fn allows(&self, required: &Permission) -> bool {
        (!required.read || self.read)
            && (!required.write || self.write)
            && (!required.execute || self.execute)
    }
}

/// Result of a plugin invocation.
#[derive(Debug, Clone)]
pub struct PluginOutput {
    /// Text handed back to the LLM as the tool result.
    pub content: String,
    /// Optional structured payload for host applications.
    pub metadata: Option<Value>,
}

impl PluginOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl fmt::Display for PluginOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// A callable capability exposed to the LLM as a tool.
///
/// The `name` is the identifier the model uses when requesting a call; the
/// description and parameter schema are sent with every chat request so the
/// model knows when and how to call it.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the `arguments` object the plugin accepts.
    fn parameter_schema(&self) -> Value;

    fn required_permission(&self) -> Permission;

    /// Runs the plugin. `input` has already been shaped by the model and is
    /// expected to match [`parameter_schema`](Plugin::parameter_schema).
    async fn execute(&self, input: Value) -> Result<PluginOutput>;
}
