use crate::{Permission, Plugin, PluginError, PluginOutput};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Holds every plugin available to a session.
///
/// Registration is permission-checked: a plugin requiring more than the
/// granted permissions is silently refused, which keeps the tool surface the
/// model sees equal to what the host actually allows.
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    granted_permissions: Permission,
}

impl PluginRegistry {
    pub fn new(granted_permissions: Permission) -> Self {
        Self {
            plugins: HashMap::new(),
            granted_permissions,
        }
    }

    /// Registers a plugin. Returns false when the grant does not cover the
    /// plugin's required permissions.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        if !self.granted_permissions.allows(&plugin.required_permission()) {
            return false;
        }

        self.plugins.insert(plugin.name().to_string(), plugin);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    pub fn all(&self) -> Vec<&Arc<dyn Plugin>> {
        self.plugins.values().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Executes a registered plugin by name.
    pub async fn execute(&self, name: &str, input: Value) -> Result<PluginOutput, PluginError> {
        let plugin = self
            .get(name)
            .ok_or_else(|| PluginError::Other(format!("Unknown plugin: {}", name)))?;

        plugin.execute(input).await
    }

    /// Tool specifications for the LLM, one per registered plugin.
    pub fn plugin_specs(&self) -> Vec<Value> {
        self.plugins
            .values()
            .map(|plugin| {
                serde_json::json!({
                    "name": plugin.name(),
                    "description": plugin.description(),
                    "parameters": plugin.parameter_schema(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoPlugin;

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input back"
        }

        fn parameter_schema(&self) -> Value {
            serde_json::json!({ "type": "object" })
        }

        fn required_permission(&self) -> Permission {
            Permission::READ_ONLY
        }

        async fn execute(&self, input: Value) -> crate::Result<PluginOutput> {
            Ok(PluginOutput::new(input.to_string()))
        }
    }

    #[test]
    fn registration_respects_grant() {
        let mut registry = PluginRegistry::new(Permission::READ_ONLY);
        assert!(registry.register(Arc::new(EchoPlugin)));
        assert!(registry.get("echo").is_some());
    }

    #[test]
    fn registration_denied_without_grant() {
        let mut registry = PluginRegistry::new(Permission::NONE);
        assert!(!registry.register(Arc::new(EchoPlugin)));
        assert!(registry.get("echo").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn execute_unknown_plugin_errors() {
        let registry = PluginRegistry::new(Permission::ALL);
        let result = registry.execute("missing", serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
