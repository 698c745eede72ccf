use async_trait::async_trait;
use axon_plugin::{Permission, Plugin, PluginError, PluginOutput, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// Plugin for reading file contents.
pub struct ReadFilePlugin;
/// Plugin for writing file contents.
pub struct WriteFilePlugin;
/// Plugin for listing directory entries.
pub struct ListDirectoryPlugin;

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WriteFileParams {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ListDirectoryParams {
    path: String,
}

#[async_trait]
impl Plugin for ReadFilePlugin {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file"
    }

    fn parameter_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["path"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file to read"
                }
            }
        })
    }

    fn required_permission(&self) -> Permission {
        Permission::READ_ONLY
    }

    async fn execute(&self, input: Value) -> Result<PluginOutput> {
        let params: ReadFileParams = serde_json::from_value(input)
            .map_err(|e| PluginError::InvalidInput(format!("Invalid parameters: {}", e)))?;

        let path = PathBuf::from(&params.path);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("Failed to read file: {}", e)))?;

        Ok(PluginOutput::new(content))
    }
}

#[async_trait]
impl Plugin for WriteFilePlugin {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating it if needed"
    }

    fn parameter_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["path", "content"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file to write to"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            }
        })
    }

    fn required_permission(&self) -> Permission {
        Permission::READ_WRITE
    }

    async fn execute(&self, input: Value) -> Result<PluginOutput> {
        let params: WriteFileParams = serde_json::from_value(input)
            .map_err(|e| PluginError::InvalidInput(format!("Invalid parameters: {}", e)))?;

        let path = PathBuf::from(&params.path);

        tokio::fs::write(&path, &params.content)
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("Failed to write file: {}", e)))?;

        Ok(PluginOutput::new(format!(
            "Successfully wrote {} bytes to {}",
            params.content.len(),
            path.display()
        )))
    }
}

#[async_trait]
impl Plugin for ListDirectoryPlugin {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the entries of a directory; directories are suffixed with '/'"
    }

    fn parameter_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["path"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the directory to list"
                }
            }
        })
    }

    fn required_permission(&self) -> Permission {
        Permission::READ_ONLY
    }

    async fn execute(&self, input: Value) -> Result<PluginOutput> {
        let params: ListDirectoryParams = serde_json::from_value(input)
            .map_err(|e| PluginError::InvalidInput(format!("Invalid parameters: {}", e)))?;

        let path = PathBuf::from(&params.path);

        let mut reader = tokio::fs::read_dir(&path).await.map_err(|e| {
            PluginError::ExecutionFailed(format!("Failed to list directory: {}", e))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            PluginError::ExecutionFailed(format!("Failed to read directory entry: {}", e))
        })? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();

        Ok(PluginOutput::new(entries.join("\n"))
            .with_metadata(serde_json::json!({ "count": entries.len() })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("note.txt");
        std::fs::write(&file, "Hello, axon!").unwrap();

        let plugin = ReadFilePlugin;
        let input = serde_json::json!({ "path": file.to_str().unwrap() });

        let result = plugin.execute(input).await.unwrap();
        assert_eq!(result.content, "Hello, axon!");
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let plugin = ReadFilePlugin;
        let input = serde_json::json!({ "path": "/nonexistent/file.txt" });

        assert!(plugin.execute(input).await.is_err());
    }

    #[tokio::test]
    async fn test_write_file_creates_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out.txt");

        let plugin = WriteFilePlugin;
        let input = serde_json::json!({
            "path": file.to_str().unwrap(),
            "content": "written"
        });

        let result = plugin.execute(input).await.unwrap();
        assert!(result.content.contains("Successfully wrote"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "written");
    }

    #[tokio::test]
    async fn test_list_directory_marks_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();

        let plugin = ListDirectoryPlugin;
        let input = serde_json::json!({ "path": dir.path().to_str().unwrap() });

        let result = plugin.execute(input).await.unwrap();
        assert_eq!(result.content, "a/\nb.txt");
    }

    #[tokio::test]
    async fn test_invalid_params_are_rejected() {
        let plugin = ReadFilePlugin;
        let result = plugin.execute(serde_json::json!({ "wrong": true })).await;
        assert!(matches!(result, Err(PluginError::InvalidInput(_))));
    }
}
