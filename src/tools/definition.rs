// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool definition types
//!
//! Schemas for the six client-executed tools advertised to the LLM.

use serde_json::Value;

use crate::llm::provider::{ToolDefinition, ToolInputSchema};
use crate::project::FileTarget;

use super::ToolName;

/// Helper to create a tool input schema
pub struct SchemaBuilder {
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            properties: serde_json::Map::new(),
            required: vec![],
        }
    }

    /// Add a string property
    pub fn string(mut self, name: &str, description: &str, required: bool) -> Self {
        self.properties.insert(
            name.to_string(),
            serde_json::json!({
                "type": "string",
                "description": description
            }),
        );
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string property restricted to `values`
    pub fn string_enum(
        mut self,
        name: &str,
        description: &str,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            serde_json::json!({
                "type": "string",
                "description": description,
                "enum": values
            }),
        );
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Build the schema
    pub fn build(self) -> ToolInputSchema {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: Value::Object(self.properties),
            required: self.required,
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn target_values() -> Vec<&'static str> {
    FileTarget::ALL.iter().map(|t| t.as_str()).collect()
}

/// Definition for a single tool
pub fn tool_definition(name: ToolName) -> ToolDefinition {
    let (description, schema) = match name {
        ToolName::ReadFiles => (
            "Read the full content of the current project files.",
            SchemaBuilder::new().build(),
        ),
        ToolName::UpdateFile => (
            "Completely replace the content of a single file.",
            SchemaBuilder::new()
                .string_enum("target", "The file to replace", &target_values(), true)
                .string("content", "The new, complete file content", true)
                .build(),
        ),
        ToolName::PatchFile => (
            "Replace a specific segment of code within a file.",
            SchemaBuilder::new()
                .string_enum("target", "The file to patch", &target_values(), true)
                .string(
                    "search_string",
                    "Exact code to find. Must appear exactly once in the file.",
                    true,
                )
                .string("replacement_string", "Code to put in its place", true)
                .build(),
        ),
        ToolName::ScreenshotWebsite => (
            "Take a visual screenshot of the current rendered website.",
            SchemaBuilder::new().build(),
        ),
        ToolName::ValidateFunctionality => (
            "Execute a JavaScript test script against the current website.",
            SchemaBuilder::new()
                .string(
                    "test_script",
                    "JavaScript that throws or returns false when the check fails",
                    true,
                )
                .build(),
        ),
        ToolName::ReadConsoleLogs => (
            "Read the browser console logs from the preview window.",
            SchemaBuilder::new().build(),
        ),
    };

    ToolDefinition {
        name: name.as_str().to_string(),
        description: description.to_string(),
        input_schema: schema,
    }
}

/// All tools, in advertisement order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(tool_definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_default() {
        let builder = SchemaBuilder::default();
        assert!(builder.properties.is_empty());
        assert!(builder.required.is_empty());
    }

    #[test]
    fn test_schema_builder_string_optional() {
        let builder = SchemaBuilder::new().string("name", "The name field", false);

        assert!(builder.properties.contains_key("name"));
        assert!(!builder.required.contains(&"name".to_string()));
    }

    #[test]
    fn test_schema_builder_string_enum() {
        let schema = SchemaBuilder::new()
            .string_enum("target", "Which file", &["html", "css"], true)
            .build();

        assert_eq!(schema.properties["target"]["enum"], serde_json::json!(["html", "css"]));
        assert_eq!(schema.required, vec!["target"]);
    }

    #[test]
    fn test_six_tools_in_order() {
        let names: Vec<_> = tool_definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "read_files",
                "update_file",
                "patch_file",
                "screenshot_website",
                "validate_functionality",
                "read_console_logs"
            ]
        );
    }

    #[test]
    fn test_parameterless_tools_have_empty_schemas() {
        for name in [
            ToolName::ReadFiles,
            ToolName::ScreenshotWebsite,
            ToolName::ReadConsoleLogs,
        ] {
            assert!(tool_definition(name).input_schema.is_empty());
        }
    }

    #[test]
    fn test_patch_file_schema() {
        let schema = tool_definition(ToolName::PatchFile).input_schema;
        assert_eq!(
            schema.required,
            vec!["target", "search_string", "replacement_string"]
        );
        assert_eq!(
            schema.properties["target"]["enum"],
            serde_json::json!(["html", "css", "javascript"])
        );
    }
}
