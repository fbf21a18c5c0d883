//! Tool catalog and function-calling system prompt
//!
//! The catalog maps an intent label to the tool specifications offered for
//! it. Only the first entry per intent is rendered into the prompt, which
//! teaches the model the `<tool_call>` reply format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const PREAMBLE: &str = "You are a function calling AI model. You are provided with function signatures within <tools></tools> XML tags. You may call one or more functions to assist with the user query. Don't make assumptions about what values to plug into functions.\n\nHere is the available tool:\n\n";

const RESPONSE_FORMAT: &str = "Return a JSON object with function name and arguments within <tool_call></tool_call> XML tags as follows:\n<tool_call>\n{\"arguments\": <args-dict>, \"name\": <function-name>}\n</tool_call>";

/// Indentation used for the parameter schema inside the tool block
const SCHEMA_INDENT: &[u8] = b"      ";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read tool catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid tool catalog {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One tool offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpecEntry {
    pub name: String,
    pub description: String,
    #[serde(default = "empty_schema")]
    pub parameters: Value,
}

fn empty_schema() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Intent -> ordered tool specifications
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ToolCatalog {
    intents: HashMap<String, Vec<ToolSpecEntry>>,
}

impl ToolCatalog {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load the catalog file (e.g. `INTENT_TOOL_MAP.json`)
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// First tool registered for `intent`
    pub fn first_tool(&self, intent: &str) -> Option<&ToolSpecEntry> {
        self.intents.get(intent).and_then(|tools| tools.first())
    }

    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }

    /// Sorted list of intents, for startup logging
    pub fn intents(&self) -> Vec<&str> {
        let mut intents: Vec<_> = self.intents.keys().map(String::as_str).collect();
        intents.sort_unstable();
        intents
    }

    /// Render the system instruction for `intent`.
    ///
    /// An intent with no tool is not an error: the result is a sentence
    /// naming the unconfigured intent.
    pub fn render(&self, intent: &str) -> String {
        match self.first_tool(intent) {
            Some(tool) => render_tool_prompt(tool),
            None => format!("No tool configuration found for intent '{intent}'."),
        }
    }
}

/// Render the function-calling instruction block for one tool
pub fn render_tool_prompt(tool: &ToolSpecEntry) -> String {
    let tool_entry = format!(
        "{{\n  \"type\": \"function\",\n  \"function\": {{\n    \"name\": {},\n    \"description\": {},\n    \"parameters\": {}\n  }}\n}}",
        json_string(&tool.name),
        json_string(&tool.description),
        pretty_schema(&tool.parameters),
    );

    format!("{PREAMBLE}<tools>\n{tool_entry}\n</tools>\n\n{RESPONSE_FORMAT}")
}

fn json_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn pretty_schema(schema: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(SCHEMA_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if schema.serialize(&mut serializer).is_err() {
        return schema.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| schema.to_string())
}
