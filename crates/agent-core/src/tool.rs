//! Tool System
//!
//! Schema-described tools invoked by the reasoning loop. The set of tools is
//! owned by a [`ToolRegistry`] implementation; the loop only sees schemas,
//! calls and results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            id: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Arguments as a JSON object, for deserializing into typed structs
    pub fn arguments_value(&self) -> Value {
        Value::Object(
            self.arguments
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    /// Successful result carrying a JSON payload
    pub fn json(name: impl Into<String>, data: Value) -> Self {
        Self::success(name, String::new()).with_data(data)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Content handed back to the model
    ///
    /// Failures are always rendered as `{"error": ...}` so the model sees a
    /// uniform shape regardless of where the failure came from.
    pub fn to_content(&self) -> String {
        if !self.success {
            return serde_json::json!({ "error": self.output }).to_string();
        }
        match &self.data {
            Some(data) => data.to_string(),
            None => self.output.clone(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Element type for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            items: None,
            description: description.into(),
            required: false,
        }
    }

    pub fn string_array(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "array".into(),
            items: Some("string".into()),
            description: description.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether tool has side effects
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolSchema {
    /// JSON Schema object describing the arguments
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut prop = serde_json::json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(items) = &param.items {
                prop["items"] = serde_json::json!({ "type": items });
            }
            properties.insert(param.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check required fields and primitive types before dispatch
    pub fn validate(&self, call: &ToolCall) -> Result<()> {
        for param in &self.parameters {
            match call.arguments.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(AgentError::ToolValidation(format!(
                            "Missing required parameter: {}",
                            param.name
                        )));
                    }
                }
                Some(value) => {
                    if !matches_type(value, &param.param_type) {
                        return Err(AgentError::ToolValidation(format!(
                            "Parameter '{}' must be of type {}",
                            param.name, param.param_type
                        )));
                    }
                    if let (Some(items), Value::Array(values)) = (&param.items, value) {
                        if !values.iter().all(|v| matches_type(v, items)) {
                            return Err(AgentError::ToolValidation(format!(
                                "Parameter '{}' must be an array of {}",
                                param.name, items
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn matches_type(value: &Value, json_type: &str) -> bool {
    match json_type {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

/// The set of tools an agent may call
///
/// Implementations own dispatch: they decide how a [`ToolCall`] maps onto
/// domain operations. The reasoning loop converts any error returned here into
/// a failed [`ToolResult`].
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Schemas for every tool, declared to the model
    fn schemas(&self) -> Vec<ToolSchema>;

    /// Execute a tool call
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Current domain context for the system prompt (optional)
    async fn context(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Look up a schema by tool name
    fn schema(&self, name: &str) -> Option<ToolSchema> {
        self.schemas().into_iter().find(|s| s.name == name)
    }

    /// Validate arguments against the declared schema
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self
            .schema(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        schema.validate(call)
    }

    /// Get tool names
    fn names(&self) -> Vec<String> {
        self.schemas().into_iter().map(|s| s.name).collect()
    }
}

/// Generate system prompt section describing available tools
pub fn describe_tools(schemas: &[ToolSchema]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");

    for schema in schemas {
        prompt.push_str(&format!("- `{}`: {}\n", schema.name, schema.description));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn swap_schema() -> ToolSchema {
        ToolSchema {
            name: "swap_meal".into(),
            description: "Replace one day's meal".into(),
            parameters: vec![
                ParameterSchema::string("day", "Day name").required(),
                ParameterSchema::string_array("exclude", "Names to avoid"),
            ],
            has_side_effects: true,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_call() {
        let call = ToolCall::new("swap_meal")
            .with_arg("day", json!("tue"))
            .with_arg("exclude", json!(["Pasta"]));
        assert!(swap_schema().validate(&call).is_ok());
    }

    #[test]
    fn test_validate_missing_required() {
        let call = ToolCall::new("swap_meal");
        let err = swap_schema().validate(&call).unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(msg) if msg.contains("day")));
    }

    #[test]
    fn test_validate_wrong_types() {
        let call = ToolCall::new("swap_meal").with_arg("day", json!(3));
        assert!(swap_schema().validate(&call).is_err());

        let call = ToolCall::new("swap_meal")
            .with_arg("day", json!("mon"))
            .with_arg("exclude", json!(["Pasta", 7]));
        assert!(swap_schema().validate(&call).is_err());
    }

    #[test]
    fn test_null_optional_is_absent() {
        let call = ToolCall::new("swap_meal")
            .with_arg("day", json!("mon"))
            .with_arg("exclude", Value::Null);
        assert!(swap_schema().validate(&call).is_ok());
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = swap_schema().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["day"]));
        assert_eq!(schema["properties"]["exclude"]["items"]["type"], "string");
    }

    #[test]
    fn test_failure_content_is_error_object() {
        let result = ToolResult::failure("get_recipe", "not found");
        let content: Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(content["error"], "not found");

        let ok = ToolResult::json("list_recipes", json!([{"name": "Oats"}]));
        assert_eq!(ok.to_content(), r#"[{"name":"Oats"}]"#);
    }
}
