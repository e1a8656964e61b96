//! Input schemas - typed argument contracts validated before dispatch

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::Result;

/// JSON type a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

/// Contract for a single named argument
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
    pub description: String,
    pub required: bool,
    pub allowed: Vec<String>,
    pub pattern: Option<Regex>,
}

impl FieldSpec {
    /// A required string field.
    pub fn string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldType::String,
            description: description.to_string(),
            required: true,
            allowed: Vec::new(),
            pattern: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restrict the value to one of `values`.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Require the value to match `pattern`.
    pub fn matching(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("Invalid pattern for '{}': {}", self.name, e)))?;
        self.pattern = Some(regex);
        Ok(self)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        if !self.kind.matches(value) {
            return Err(Error::Validation(format!(
                "'{}' must be a {}",
                self.name,
                self.kind.as_str()
            )));
        }

        let Some(text) = value.as_str() else {
            return Ok(());
        };

        if !self.allowed.is_empty() && !self.allowed.iter().any(|a| a == text) {
            return Err(Error::Validation(format!(
                "'{}' must be one of [{}], got '{}'",
                self.name,
                self.allowed.join(", "),
                text
            )));
        }

        if let Some(ref pattern) = self.pattern {
            if !pattern.is_match(text) {
                return Err(Error::Validation(format!(
                    "'{}' must match {}, got '{}'",
                    self.name,
                    pattern.as_str(),
                    text
                )));
            }
        }

        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.kind.as_str()));
        if !self.allowed.is_empty() {
            prop.insert("enum".to_string(), json!(self.allowed));
        }
        if let Some(ref pattern) = self.pattern {
            prop.insert("pattern".to_string(), json!(pattern.as_str()));
        }
        prop.insert("description".to_string(), json!(self.description));
        Value::Object(prop)
    }
}

/// Object schema describing a tool's arguments
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `arguments` against every field contract.
    ///
    /// Fields not declared in the schema are ignored.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(Error::Validation("arguments must be an object".to_string())),
        };

        for field in &self.fields {
            match args.get(&field.name) {
                Some(Value::Null) | None if field.required => {
                    return Err(Error::Validation(format!(
                        "missing required field '{}'",
                        field.name
                    )));
                }
                Some(Value::Null) | None => {}
                Some(value) => field.validate(value)?,
            }
        }

        Ok(())
    }

    /// JSON-schema rendering advertised by `tools/list`.
    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}
