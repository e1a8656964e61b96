//! Gemini LLM client implementation (API key authentication).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::super::message::{Message, Role, ToolCallRequest};
use super::{GeminiResponse, LlmClient, LlmResponse, Usage};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Schema keywords the function-declaration API rejects.
const UNSUPPORTED_SCHEMA_KEYS: [&str; 2] = ["pattern", "additionalProperties"];

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.model, self.api_key
        )
    }

    /// Convert the conversation into Gemini `contents`.
    ///
    /// Consecutive tool results are folded into a single function turn so
    /// that one model turn with N calls is answered by one turn with N parts.
    fn convert_messages(&self, messages: &[Message]) -> Vec<Value> {
        let mut contents: Vec<Value> = Vec::with_capacity(messages.len());

        for m in messages {
            match m.role {
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{"text": m.content}]
                })),
                Role::Assistant => {
                    let mut parts = Vec::with_capacity(m.tool_calls.len() + 1);
                    if !m.content.is_empty() {
                        parts.push(json!({"text": m.content}));
                    }
                    parts.extend(m.tool_calls.iter().map(|tc| {
                        json!({
                            "functionCall": {
                                "name": tc.name,
                                "args": tc.arguments
                            }
                        })
                    }));
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                Role::Tool => {
                    let key = if m.is_error { "error" } else { "result" };
                    let part = json!({
                        "functionResponse": {
                            "name": m.tool_name.as_deref().unwrap_or("unknown"),
                            "response": {key: m.content}
                        }
                    });

                    match contents.last_mut() {
                        Some(last) if last["role"] == "function" => {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                            }
                        }
                        _ => contents.push(json!({"role": "function", "parts": [part]})),
                    }
                }
            }
        }

        contents
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Option<Value> {
        if tools.is_empty() {
            return None;
        }

        let function_declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                let mut parameters = t.input_schema.clone();
                strip_unsupported(&mut parameters);
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": parameters
                })
            })
            .collect();

        Some(json!([{
            "functionDeclarations": function_declarations
        }]))
    }

    fn parse_response(&self, response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelUnavailable("No candidates in response".to_string()))?;

        let mut text = Vec::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push(t);
            }

            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCallRequest::new(fc.name, fc.args));
            }
        }

        let usage = response
            .usage_metadata
            .as_ref()
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count.unwrap_or(0),
                completion_tokens: u.candidates_token_count.unwrap_or(0),
                total_tokens: u.total_token_count.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: (!text.is_empty()).then(|| text.concat()),
            tool_calls,
            finish_reason: candidate
                .finish_reason
                .unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

/// Remove keywords Gemini does not accept, at every nesting level.
fn strip_unsupported(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for key in UNSUPPORTED_SCHEMA_KEYS {
                map.remove(key);
            }
            map.values_mut().for_each(strip_unsupported);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_unsupported),
        _ => {}
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let mut request = json!({
            "contents": self.convert_messages(messages),
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 8192
            }
        });

        if let Some(tool_config) = self.convert_tools(tools) {
            request["tools"] = tool_config;
        }

        let response = self.client.post(self.build_url()).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Error::ModelUnavailable(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        self.parse_response(gemini_response)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::ToolCallResult;

    fn client() -> GeminiClient {
        GeminiClient::new("key", "gemini-2.0-flash")
    }

    #[test]
    fn test_tool_results_are_grouped() {
        let a = ToolCallRequest::new("get_lounge", json!({"sessionId": "1"}));
        let b = ToolCallRequest::new("get_flight_data", json!({}));
        let messages = vec![
            Message::user("hi"),
            Message::assistant_with_tools("", vec![a.clone(), b.clone()]),
            Message::tool_result(&a, ToolCallResult::ok(&a.id, "lounges")),
            Message::tool_result(&b, ToolCallResult::error(&b.id, "Error: bad date")),
        ];

        let contents = client().convert_messages(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 2);

        let parts = contents[2]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["functionResponse"]["name"], "get_lounge");
        assert_eq!(parts[1]["functionResponse"]["response"]["error"], "Error: bad date");
    }

    #[test]
    fn test_convert_tools_strips_pattern() {
        let tools = vec![ToolDefinition {
            name: "get_flight_data".to_string(),
            description: "d".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"travelDate": {"type": "string", "pattern": "^\\d{8}$"}}
            }),
        }];

        let converted = client().convert_tools(&tools).unwrap();
        let params = &converted[0]["functionDeclarations"][0]["parameters"];
        assert!(params["properties"]["travelDate"].get("pattern").is_none());
        assert_eq!(params["properties"]["travelDate"]["type"], "string");
        assert!(client().convert_tools(&[]).is_none());
    }

    #[test]
    fn test_parse_function_call_response() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"name": "get_lounge", "args": {"sessionId": "1"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "totalTokenCount": 12}
        });

        let parsed = client()
            .parse_response(serde_json::from_value(raw).unwrap())
            .unwrap();
        assert!(parsed.content.is_none());
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "get_lounge");
        assert_eq!(parsed.usage.total_tokens, 12);
    }

    #[test]
    fn test_parse_empty_candidates() {
        let parsed = client().parse_response(serde_json::from_value(json!({})).unwrap());
        assert!(matches!(parsed, Err(Error::ModelUnavailable(_))));
    }
}
