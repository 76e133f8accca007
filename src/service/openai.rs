//! OpenAI chat-completions client for the live extraction mode
//!
//! 单次阻塞请求，无重试、无流式；调用方负责放到后台线程执行。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const API_ERROR_FALLBACK: &str = "Unknown error from OpenAI API";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts specific fields from JSON data. \
Extract only the requested fields and format them in a clear, human-readable way. \
Present each field on a new line. For each field, include the field name followed by its value. \
Do not include any explanatory text before or after the extraction.";

/// 显式传入客户端的配置（不使用全局 API key）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiveExtractionError {
    #[error("OpenAI API key is not configured")]
    NotConfigured,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Api(String),
    #[error("No response content returned from OpenAI")]
    EmptyResponse,
    #[error("{0}")]
    InvalidResponse(String),
}

/// 发给外部服务的请求：选中的字段 + 完整 JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub selected_fields: Vec<String>,
    pub json_data: Value,
}

/// 实时提取协作者；UI 与测试可替换实现
pub trait FieldExtractionService: Send + Sync {
    fn extract(&self, request: &ExtractionRequest) -> Result<String, LiveExtractionError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 只保留根对象中被选中的顶层键；根不是对象时得到空对象
pub fn narrow_to_selected(json: &Value, fields: &[String]) -> Value {
    let mut narrowed = Map::new();
    if let Value::Object(root) = json {
        for field in fields {
            if let Some(v) = root.get(field) {
                narrowed.insert(field.clone(), v.clone());
            }
        }
    }
    Value::Object(narrowed)
}

pub fn build_user_prompt(fields: &[String], narrowed: &Value) -> Result<String, LiveExtractionError> {
    let pretty = serde_json::to_string_pretty(narrowed)
        .map_err(|e| LiveExtractionError::InvalidRequest(e.to_string()))?;
    Ok(format!(
        "Extract these fields from the following JSON data: {}\n\nJSON DATA:\n{}",
        fields.join(", "),
        pretty
    ))
}

/// 把 HTTP 状态与响应体解释为提取结果
///
/// 非 2xx 时响应体可能是任意内容（网关 HTML、空串等），只宽松地取 `error.message`
pub fn interpret_response(success: bool, body: &str) -> Result<String, LiveExtractionError> {
    if !success {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| API_ERROR_FALLBACK.to_string());
        return Err(LiveExtractionError::Api(message));
    }
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LiveExtractionError::InvalidResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default().trim().to_string())
        .ok_or(LiveExtractionError::EmptyResponse)
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn request_body(&self, request: &ExtractionRequest) -> Result<Value, LiveExtractionError> {
        let narrowed = narrow_to_selected(&request.json_data, &request.selected_fields);
        let user_prompt = build_user_prompt(&request.selected_fields, &narrowed)?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        serde_json::to_value(&body).map_err(|e| LiveExtractionError::InvalidRequest(e.to_string()))
    }
}

impl FieldExtractionService for OpenAiClient {
    fn extract(&self, request: &ExtractionRequest) -> Result<String, LiveExtractionError> {
        if request.json_data.is_null() || request.selected_fields.is_empty() {
            return Err(LiveExtractionError::InvalidRequest(
                "No data or fields provided".to_string(),
            ));
        }
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LiveExtractionError::NotConfigured)?;

        let body = self.request_body(request)?;
        tracing::info!(
            "请求 OpenAI 提取 {} 个字段，模型: {}",
            request.selected_fields.len(),
            self.config.model
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| LiveExtractionError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| LiveExtractionError::Transport(e.to_string()))?;

        let result = interpret_response(status.is_success(), &text);
        match &result {
            Ok(content) => tracing::info!("OpenAI 返回 {} 个字符", content.len()),
            Err(e) => tracing::error!("OpenAI 请求失败 ({}): {}", status, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_narrow_keeps_only_selected_top_level_keys() {
        let data = json!({"name": "John", "age": 30, "contact": {"email": "x@y"}});
        let narrowed = narrow_to_selected(&data, &fields(&["name", "email", "missing"]));
        assert_eq!(narrowed, json!({"name": "John"}));
    }

    #[test]
    fn test_narrow_non_object_root() {
        assert_eq!(narrow_to_selected(&json!([1, 2]), &fields(&["a"])), json!({}));
    }

    #[test]
    fn test_user_prompt_layout() {
        let narrowed = json!({"name": "John"});
        let prompt = build_user_prompt(&fields(&["name", "age"]), &narrowed).unwrap();
        assert_eq!(
            prompt,
            "Extract these fields from the following JSON data: name, age\n\nJSON DATA:\n{\n  \"name\": \"John\"\n}"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAiClient::new(OpenAiConfig::default());
        let request = ExtractionRequest {
            selected_fields: fields(&["name"]),
            json_data: json!({"name": "John", "age": 30}),
        };
        let body = client.request_body(&request).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("\"name\": \"John\""));
        assert!(!user.contains("age\": 30"));
    }

    #[test]
    fn test_interpret_success_trims_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  name: John\nage: 30 \n"}}]}"#;
        assert_eq!(interpret_response(true, body).unwrap(), "name: John\nage: 30");
    }

    #[test]
    fn test_interpret_success_without_choices() {
        assert_eq!(
            interpret_response(true, r#"{"choices":[]}"#),
            Err(LiveExtractionError::EmptyResponse)
        );
    }

    #[test]
    fn test_interpret_api_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            interpret_response(false, body),
            Err(LiveExtractionError::Api("Incorrect API key provided".into()))
        );
    }

    #[test]
    fn test_interpret_api_error_fallback() {
        let err = interpret_response(false, "{}").unwrap_err();
        assert_eq!(err.to_string(), "Unknown error from OpenAI API");
    }

    #[test]
    fn test_interpret_non_json_error_body() {
        for body in ["<html>bad gateway</html>", "", r#"{"error":"quota exceeded"}"#, "[1, 2]"] {
            assert_eq!(
                interpret_response(false, body),
                Err(LiveExtractionError::Api(API_ERROR_FALLBACK.into())),
                "响应体: {body:?}"
            );
        }
    }

    #[test]
    fn test_interpret_non_json_success_body() {
        assert!(matches!(
            interpret_response(true, "<html>ok</html>"),
            Err(LiveExtractionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_extract_rejects_empty_fields_before_network() {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: Some("sk-test".into()),
            ..OpenAiConfig::default()
        });
        let request = ExtractionRequest {
            selected_fields: vec![],
            json_data: json!({"a": 1}),
        };
        assert_eq!(
            client.extract(&request).unwrap_err().to_string(),
            "No data or fields provided"
        );
    }

    #[test]
    fn test_extract_requires_api_key() {
        let client = OpenAiClient::new(OpenAiConfig::default());
        let request = ExtractionRequest {
            selected_fields: fields(&["a"]),
            json_data: json!({"a": 1}),
        };
        assert_eq!(client.extract(&request), Err(LiveExtractionError::NotConfigured));
    }
}
