//! HTTP model gateway for OpenAI-compatible chat completion endpoints.
//!
//! Offered tools are sent as `tools` function definitions; a response with
//! `tool_calls` becomes [`Completion::ToolCall`] (first call only), anything
//! else becomes [`Completion::Text`].

use async_trait::async_trait;
use counsel_application::ports::model_gateway::{GatewayError, ModelGateway};
use counsel_domain::{Completion, ToolCall, ToolDescriptor};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct HttpModelGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpModelGateway {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Per-request timeout enforced by the HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GatewayError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Other(e.to_string()))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn request_body(model: &str, prompt: &str, tools: Option<&[ToolDescriptor]>) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0.1,
    });

    if let Some(tools) = tools.filter(|t| !t.is_empty()) {
        body["tools"] = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema(),
                    }
                })
            })
            .collect();
    }
    body
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct ToolCallPayload {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

fn parse_response(body: &str) -> Result<Completion, GatewayError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("failed to parse response: {}", e)))?;
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| GatewayError::InvalidResponse("no choices".to_string()))?;

    if let Some(payload) = message.tool_calls.into_iter().next() {
        let arguments: Map<String, Value> = if payload.function.arguments.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&payload.function.arguments).map_err(|e| {
                GatewayError::InvalidResponse(format!("tool arguments are not an object: {}", e))
            })?
        };
        return Ok(Completion::tool_call(
            ToolCall::new(payload.function.name).with_arguments(arguments),
        ));
    }

    Ok(Completion::text(message.content.unwrap_or_default()))
}

fn send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn complete(
        &self,
        prompt: &str,
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion, GatewayError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let mut request = self.client.post(&url).json(&request_body(&self.model, prompt, tools));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.model, tools = tools.map_or(0, |t| t.len()), "Model request");
        let response = request.send().await.map_err(send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(send_error)?;
        if status.as_u16() == 429 {
            return Err(GatewayError::RateLimited(body));
        }
        if status.is_server_error() {
            warn!(%status, "Model endpoint server error");
            return Err(GatewayError::ConnectionError(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!("{}: {}", status, body)));
        }

        parse_response(&body)
    }
}
