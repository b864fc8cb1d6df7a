//! OpenAI-compatible chat-completions provider. Works against OpenAI itself,
//! LM Studio, vLLM, Ollama's OpenAI-compatible endpoint, and any other
//! server implementing the same wire format.

use async_stream::try_stream;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{LlmError, LlmResult};
use crate::provider::{LlmProvider, ProviderConfig, StreamBox};
use crate::types::{
    LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason, StreamEvent,
    ToolCall, Usage,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const LM_STUDIO_URL: &str = "http://localhost:1234/v1/chat/completions";

/// OpenAI-compatible chat-completions provider.
pub struct OpenAiCompatProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiCompatProvider {
    /// Connect to a local LM Studio instance with its default model.
    #[must_use]
    pub fn lm_studio() -> Self {
        Self::lm_studio_with_model("local-model")
    }

    /// Connect to a local LM Studio instance with a specific model name.
    #[must_use]
    pub fn lm_studio_with_model(model: impl Into<String>) -> Self {
        let config = ProviderConfig::new("lm-studio", model).base_url(LM_STUDIO_URL);
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Connect to OpenAI's hosted API.
    #[must_use]
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = ProviderConfig::new(api_key, model).base_url(OPENAI_API_URL);
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Connect to a custom OpenAI-compatible endpoint.
    #[must_use]
    pub fn custom(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let config = ProviderConfig::new(api_key, model).base_url(base_url);
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Override max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.config = self.config.max_tokens(max);
        self
    }

    /// Override sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config = self.config.temperature(temp);
        self
    }

    /// Override context window size.
    #[must_use]
    pub fn with_max_context(mut self, size: usize) -> Self {
        self.config = self.config.context_window(size);
        self
    }

    fn is_local_url(&self) -> bool {
        self.config
            .base_url
            .as_deref()
            .is_some_and(|u| u.contains("localhost") || u.contains("127.0.0.1"))
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
        stream: bool,
    ) -> Value {
        let mut api_messages = Vec::new();

        if !system.is_empty() {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }

        api_messages.extend(messages.iter().map(convert_message));

        let mut request = serde_json::json!({
            "model": self.config.model,
            "messages": api_messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": stream,
        });

        if !tools.is_empty() {
            let api_tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            request["tools"] = Value::Array(api_tools);
        }

        request
    }
}

fn convert_message(message: &Message) -> Value {
    match &message.content {
        MessageContent::Text(text) => {
            serde_json::json!({
                "role": match message.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "user",
                },
                "content": text,
            })
        },
        MessageContent::ToolCalls(calls) => {
            let tool_calls: Vec<Value> = calls
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.id,
                        "type": "function",
                        "function": {
                            "name": c.name,
                            "arguments": c.arguments.to_string(),
                        }
                    })
                })
                .collect();

            serde_json::json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": tool_calls,
            })
        },
        MessageContent::ToolResult(result) => {
            serde_json::json!({
                "role": "tool",
                "tool_call_id": result.call_id,
                "content": result.content,
            })
        },
        MessageContent::MultiPart(parts) => {
            let content: Vec<Value> = parts
                .iter()
                .map(|p| match p {
                    crate::types::ContentPart::Text { text } => {
                        serde_json::json!({"type": "text", "text": text})
                    },
                    crate::types::ContentPart::Image { data, media_type } => {
                        serde_json::json!({
                            "type": "image_url",
                            "image_url": {
                                "url": format!("data:{media_type};base64,{data}"),
                            }
                        })
                    },
                })
                .collect();

            serde_json::json!({
                "role": match message.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "user",
                },
                "content": content,
            })
        },
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        if self.is_local_url() {
            "openai-compatible-local"
        } else {
            "openai"
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox> {
        if self.config.api_key.is_empty() && !self.is_local_url() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai".to_owned(),
            });
        }

        let request_body = self.build_request(messages, tools, system, true);
        let url = self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL);

        debug!(model = self.config.model, url, "starting openai-compat stream");

        let mut req = self.client.post(url).json(&request_body);
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "openai-compatible API error");

            if status.as_u16() == 429 {
                return Err(LlmError::RateLimitExceeded {
                    retry_after_secs: 60,
                });
            }

            return Err(LlmError::ApiRequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let stream = try_stream! {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut tool_call_ids: Vec<String> = Vec::new();

            use futures::StreamExt;

            while let Some(chunk) = bytes_stream.next().await {
                let chunk = chunk?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    let rest_start = line_end + 1;
                    buffer = buffer[rest_start..].to_string();

                    let Some(data) = line.strip_prefix("data: ") else { continue };

                    if data == "[DONE]" {
                        yield StreamEvent::Done;
                        continue;
                    }

                    if data.is_empty() {
                        continue;
                    }

                    let Ok(event) = serde_json::from_str::<OpenAiStreamEvent>(data) else { continue };

                    for choice in event.choices {
                        if let Some(content) = choice.delta.content {
                            yield StreamEvent::TextDelta(content);
                        }

                        if let Some(tool_calls) = choice.delta.tool_calls {
                            for tc in tool_calls {
                                let index = tc.index;
                                while tool_call_ids.len() <= index {
                                    tool_call_ids.push(String::new());
                                }

                                if let Some(id) = tc.id {
                                    tool_call_ids[index] = id.clone();
                                    if let Some(function) = &tc.function {
                                        if let Some(name) = &function.name {
                                            yield StreamEvent::ToolCallStart {
                                                id,
                                                name: name.clone(),
                                            };
                                        }
                                    }
                                } else if let Some(function) = &tc.function {
                                    if let Some(args) = &function.arguments {
                                        yield StreamEvent::ToolCallDelta {
                                            id: tool_call_ids[index].clone(),
                                            args_delta: args.clone(),
                                        };
                                    }
                                }
                            }
                        }

                        if let Some(reason) = choice.finish_reason {
                            if reason == "tool_calls" {
                                for id in &tool_call_ids {
                                    if !id.is_empty() {
                                        yield StreamEvent::ToolCallEnd { id: id.clone() };
                                    }
                                }
                            }
                            yield StreamEvent::Done;
                        }
                    }

                    if let Some(usage) = event.usage {
                        yield StreamEvent::Usage {
                            input_tokens: usage.prompt_tokens,
                            output_tokens: usage.completion_tokens,
                        };
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse> {
        if self.config.api_key.is_empty() && !self.is_local_url() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai".to_owned(),
            });
        }

        let request_body = self.build_request(messages, tools, system, false);
        let url = self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL);

        debug!(model = self.config.model, url, "sending openai-compatible request");

        let mut req = self.client.post(url).json(&request_body);
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "openai-compatible API error");

            if status.as_u16() == 429 {
                return Err(LlmError::RateLimitExceeded {
                    retry_after_secs: 60,
                });
            }

            return Err(LlmError::ApiRequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_owned()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(Value::Object(serde_json::Map::new()));
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        let message = if tool_calls.is_empty() {
            Message::assistant(choice.message.content.unwrap_or_default())
        } else {
            Message::assistant_with_tools(tool_calls)
        };

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            Some("tool_calls") => StopReason::ToolUse,
            Some("stop") | None => StopReason::EndTurn,
            _ => StopReason::EndTurn,
        };

        Ok(LlmResponse {
            has_tool_calls: matches!(stop_reason, StopReason::ToolUse),
            message,
            stop_reason,
            usage: api_response
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
        })
    }

    fn max_context_length(&self) -> usize {
        self.config.context_window.unwrap_or(8192)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamEvent {
    choices: Vec<OpenAiStreamChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamToolCall {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<OpenAiStreamFunction>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lm_studio_targets_local_url() {
        let provider = OpenAiCompatProvider::lm_studio();
        assert!(provider.is_local_url());
        assert_eq!(provider.name(), "openai-compatible-local");
    }

    #[test]
    fn openai_is_not_local() {
        let provider = OpenAiCompatProvider::openai("sk-test", "gpt-4o");
        assert!(!provider.is_local_url());
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn build_request_includes_system_message() {
        let provider = OpenAiCompatProvider::openai("sk-test", "gpt-4o");
        let messages = vec![Message::user("Hello")];
        let request = provider.build_request(&messages, &[], "You are helpful", false);

        let msgs = request["messages"].as_array().unwrap();
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[1]["role"], "user");
    }

    #[test]
    fn convert_message_serializes_tool_result() {
        let result = crate::types::ToolCallResult::success("call-1", "ok");
        let msg = Message::tool_result(result);
        let converted = convert_message(&msg);
        assert_eq!(converted["role"], "tool");
        assert_eq!(converted["tool_call_id"], "call-1");
    }

    #[test]
    fn custom_endpoint_without_key_is_local_if_url_says_so() {
        let provider = OpenAiCompatProvider::custom("", "local", "http://127.0.0.1:8000/v1/chat/completions");
        assert!(provider.is_local_url());
    }
}
