use agentchat_core::{
    AdapterInfo, AgentError, CapabilityMatrix, ChatAdapter, ChatRequest, ChatResponse, Message,
    Role, ToolCall, Usage,
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{json, Map, Value};
use std::env;
use url::Url;
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// Ids minted here for calls the provider sent without one. They are never
// sent back to the provider.
const LOCAL_CALL_PREFIX: &str = "local_call_";

#[derive(Clone, Debug)]
pub struct GeminiAdapter {
    pub api_key: String,
    pub base_url: Url,
    pub api_version: String,
    client: HttpClient,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AgentError> {
        let base_url =
            Url::parse(DEFAULT_BASE_URL).map_err(|e| AgentError::Internal(e.to_string()))?;
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: Url) -> Result<Self, AgentError> {
        let client = HttpClient::builder()
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url,
            api_version: "v1beta".to_string(),
            client,
        })
    }

    /// Reads `GEMINI_API_KEY`, or `GOOGLE_API_KEY` when the former is unset,
    /// and an optional `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .ok_or(AgentError::Authentication)?;
        match lookup("GEMINI_BASE_URL") {
            Some(raw) => {
                let base_url = Url::parse(&raw)
                    .map_err(|e| AgentError::Validation(format!("invalid GEMINI_BASE_URL: {e}")))?;
                Self::with_base_url(api_key, base_url)
            }
            None => Self::new(api_key),
        }
    }

    fn endpoint_url(&self, model: &str) -> Result<Url, AgentError> {
        let mut url = self
            .base_url
            .join(&format!(
                "{}/models/{}:generateContent",
                self.api_version,
                model.trim()
            ))
            .map_err(|e| AgentError::Internal(format!("failed to construct endpoint url: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl ChatAdapter for GeminiAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "gemini".to_string(),
            base_url: Some(self.base_url.clone()),
            capabilities: CapabilityMatrix {
                tools: true,
                system_instruction: true,
                multimodal_input: true,
            },
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = self.endpoint_url(&request.model)?;
        let model = request.model.clone();
        tracing::debug!(
            model = %model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending generateContent request"
        );
        let response = self
            .client
            .post(url)
            .json(&build_generate_body(request))
            .send()
            .await
            .map_err(|e| AgentError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            tracing::warn!(model = %model, %status, "gemini returned an error");
            return Err(parse_http_error(status, text));
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid json response: {e}")))?;
        Ok(parse_chat_response(model, payload))
    }
}

fn build_generate_body(request: ChatRequest) -> Value {
    let mut body = Map::new();
    let mut generation_config = Map::new();
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = request.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    if !generation_config.is_empty() {
        body.insert(
            "generationConfig".to_string(),
            Value::Object(generation_config),
        );
    }

    let mut contents: Vec<Value> = Vec::new();
    let mut system_chunks = Vec::new();
    let mut previous_role = None;
    for message in request.messages {
        let role = message.role;
        match role {
            Role::System => system_chunks.push(message.content),
            Role::User => contents.push(json!({
                "role": "user",
                "parts": [{ "text": message.content }]
            })),
            Role::Assistant => contents.push(model_content(message)),
            // Answers to one model turn share a single user turn, one part per call.
            Role::Tool => {
                let part = function_response_part(message);
                let open_turn = if previous_role == Some(Role::Tool) {
                    contents
                        .last_mut()
                        .and_then(|last| last.get_mut("parts"))
                        .and_then(Value::as_array_mut)
                } else {
                    None
                };
                match open_turn {
                    Some(parts) => parts.push(part),
                    None => contents.push(json!({ "role": "user", "parts": [part] })),
                }
            }
        }
        if role != Role::System {
            previous_role = Some(role);
        }
    }
    body.insert("contents".to_string(), Value::Array(contents));

    if !system_chunks.is_empty() {
        body.insert(
            "systemInstruction".to_string(),
            json!({
                "parts": [{
                    "text": system_chunks.join("\n\n")
                }]
            }),
        );
    }

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema
                })
            })
            .collect();
        body.insert(
            "tools".to_string(),
            json!([{ "functionDeclarations": declarations }]),
        );
    }

    Value::Object(body)
}

fn model_content(message: Message) -> Value {
    let mut parts = Vec::new();
    if !message.content.is_empty() {
        parts.push(json!({ "text": message.content }));
    }
    for call in message.tool_calls {
        let mut function_call = Map::new();
        if let Some(id) = provider_call_id(&call.id) {
            function_call.insert("id".to_string(), Value::String(id.to_string()));
        }
        function_call.insert("name".to_string(), Value::String(call.name));
        function_call.insert("args".to_string(), call.arguments);

        let mut part = Map::new();
        part.insert("functionCall".to_string(), Value::Object(function_call));
        if let Some(signature) = call.signature {
            part.insert("thoughtSignature".to_string(), Value::String(signature));
        }
        parts.push(Value::Object(part));
    }
    json!({ "role": "model", "parts": parts })
}

fn provider_call_id(id: &str) -> Option<&str> {
    (!id.is_empty() && !id.starts_with(LOCAL_CALL_PREFIX)).then_some(id)
}

// Gemini wants an object as the function response; anything else is wrapped.
fn function_response_part(message: Message) -> Value {
    let response = match serde_json::from_str::<Value>(&message.content) {
        Ok(Value::Object(object)) => Value::Object(object),
        Ok(other) => json!({ "result": other }),
        Err(_) => json!({ "result": message.content }),
    };
    let mut function_response = Map::new();
    if let Some(id) = message.tool_call_id.as_deref().and_then(provider_call_id) {
        function_response.insert("id".to_string(), Value::String(id.to_string()));
    }
    function_response.insert(
        "name".to_string(),
        Value::String(message.name.unwrap_or_default()),
    );
    function_response.insert("response".to_string(), response);
    json!({ "functionResponse": Value::Object(function_response) })
}

fn parse_http_error(status: StatusCode, body: String) -> AgentError {
    let message = extract_provider_error(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited,
        _ => AgentError::Provider(message),
    }
}

fn extract_provider_error(body: String) -> String {
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or(body)
}

fn parse_chat_response(model: String, payload: Value) -> ChatResponse {
    let parts = candidate_parts(&payload);
    let output_text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    let tool_calls = parts.iter().filter_map(parse_function_call).collect();

    ChatResponse {
        id: payload
            .get("responseId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        model,
        output_text,
        tool_calls,
        usage: extract_usage(payload.get("usageMetadata")),
    }
}

// Only the first candidate is used; the request never asks for more.
fn candidate_parts(payload: &Value) -> Vec<Value> {
    payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn parse_function_call(part: &Value) -> Option<ToolCall> {
    let function_call = part.get("functionCall")?;
    let name = function_call.get("name").and_then(Value::as_str)?;
    let id = function_call
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{LOCAL_CALL_PREFIX}{}", Uuid::new_v4().simple()));
    Some(ToolCall {
        id,
        name: name.to_string(),
        arguments: function_call.get("args").cloned().unwrap_or(Value::Null),
        signature: part
            .get("thoughtSignature")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

fn extract_usage(raw: Option<&Value>) -> Option<Usage> {
    let usage = raw?;
    let input_tokens = usage
        .get("promptTokenCount")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let output_tokens = usage
        .get("candidatesTokenCount")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let total_tokens = usage
        .get("totalTokenCount")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or_else(|| input_tokens.saturating_add(output_tokens));
    Some(Usage {
        input_tokens,
        output_tokens,
        total_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentchat_core::ToolDefinition;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn time_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_current_time".to_string(),
            description: Some("Returns the current time in a specified city.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        }
    }

    fn sample_request() -> ChatRequest {
        let mut request = ChatRequest::new(
            "gemini-1.5-flash",
            vec![
                Message::system("You tell the time."),
                Message::user("What time is it in Paris?"),
            ],
        );
        request.temperature = Some(0.2);
        request.max_tokens = Some(64);
        request
    }

    fn adapter_for(server: &MockServer) -> GeminiAdapter {
        GeminiAdapter::with_base_url("test-key", Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn chat_contract_parses_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "You tell the time."}]},
                "contents": [{"role": "user"}],
                "generationConfig": {"maxOutputTokens": 64}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseId": "resp_123",
                "candidates": [{
                    "content": {
                        "parts": [{"text": "It is "}, {"text": "10:30 AM."}]
                    }
                }],
                "usageMetadata": {
                    "promptTokenCount": 9,
                    "candidatesTokenCount": 4,
                    "totalTokenCount": 13
                }
            })))
            .mount(&server)
            .await;

        let response = adapter_for(&server).chat(sample_request()).await.unwrap();

        assert_eq!(response.id, "resp_123");
        assert_eq!(response.model, "gemini-1.5-flash");
        assert_eq!(response.output_text, "It is 10:30 AM.");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.unwrap().total_tokens, 13);
    }

    #[tokio::test]
    async fn chat_contract_parses_function_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(json!({
                "tools": [{"functionDeclarations": [{"name": "get_current_time"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{
                            "functionCall": {"name": "get_current_time", "args": {"city": "Paris"}}
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let mut request = sample_request();
        request.tools.push(time_tool());
        let response = adapter_for(&server).chat(request).await.unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        let call = &response.tool_calls[0];
        assert_eq!(call.name, "get_current_time");
        assert_eq!(call.arguments, json!({"city": "Paris"}));
        assert!(call.id.starts_with(LOCAL_CALL_PREFIX));
        assert!(call.signature.is_none());
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn http_errors_map_to_agent_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/bad-model:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "model not found"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/busy-model:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/locked-model:generateContent"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let mut request = sample_request();

        request.model = "bad-model".to_string();
        let err = adapter.chat(request.clone()).await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(msg) if msg == "model not found"));

        request.model = "busy-model".to_string();
        let err = adapter.chat(request.clone()).await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited));

        request.model = "locked-model".to_string();
        let err = adapter.chat(request).await.unwrap_err();
        assert!(matches!(err, AgentError::Authentication));
    }

    #[test]
    fn tool_round_trip_maps_to_function_parts() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_current_time".to_string(),
            arguments: json!({"city": "Paris"}),
            signature: None,
        };
        let mut request = sample_request();
        request.messages.push(Message::assistant_with_tool_calls(
            "",
            vec![call.clone()],
        ));
        request.messages.push(Message::tool_result(
            &call,
            &json!({"status": "success", "city": "Paris", "time": "10:30 AM"}),
        ));

        let body = build_generate_body(request);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(
            contents[1]["parts"][0]["functionCall"]["args"],
            json!({"city": "Paris"})
        );
        assert_eq!(contents[2]["role"], "user");
        let response = &contents[2]["parts"][0]["functionResponse"];
        assert_eq!(response["id"], "call_1");
        assert_eq!(response["name"], "get_current_time");
        assert_eq!(response["response"]["time"], "10:30 AM");
    }

    #[test]
    fn non_object_tool_output_is_wrapped() {
        let call = ToolCall {
            id: "call_2".to_string(),
            name: "echo".to_string(),
            arguments: Value::Null,
            signature: None,
        };
        let mut message = Message::tool_result(&call, &json!("plain"));
        let part = function_response_part(message.clone());
        assert_eq!(
            part["functionResponse"]["response"],
            json!({"result": "plain"})
        );

        message.content = "not json".to_string();
        let part = function_response_part(message);
        assert_eq!(
            part["functionResponse"]["response"],
            json!({"result": "not json"})
        );
    }

    #[tokio::test]
    async fn thought_signature_is_echoed_on_the_next_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{
                            "functionCall": {
                                "id": "fc_7",
                                "name": "get_current_time",
                                "args": {"city": "Paris"}
                            },
                            "thoughtSignature": "c2lnbmF0dXJl"
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let mut request = sample_request();
        request.tools.push(time_tool());
        let response = adapter_for(&server).chat(request.clone()).await.unwrap();
        let call = response.tool_calls[0].clone();
        assert_eq!(call.id, "fc_7");
        assert_eq!(call.signature.as_deref(), Some("c2lnbmF0dXJl"));

        request.messages.push(Message::assistant_with_tool_calls(
            response.output_text,
            vec![call.clone()],
        ));
        request.messages.push(Message::tool_result(
            &call,
            &json!({"status": "success", "time": "10:30 AM"}),
        ));
        let body = build_generate_body(request);

        let model_part = &body["contents"][1]["parts"][0];
        assert_eq!(model_part["thoughtSignature"], "c2lnbmF0dXJl");
        assert_eq!(model_part["functionCall"]["id"], "fc_7");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["id"],
            "fc_7"
        );
    }

    #[test]
    fn parallel_tool_results_share_one_user_turn() {
        let paris = ToolCall {
            id: "fc_1".to_string(),
            name: "get_current_time".to_string(),
            arguments: json!({"city": "Paris"}),
            signature: Some("sig".to_string()),
        };
        let tokyo = ToolCall {
            id: "fc_2".to_string(),
            arguments: json!({"city": "Tokyo"}),
            signature: None,
            ..paris.clone()
        };
        let mut request = sample_request();
        request.messages.push(Message::assistant_with_tool_calls(
            "",
            vec![paris.clone(), tokyo.clone()],
        ));
        request
            .messages
            .push(Message::tool_result(&paris, &json!({"time": "10:30 AM"})));
        request
            .messages
            .push(Message::tool_result(&tokyo, &json!({"time": "10:30 AM"})));
        request.messages.push(Message::user("And in Lima?"));

        let body = build_generate_body(request);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 4);
        let model_parts = contents[1]["parts"].as_array().unwrap();
        assert_eq!(model_parts.len(), 2);
        assert_eq!(model_parts[0]["thoughtSignature"], "sig");
        assert!(model_parts[1].get("thoughtSignature").is_none());

        assert_eq!(contents[2]["role"], "user");
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["functionResponse"]["id"], "fc_1");
        assert_eq!(responses[1]["functionResponse"]["id"], "fc_2");

        assert_eq!(contents[3]["parts"][0]["text"], "And in Lima?");
    }

    #[test]
    fn locally_minted_ids_stay_local() {
        let response = parse_chat_response(
            "gemini-1.5-flash".to_string(),
            json!({
                "candidates": [{
                    "content": {
                        "parts": [{"functionCall": {"name": "get_current_time", "args": {"city": "Oslo"}}}]
                    }
                }]
            }),
        );
        let call = response.tool_calls[0].clone();
        assert!(call.id.starts_with(LOCAL_CALL_PREFIX));

        let mut request = sample_request();
        request
            .messages
            .push(Message::assistant_with_tool_calls("", vec![call.clone()]));
        request
            .messages
            .push(Message::tool_result(&call, &json!({"time": "10:30 AM"})));
        let body = build_generate_body(request);

        let function_call = &body["contents"][1]["parts"][0]["functionCall"];
        assert!(function_call.get("id").is_none());
        assert_eq!(function_call["name"], "get_current_time");
        let function_response = &body["contents"][2]["parts"][0]["functionResponse"];
        assert!(function_response.get("id").is_none());
        assert_eq!(function_response["name"], "get_current_time");
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_prefers_gemini_key() {
        let adapter = GeminiAdapter::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "gemini-key"),
            ("GOOGLE_API_KEY", "google-key"),
        ]))
        .unwrap();
        assert_eq!(adapter.api_key, "gemini-key");
        assert_eq!(adapter.base_url.as_str(), "https://generativelanguage.googleapis.com/");

        let adapter = GeminiAdapter::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "google-key"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(adapter.api_key, "google-key");
        assert_eq!(adapter.base_url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn from_lookup_rejects_missing_key_and_bad_url() {
        let err = GeminiAdapter::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AgentError::Authentication));

        let err = GeminiAdapter::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "gemini-key"),
            ("GEMINI_BASE_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AgentError::Validation(msg) if msg.contains("GEMINI_BASE_URL")));
    }

    #[test]
    fn generation_config_is_omitted_when_unset() {
        let request = ChatRequest::new("gemini-1.5-flash", vec![Message::user("hi")]);
        let body = build_generate_body(request);
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("tools").is_none());
    }
}
