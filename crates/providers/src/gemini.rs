use crate::error::LlmError;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::LlmClient;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared::agent_api::{LlmResponse, Role, ToolCallRequest, ToolOutcome, Turn, TurnContent};
use shared::settings::ModelSettings;
use shared::tool::ToolDeclaration;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<ToolDeclaration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

fn to_content(turn: &Turn) -> GeminiContent {
    // Gemini expects roles: "user" | "model" | "function".
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
        Role::ToolResult => "function",
    };
    let part = match &turn.content {
        TurnContent::Text(text) => GeminiPart {
            text: Some(text.clone()),
            ..Default::default()
        },
        TurnContent::ToolResult(payload) => {
            let response = match &payload.outcome {
                ToolOutcome::Result(output) => json!({ "result": output }),
                ToolOutcome::Error(error) => json!({ "error": error }),
            };
            GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    name: payload.name.clone(),
                    response,
                }),
                ..Default::default()
            }
        }
    };
    GeminiContent {
        role: role.to_string(),
        parts: vec![part],
    }
}

fn parse_response(body: &str) -> Result<LlmResponse, LlmError> {
    let body: GeminiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Decoding(e.to_string()))?;
    // Only the first candidate's first part is read.
    let part = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decoding("response has no candidates".into()))?
        .content
        .ok_or_else(|| LlmError::Decoding("candidate has no content".into()))?
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decoding("candidate content has no parts".into()))?;

    if let Some(text) = part.text {
        return Ok(LlmResponse::Text(text));
    }
    if let Some(call) = part.function_call {
        let args = match call.args {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(LlmError::Decoding(format!(
                    "functionCall args for {} is not an object: {}",
                    call.name, other
                )))
            }
        };
        return Ok(LlmResponse::ToolCall(ToolCallRequest {
            name: call.name,
            args,
        }));
    }
    Err(LlmError::Decoding(
        "first part has neither text nor functionCall".into(),
    ))
}

pub struct GeminiClient {
    http: Arc<dyn HttpClient>,
    auth_token: String,
    model: String,
    endpoint_base: String,
    tools: Vec<ToolDeclaration>,
}

impl GeminiClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        model: &str,
        auth_token: &str,
        endpoint_base: &str,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self {
            http,
            auth_token: auth_token.to_string(),
            model: model.to_string(),
            endpoint_base: endpoint_base.trim_end_matches('/').to_string(),
            tools,
        }
    }

    pub fn from_settings(settings: &ModelSettings, tools: Vec<ToolDeclaration>) -> Result<Self> {
        let auth_token = settings
            .gemini_auth
            .resolve("GEMINI_API_KEY")
            .ok_or_else(|| anyhow!("No Gemini API key configured (settings or GEMINI_API_KEY)"))?;
        let http = ReqwestHttpClient::new(Duration::from_secs(settings.request_timeout_secs));
        Ok(Self::new(
            Arc::new(http),
            &settings.gemini_model,
            &auth_token,
            &settings.endpoint_base,
            tools,
        ))
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint_base, self.model)
    }

    fn build_request(&self, prompt: &str, history: &[Turn]) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = history.iter().map(to_content).collect();
        contents.push(to_content(&Turn::user(prompt)));
        GeminiRequest {
            contents,
            tools: vec![GeminiTool {
                function_declarations: self.tools.clone(),
            }],
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str, history: &[Turn]) -> Result<LlmResponse, LlmError> {
        let req = self.build_request(prompt, history);
        let body = serde_json::to_string(&req).map_err(|e| LlmError::Unknown(e.to_string()))?;
        tracing::debug!(
            model = %self.model,
            turns = req.contents.len(),
            "sending gemini request"
        );

        let resp = self
            .http
            .post(
                &self.url(),
                &[
                    ("Content-Type", "application/json"),
                    ("x-goog-api-key", self.auth_token.as_str()),
                ],
                body,
            )
            .await?;

        if !resp.is_success() {
            tracing::warn!(status = resp.status, "gemini returned an error status");
            return Err(LlmError::api(resp.status, &resp.body));
        }
        parse_response(&resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use parking_lot::Mutex;

    struct RecordingHttp {
        reply: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<(String, Vec<(String, String)>, Value)>>,
    }

    impl RecordingHttp {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for RecordingHttp {
        async fn post(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: String,
        ) -> Result<HttpResponse, HttpError> {
            self.requests.lock().push((
                url.to_string(),
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                serde_json::from_str(&body).unwrap(),
            ));
            self.reply.clone()
        }
    }

    fn shell_declaration() -> ToolDeclaration {
        ToolDeclaration {
            name: "execute_shell_command".into(),
            description: "Run a shell command".into(),
            parameters: json!({
                "type": "object",
                "properties": {"command": {"type": "string"}},
                "required": ["command"]
            }),
        }
    }

    fn client(http: Arc<RecordingHttp>) -> GeminiClient {
        GeminiClient::new(
            http,
            "gemini-1.5-flash",
            "secret",
            "https://example.test/v1beta/models/",
            vec![shell_declaration()],
        )
    }

    #[tokio::test]
    async fn test_request_shape() {
        let http = RecordingHttp::replying(
            200,
            r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#,
        );
        let gemini = client(http.clone());
        let history = vec![
            Turn::user("be brief"),
            Turn::model("sure"),
            Turn::tool_result("execute_shell_command", "hi"),
        ];

        let resp = gemini.generate("continue", &history).await.unwrap();
        assert_eq!(resp, LlmResponse::Text("ok".into()));
        assert_eq!(history.len(), 3);

        let requests = http.requests.lock();
        let (url, headers, body) = &requests[0];
        assert_eq!(
            url,
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!url.contains("secret"));
        assert!(headers
            .iter()
            .any(|(k, v)| k == "x-goog-api-key" && v == "secret"));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "function");
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"],
            json!({"name": "execute_shell_command", "response": {"result": "hi"}})
        );
        assert_eq!(contents[3], json!({"role": "user", "parts": [{"text": "continue"}]}));
        // The tool step is sent as a bare functionResponse; no functionCall turn is replayed.
        assert!(contents
            .iter()
            .all(|c| c["parts"][0].get("functionCall").is_none()));

        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "execute_shell_command");
        assert_eq!(decl["parameters"]["required"], json!(["command"]));
    }

    #[tokio::test]
    async fn test_tool_error_turn_serialized_as_error() {
        let http = RecordingHttp::replying(
            200,
            r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#,
        );
        let gemini = client(http.clone());
        let history = vec![Turn::tool_error("delete_everything", "Unknown tool")];
        gemini.generate("continue", &history).await.unwrap();

        let requests = http.requests.lock();
        let body = &requests[0].2;
        assert_eq!(
            body["contents"][0]["parts"][0]["functionResponse"]["response"],
            json!({"error": "Unknown tool"})
        );
    }

    #[tokio::test]
    async fn test_function_call_parsed() {
        let http = RecordingHttp::replying(
            200,
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"functionCall":{"name":"execute_shell_command","args":{"command":"echo hi"}}}
            ]}}]}"#,
        );
        let resp = client(http).generate("list", &[]).await.unwrap();
        match resp {
            LlmResponse::ToolCall(call) => {
                assert_eq!(call.name, "execute_shell_command");
                assert_eq!(call.args["command"], "echo hi");
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_function_call_without_args() {
        let http = RecordingHttp::replying(
            200,
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"delete_everything"}}]}}]}"#,
        );
        match client(http).generate("x", &[]).await.unwrap() {
            LlmResponse::ToolCall(call) => assert!(call.args.is_empty()),
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_is_api_error() {
        let http = RecordingHttp::replying(500, "boom");
        let err = client(http).generate("x", &[]).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::Api {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unrecognized_shapes_are_decoding_errors() {
        for body in [
            r#"{"candidates":[]}"#,
            r#"{}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"x","args":[1]}}]}}]}"#,
            "not json",
        ] {
            let http = RecordingHttp::replying(200, body);
            let err = client(http).generate("x", &[]).await.unwrap_err();
            assert!(
                matches!(err, LlmError::Decoding(_)),
                "{} gave {:?}",
                body,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let http = Arc::new(RecordingHttp {
            reply: Err(HttpError::Connect("refused".into())),
            requests: Mutex::new(Vec::new()),
        });
        let err = client(http).generate("x", &[]).await.unwrap_err();
        assert_eq!(err, LlmError::Transport("refused".into()));
    }
}
