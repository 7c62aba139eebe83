//! OpenAI-compatible chat-completions client.
//!
//! Requests are streamed: `POST {endpoint}/chat/completions` with
//! `stream: true` answers with server-sent events whose `data:` lines carry
//! JSON chunks. Content deltas are concatenated until `data: [DONE]`.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::prompt::{user_message, SYSTEM_PROMPT};
use super::{Generator, GeneratorError};
use crate::config::GeneratorConfig;

/// Substrings of model ids acceptable as a fallback, in preference order.
const FALLBACK_MODEL_HINTS: &[&str] = &["llama", "gpt", "gemma"];

/// Longest provider error body kept in a [`GeneratorError::Status`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// Incremental decoder for a chat-completions event stream.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// input is buffered until a full line is available.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    content: String,
    skipped: usize,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes. Returns true once `[DONE]` has been seen.
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        if self.done {
            return true;
        }
        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
            if self.done {
                self.pending.clear();
                break;
            }
        }

        self.done
    }

    fn handle_line(&mut self, line: &str) {
        let data = match line.trim().strip_prefix("data:") {
            Some(data) => data.trim(),
            None => return,
        };
        if data.is_empty() {
            return;
        }
        if data == "[DONE]" {
            self.done = true;
            return;
        }

        match serde_json::from_str::<ChatChunk>(data) {
            Ok(chunk) => {
                if let Some(text) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                {
                    self.content.push_str(&text);
                }
            }
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, "skipping unparseable stream chunk");
            }
        }
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Finish decoding and return the trimmed reply.
    pub fn finish(mut self) -> Result<String, GeneratorError> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.handle_line(&String::from_utf8_lossy(&rest));
        }

        let text = self.content.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
        if self.skipped > 0 {
            return Err(GeneratorError::MalformedStream(format!(
                "{} chunk(s) could not be parsed",
                self.skipped
            )));
        }
        Err(GeneratorError::EmptyResponse)
    }
}

/// Pick the model to use from the ids a provider lists.
///
/// The configured model wins when listed; otherwise the first id that looks
/// like a general chat model, otherwise the first id at all.
pub fn choose_model(configured: &str, available: &[String]) -> String {
    if available.iter().any(|id| id == configured) {
        return configured.to_string();
    }

    available
        .iter()
        .find(|id| {
            let lower = id.to_lowercase();
            FALLBACK_MODEL_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .or_else(|| available.first())
        .cloned()
        .unwrap_or_else(|| configured.to_string())
}

/// Streaming chat-completions client.
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    auto_select_model: bool,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
    /// Model chosen from the provider listing, resolved on first use
    resolved_model: OnceCell<String>,
}

impl ChatClient {
    /// Create a client, reading the API key from the configured variable.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| GeneratorError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(config: &GeneratorConfig, api_key: String) -> Result<Self, GeneratorError> {
        let mut builder =
            Client::builder().user_agent(concat!("codexplain/", env!("CARGO_PKG_VERSION")));
        if config.bypass_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            auto_select_model: config.auto_select_model,
            timeout: Duration::from_millis(config.timeout_ms),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            resolved_model: OnceCell::new(),
        })
    }

    /// The model for chat requests.
    ///
    /// Only a successful listing is cached. When listing fails the
    /// configured model is used for this request and the next one lists
    /// again.
    async fn model(&self) -> &str {
        if !self.auto_select_model {
            return &self.model;
        }

        let listed = self
            .resolved_model
            .get_or_try_init(|| async {
                let ids = self.list_models().await?;
                let chosen = choose_model(&self.model, &ids);
                if chosen != self.model {
                    info!(configured = %self.model, chosen = %chosen, "configured model not listed");
                }
                Ok::<_, GeneratorError>(chosen)
            })
            .await;

        match listed {
            Ok(model) => model,
            Err(e) => {
                warn!(error = %e, model = %self.model, "could not list models; using configured model");
                &self.model
            }
        }
    }

    fn chat_request<'a>(&self, model: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }

    /// Ids of the models the provider offers.
    async fn list_models(&self) -> Result<Vec<String>, GeneratorError> {
        let response = self
            .http
            .get(format!("{}/models", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(GeneratorError::from_request)?;

        let response = check_status(response).await?;
        let list: ModelList = response.json().await.map_err(GeneratorError::from_request)?;
        debug!(count = list.data.len(), "listed models");

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// Map non-success statuses to errors.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeneratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        return Err(GeneratorError::RateLimited);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(GeneratorError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Generator for ChatClient {
    fn name(&self) -> &str {
        "chat-completions"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let model = self.model().await;
        let user = user_message(prompt);
        let request = self.chat_request(model, &user);

        debug!(model, prompt_chars = prompt.len(), "sending chat request");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(GeneratorError::from_request)?;
        let response = check_status(response).await?;

        let mut stream = response.bytes_stream();
        let mut decoder = StreamDecoder::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GeneratorError::from_request)?;
            if decoder.feed(&chunk) {
                break;
            }
        }

        let reply = decoder.finish()?;
        debug!(chars = reply.len(), "chat reply received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answer one connection per `(status, body)` pair, in order, on a local
    /// port. Returns the endpoint base URL.
    fn serve_once_each(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let reason = if status == 200 { "OK" } else { "Service Unavailable" };
                let reply = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes());
            }
        });

        format!("http://{}/v1", addr)
    }

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_decoder_concatenates_deltas() {
        let mut decoder = StreamDecoder::new();
        assert!(!decoder.feed(chunk("Hello").as_bytes()));
        assert!(!decoder.feed(chunk(", world").as_bytes()));
        assert!(decoder.feed(b"data: [DONE]\n\n"));
        assert_eq!(decoder.finish().unwrap(), "Hello, world");
    }

    #[test]
    fn test_decoder_stops_at_done() {
        let mut decoder = StreamDecoder::new();
        let body = format!("{}data: [DONE]\n\n{}", chunk("kept"), chunk("ignored"));
        assert!(decoder.feed(body.as_bytes()));
        assert!(decoder.feed(chunk("late").as_bytes()));
        assert_eq!(decoder.content(), "kept");
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let body = chunk("naïve split");
        let bytes = body.as_bytes();
        // split inside the multi-byte character
        let cut = body.find('ï').unwrap() + 1;

        let mut decoder = StreamDecoder::new();
        decoder.feed(&bytes[..cut]);
        assert_eq!(decoder.content(), "");
        decoder.feed(&bytes[cut..]);
        assert_eq!(decoder.content(), "naïve split");
    }

    #[test]
    fn test_decoder_skips_noise() {
        let mut decoder = StreamDecoder::new();
        let body = format!(
            ": keep-alive\nevent: message\ndata: {{not json\ndata: {{\"choices\": []}}\n{}",
            chunk("ok")
        );
        decoder.feed(body.as_bytes());
        assert_eq!(decoder.finish().unwrap(), "ok");
    }

    #[test]
    fn test_decoder_trailing_line_without_newline() {
        let mut decoder = StreamDecoder::new();
        let body = chunk("tail");
        decoder.feed(body.trim_end().as_bytes());
        assert_eq!(decoder.finish().unwrap(), "tail");
    }

    #[test]
    fn test_decoder_empty_and_malformed() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(b"data: [DONE]\n");
        assert!(matches!(decoder.finish(), Err(GeneratorError::EmptyResponse)));

        let mut decoder = StreamDecoder::new();
        decoder.feed(b"data: <html>oops</html>\n");
        assert!(matches!(
            decoder.finish(),
            Err(GeneratorError::MalformedStream(_))
        ));

        let mut decoder = StreamDecoder::new();
        decoder.feed(chunk("   ").as_bytes());
        assert!(matches!(decoder.finish(), Err(GeneratorError::EmptyResponse)));
    }

    #[test]
    fn test_choose_model() {
        let ids = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(
            choose_model("compound-beta", &ids(&["whisper", "compound-beta"])),
            "compound-beta"
        );
        assert_eq!(
            choose_model("compound-beta", &ids(&["whisper-large", "Llama-3.1-8b", "gemma2"])),
            "Llama-3.1-8b"
        );
        assert_eq!(
            choose_model("compound-beta", &ids(&["whisper-large", "distil"])),
            "whisper-large"
        );
        assert_eq!(choose_model("compound-beta", &[]), "compound-beta");
    }

    #[test]
    fn test_client_from_config() {
        let config = GeneratorConfig {
            endpoint: "http://localhost:9/v1/".to_string(),
            ..Default::default()
        };
        let client = ChatClient::new(&config, "key".to_string()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9/v1");
        assert_eq!(client.name(), "chat-completions");
        assert_eq!(client.timeout, Duration::from_millis(30_000));

        let config = GeneratorConfig {
            api_key_env: "CODEXPLAIN_TEST_NO_SUCH_KEY_77A".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ChatClient::from_config(&config),
            Err(GeneratorError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_chat_request_body() {
        let client = ChatClient::new(&GeneratorConfig::default(), "key".to_string()).unwrap();
        let user = user_message("Analyze this c code");
        let body = serde_json::to_value(client.chat_request("compound-beta", &user)).unwrap();

        assert_eq!(body["model"], "compound-beta");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        let content = body["messages"][1]["content"].as_str().unwrap();
        assert!(content.starts_with("Explain this code step by step"));
        assert!(content.ends_with("```\nAnalyze this c code\n```"));
    }

    #[tokio::test]
    async fn test_unreachable_models_endpoint_falls_back_to_configured() {
        let config = GeneratorConfig {
            endpoint: "http://127.0.0.1:9/v1".to_string(),
            timeout_ms: 500,
            ..Default::default()
        };
        let client = ChatClient::new(&config, "key".to_string()).unwrap();
        assert_eq!(client.model().await, "compound-beta");
    }

    #[tokio::test]
    async fn test_failed_model_listing_is_not_cached() {
        let endpoint = serve_once_each(vec![
            (503, r#"{"error": "busy"}"#),
            (200, r#"{"data": [{"id": "whisper-large"}, {"id": "llama-3.1-8b"}]}"#),
        ]);
        let config = GeneratorConfig {
            endpoint,
            timeout_ms: 5_000,
            ..Default::default()
        };
        let client = ChatClient::new(&config, "key".to_string()).unwrap();

        assert_eq!(client.model().await, "compound-beta");
        assert_eq!(client.model().await, "llama-3.1-8b");
        // cached now; the listener has no responses left
        assert_eq!(client.model().await, "llama-3.1-8b");
    }
}
