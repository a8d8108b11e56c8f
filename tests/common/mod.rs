#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use warp::http::{Response, StatusCode};
use warp::Filter;

use weather_agent::llm::{ContentBlock, GenerateRequest, GenerateResponse, LlmError, LlmProvider};

/// A canned HTTP response served by the mock servers
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::raw(status, body.to_string())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn into_reply(self) -> Response<String> {
        let mut builder = Response::builder()
            .status(StatusCode::from_u16(self.status).unwrap())
            .header("content-type", "application/json");
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder.body(self.body).unwrap()
    }
}

/// One request seen by a mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Last path segment, e.g. `current.json` or `gemini-2.0-flash:generateContent`
    pub path: String,
    pub query: HashMap<String, String>,
    pub api_key_header: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// A running mock server; responses are served in order and the last one repeats
pub struct MockServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn url(&self, base_path: &str) -> String {
        format!("http://{}/{}", self.addr, base_path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn next_response(queue: &Mutex<VecDeque<MockResponse>>) -> MockResponse {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front().unwrap()
    } else {
        queue.front().cloned().unwrap()
    }
}

/// Mock weather provider answering `GET /v1/<file>?...`
pub fn spawn_weather_server(responses: Vec<MockResponse>) -> MockServer {
    assert!(!responses.is_empty());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

    let recorded = Arc::clone(&requests);
    let route = warp::get()
        .and(warp::path("v1"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::query::<HashMap<String, String>>())
        .and_then(move |path: String, query: HashMap<String, String>| {
            let recorded = Arc::clone(&recorded);
            let queue = Arc::clone(&queue);
            async move {
                recorded.lock().unwrap().push(RecordedRequest {
                    path,
                    query,
                    api_key_header: None,
                    body: None,
                });
                let response = next_response(&queue);
                tokio::time::sleep(response.delay).await;
                Ok::<_, warp::Rejection>(response.into_reply())
            }
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    MockServer { addr, requests }
}

/// Mock Gemini API answering `POST /v1beta/models/<model>:generateContent`
pub fn spawn_gemini_server(responses: Vec<MockResponse>) -> MockServer {
    assert!(!responses.is_empty());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

    let recorded = Arc::clone(&requests);
    let route = warp::post()
        .and(warp::path("v1beta"))
        .and(warp::path("models"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::header::optional::<String>("x-goog-api-key"))
        .and(warp::body::json::<serde_json::Value>())
        .and_then(
            move |path: String, api_key: Option<String>, body: serde_json::Value| {
                let recorded = Arc::clone(&recorded);
                let queue = Arc::clone(&queue);
                async move {
                    recorded.lock().unwrap().push(RecordedRequest {
                        path,
                        query: HashMap::new(),
                        api_key_header: api_key,
                        body: Some(body),
                    });
                    let response = next_response(&queue);
                    tokio::time::sleep(response.delay).await;
                    Ok::<_, warp::Rejection>(response.into_reply())
                }
            },
        );

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    MockServer { addr, requests }
}

/// An address nothing is listening on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

/// Gemini response body carrying one function call
pub fn gemini_function_call(name: &str, args: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"functionCall": {"name": name, "args": args}}]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 8, "totalTokenCount": 48}
    })
}

/// Gemini response body carrying plain text
pub fn gemini_text(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17}
    })
}

/// Trimmed-down weather provider payload
pub fn current_weather_payload(location: &str) -> serde_json::Value {
    serde_json::json!({
        "location": {"name": location, "country": "France", "localtime": "2025-06-01 14:00"},
        "current": {
            "temp_c": 21.0,
            "condition": {"text": "Partly cloudy"},
            "wind_kph": 11.2,
            "humidity": 48
        }
    })
}

/// LLM provider that replays scripted turns and records every request
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<GenerateResponse, LlmError>>>,
    pub requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Result<GenerateResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the recorded requests that outlives boxing the provider
    pub fn requests_handle(&self) -> Arc<Mutex<Vec<GenerateRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidRequest("No scripted response left".to_string())))
    }
}

pub fn text_turn(text: &str) -> Result<GenerateResponse, LlmError> {
    Ok(GenerateResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        ..Default::default()
    })
}

pub fn call_turn(name: &str, input: serde_json::Value) -> Result<GenerateResponse, LlmError> {
    Ok(GenerateResponse {
        content: vec![ContentBlock::ToolUse {
            id: format!("call-{}", name),
            name: name.to_string(),
            input,
            signature: None,
        }],
        ..Default::default()
    })
}

/// Captures formatted `tracing` output for assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_helpers_have_one_candidate() {
        assert_eq!(gemini_text("hi")["candidates"].as_array().unwrap().len(), 1);
        assert_eq!(
            gemini_function_call("f", serde_json::json!({}))["candidates"][0]["content"]["parts"][0]
                ["functionCall"]["name"],
            "f"
        );
    }
}
