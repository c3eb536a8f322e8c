//! Streaming dispatch: per-chunk envelopes plus a terminal envelope with
//! the reconstructed message and metrics.

use futures::StreamExt;
use polyglot_dispatch::core::catalog::{ModelCatalog, ModelConfig, ProviderConfig, TokenCost};
use polyglot_dispatch::core::engine::EnvelopeOrStream;
use polyglot_dispatch::core::providers::openai::{OpenAiConfig, OpenAiProvider};
use polyglot_dispatch::core::providers::ProviderRegistry;
use polyglot_dispatch::{ChatInput, ChatRequest, Engine};
use reqwest::Client;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(base_url: String) -> Engine {
    let catalog = ModelCatalog::new(
        vec![ModelConfig {
            model_id: "gpt-4o".into(),
            provider: "openai".into(),
            deployment: None,
            cost: TokenCost::Flat { input_per_million: 5.0, output_per_million: 15.0 },
            max_context_tokens: 128_000,
            supports_tools: true,
        }],
        vec![ProviderConfig {
            provider_id: "openai".into(),
            base_url: base_url.clone(),
            api_key_env: "OPENAI_API_KEY".into(),
        }],
    );
    let provider = OpenAiProvider::new(Client::new(), OpenAiConfig::new("test-key", base_url));
    let registry = Arc::new(ProviderRegistry::new(vec![Arc::new(provider)]));
    Engine::new(catalog, registry)
}

fn sse_event(delta_json: &str, finish_reason: Option<&str>) -> String {
    let finish = finish_reason.map(|f| format!("\"{f}\"")).unwrap_or_else(|| "null".into());
    format!(
        "data: {{\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"created\":1,\"model\":\"gpt-4o\",\"choices\":[{{\"index\":0,\"delta\":{delta_json},\"finish_reason\":{finish}}}]}}\n\n"
    )
}

#[tokio::test]
async fn stream_reconstructs_text_and_emits_terminal_metrics() {
    let server = MockServer::start().await;

    let mut body = String::new();
    body.push_str(&sse_event(r#"{"role":"assistant","content":""}"#, None));
    body.push_str(&sse_event(r#"{"content":"Hello"}"#, None));
    body.push_str(&sse_event(r#"{"content":", world"}"#, None));
    body.push_str(&sse_event("{}", Some("stop")));
    body.push_str("data: [DONE]\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let engine = engine(server.uri());
    let mut request = ChatRequest::new("gpt-4o", ChatInput::Text("hi".into()));
    request.is_stream = true;

    let result = engine.achat(request).await.unwrap();
    let mut stream = match result {
        EnvelopeOrStream::Stream(s) => s,
        EnvelopeOrStream::Single(_) => panic!("expected a stream"),
    };

    let mut envelopes = Vec::new();
    while let Some(next) = stream.next().await {
        envelopes.push(next.unwrap());
    }

    let terminal = envelopes.last().expect("at least one envelope");
    assert!(terminal.metrics.is_some());
    let message = &terminal.choices[0].message;
    assert_eq!(message.content.as_deref(), Some("Hello, world"));
    assert_eq!(terminal.choices[0].finish_reason.as_deref(), Some("stop"));

    for envelope in &envelopes[..envelopes.len() - 1] {
        assert!(envelope.metrics.is_none());
    }
}

#[tokio::test]
async fn stream_reconstructs_tool_call_arguments_across_chunks() {
    let server = MockServer::start().await;

    let mut body = String::new();
    body.push_str(&sse_event(
        r#"{"role":"assistant","tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"get_weather","arguments":""}}]}"#,
        None,
    ));
    body.push_str(&sse_event(
        r#"{"tool_calls":[{"index":0,"function":{"arguments":"{\"city\""}}]}"#,
        None,
    ));
    body.push_str(&sse_event(
        r#"{"tool_calls":[{"index":0,"function":{"arguments":":\"Boston\"}"}}]}"#,
        None,
    ));
    body.push_str(&sse_event("{}", Some("tool_calls")));
    body.push_str("data: [DONE]\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let engine = engine(server.uri());
    let mut request = ChatRequest::new("gpt-4o", ChatInput::Text("weather in Boston?".into()));
    request.is_stream = true;

    let result = engine.achat(request).await.unwrap();
    let mut stream = match result {
        EnvelopeOrStream::Stream(s) => s,
        EnvelopeOrStream::Single(_) => panic!("expected a stream"),
    };

    let mut last = None;
    while let Some(next) = stream.next().await {
        last = Some(next.unwrap());
    }

    let terminal = last.expect("at least one envelope");
    let tool_calls = terminal.choices[0]
        .message
        .tool_calls
        .as_ref()
        .expect("reconstructed tool call");
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].function.name, "get_weather");
    assert_eq!(tool_calls[0].function.arguments, "{\"city\":\"Boston\"}");
}
