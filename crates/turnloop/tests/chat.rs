use std::time::Duration;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::Instant;
use turnloop::core::capability::{Capability, CapabilityResult};
use turnloop::core::{TurnError, session::MemoryStore};
use turnloop::model::{ErrorKind, InvocationRequest, ModelMessage};
use turnloop::{Chat, ChatBuilder, ChatError};
use turnloop_test_model::{ScriptEvent, ScriptedProvider, ScriptedResponse};

#[derive(Deserialize, JsonSchema)]
struct WeatherParameters {
    #[schemars(description = "City and state, e.g. `San Francisco, CA`.")]
    location: String,
}

struct WeatherCapability {
    parameter_schema: Value,
}

impl WeatherCapability {
    fn new() -> Self {
        Self {
            parameter_schema: schema_for!(WeatherParameters).to_value(),
        }
    }
}

impl Capability for WeatherCapability {
    type Input = WeatherParameters;

    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Returns the current weather for a location"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WeatherParameters,
    ) -> impl Future<Output = CapabilityResult> + Send + 'static {
        std::future::ready(Ok(format!("Sunny and 18°C in {}", input.location)))
    }
}

fn chat_with(provider: ScriptedProvider) -> Chat {
    ChatBuilder::with_model_provider(provider)
        .with_capability(WeatherCapability::new())
        .with_session_store(MemoryStore::new())
        .build()
}

#[tokio::test]
async fn test_plain_turn_persists_two_messages() {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::text(
        "How can I assist you today?",
    ));

    let chat = chat_with(provider);
    let outcome = chat.send_message("s1", "I'm Nemo!").await.unwrap();
    assert_eq!(outcome.response, "How can I assist you today?");

    let history = chat.history("s1").await.unwrap();
    assert_eq!(history.len(), 2);
    let ModelMessage::User { content } = &history.messages()[0] else {
        panic!("expected the user message first");
    };
    assert_eq!(content, "I'm Nemo!");
    let ModelMessage::Assistant(assistant) = &history.messages()[1] else {
        panic!("expected the assistant message second");
    };
    assert_eq!(assistant.content, "How can I assist you today?");
}

#[tokio::test]
async fn test_weather_turn_appends_four_messages() {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::with_events([
        ScriptEvent::Invocation(InvocationRequest {
            id: "inv:1".to_owned(),
            capability: "get_current_weather".to_owned(),
            arguments: json!({ "location": "San Francisco, CA" }),
        }),
    ]));
    provider.push_response(ScriptedResponse::text(
        "It's sunny and 18°C in San Francisco.",
    ));

    let chat = chat_with(provider);
    let outcome = chat
        .send_message("s1", "What's the weather in SF?")
        .await
        .unwrap();
    assert_eq!(outcome.messages.len(), 4);

    let history = chat.history("s1").await.unwrap();
    assert_eq!(history.len(), 4);
    let ModelMessage::CapabilityResult(result) = &history.messages()[2] else {
        panic!("expected a capability result");
    };
    assert_eq!(result.responds_to, "inv:1");
    assert_eq!(result.content, "Sunny and 18°C in San Francisco, CA");
    assert!(history.unresolved_invocations().is_empty());
}

#[tokio::test]
async fn test_history_accumulates_across_turns() {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::text("Hi, Nemo!"));
    provider.push_response(ScriptedResponse::text("You told me: Nemo."));

    let chat = chat_with(provider);
    chat.send_message("s1", "I'm Nemo!").await.unwrap();
    chat.send_message("s1", "What's my name?").await.unwrap();

    let history = chat.history("s1").await.unwrap();
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::text("Hello s1"));
    provider.push_response(ScriptedResponse::text("Hello s2"));

    let chat = chat_with(provider);
    chat.send_message("s1", "Hi from s1").await.unwrap();
    chat.send_message("s2", "Hi from s2").await.unwrap();

    assert_eq!(chat.history("s1").await.unwrap().len(), 2);
    assert_eq!(chat.history("s2").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_turn_appends_nothing() {
    let provider = ScriptedProvider::default();
    provider.push_failure(ErrorKind::Unavailable);

    let chat = chat_with(provider);
    let err = chat.send_message("s1", "Hi").await.unwrap_err();
    assert!(matches!(
        err,
        ChatError::Turn(TurnError::ModelUnavailable { .. })
    ));
    assert!(chat.history("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_execution_limit_appends_nothing() {
    let provider = ScriptedProvider::default();
    provider.set_loop_response(ScriptedResponse::with_events([
        ScriptEvent::Invocation(InvocationRequest {
            id: "inv:n".to_owned(),
            capability: "get_current_weather".to_owned(),
            arguments: json!({ "location": "SF" }),
        }),
    ]));

    let chat = ChatBuilder::with_model_provider(provider)
        .with_capability(WeatherCapability::new())
        .max_steps(2)
        .build();
    let err = chat.send_message("s1", "Loop forever").await.unwrap_err();
    let ChatError::Turn(TurnError::ExecutionLimitExceeded {
        messages,
        model_calls,
    }) = err
    else {
        panic!("expected ExecutionLimitExceeded, got: {err}");
    };
    assert_eq!(model_calls, 2);
    // The partial conversation is returned for inspection, but the
    // session itself stays untouched.
    assert!(!messages.is_empty());
    assert!(chat.history("s1").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_turn_appends_nothing() {
    let mut provider = ScriptedProvider::default();
    provider.set_delay(Duration::from_secs(60));
    provider.push_response(ScriptedResponse::text("Too late"));

    let chat = chat_with(provider);
    let err = chat
        .send_message_with_deadline(
            "s1",
            "Hi",
            Some(Instant::now() + Duration::from_secs(1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Turn(TurnError::Cancelled { .. })));
    assert!(chat.history("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_arguments_fail_soft() {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::with_events([
        ScriptEvent::Invocation(InvocationRequest {
            id: "inv:1".to_owned(),
            capability: "get_current_weather".to_owned(),
            // `location` is required by the schema.
            arguments: json!({ "city": "SF" }),
        }),
    ]));
    provider.push_response(ScriptedResponse::text("Let me try again."));

    let chat = chat_with(provider);
    let outcome = chat.send_message("s1", "Weather?").await.unwrap();
    let ModelMessage::CapabilityResult(result) = &outcome.messages[2] else {
        panic!("expected a capability result");
    };
    assert!(result.content.starts_with("Error:"));
    assert_eq!(outcome.response, "Let me try again.");
}
