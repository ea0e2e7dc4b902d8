//! A simple program demonstrates how to drive a `Chat` end to end,
//! using the scripted test provider in place of a real model backend.
//!
//! Run with `RUST_LOG=debug` to see the turn loop at work.

use std::io::Write as _;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};
use turnloop::ChatBuilder;
use turnloop::core::capability::{Capability, CapabilityResult};
use turnloop::model::InvocationRequest;
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

fn scripted_provider() -> ScriptedProvider {
    let provider = ScriptedProvider::default();
    provider.push_response(ScriptedResponse::text(
        "Hi Nemo! How can I assist you today?",
    ));
    provider.push_response(ScriptedResponse::with_events([
        ScriptEvent::ContentDelta("Let me check.".to_owned()),
        ScriptEvent::Invocation(InvocationRequest {
            id: "inv:1".to_owned(),
            capability: "get_current_weather".to_owned(),
            arguments: json!({ "location": "San Francisco, CA" }),
        }),
    ]));
    provider.push_response(ScriptedResponse::text(
        "It's sunny and 18°C in San Francisco right now.",
    ));
    provider
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let chat = ChatBuilder::with_model_provider(scripted_provider())
        .with_system_prompt("You are a helpful assistant.")
        .with_capability(WeatherCapability::new())
        .on_delta(|chunk| {
            print!("{chunk}");
            std::io::stdout().flush().ok();
        })
        .build();

    for input in ["I'm Nemo!", "What's the weather in SF?"] {
        println!("> {input}");
        match chat.send_message("demo", input).await {
            Ok(_) => println!(),
            Err(err) => {
                eprintln!("turn failed: {err}");
                return;
            }
        }
    }

    let history = chat.history("demo").await.unwrap();
    println!("({} messages in the session)", history.len());
}
