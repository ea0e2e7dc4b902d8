//! Implements a minimal provider against the crate's traits, to verify
//! the contract is expressible without any supporting machinery.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use turnloop_model::{
    ErrorKind, FinishReason, InvocationRequest, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the latest user message word by word. When a capability named
/// `echo` is declared, it requests an invocation of it instead.
struct EchoProvider;

#[derive(Debug)]
struct EchoResponse {
    events: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn for_request(req: &ModelRequest) -> Result<Self, EchoError> {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User { content } => Some(content.as_str()),
            _ => None,
        });
        let Some(input) = last_user else {
            return Err(EchoError(ErrorKind::Other));
        };

        let mut events = VecDeque::new();
        let wants_echo = req
            .capabilities
            .iter()
            .any(|capability| capability.name == "echo");
        if wants_echo {
            events.push_back(ModelResponseEvent::Invocation(
                InvocationRequest {
                    id: "inv:echo".to_owned(),
                    capability: "echo".to_owned(),
                    arguments: serde_json::json!({ "text": input }),
                },
            ));
            events.push_back(ModelResponseEvent::Completed(
                FinishReason::Invocations,
            ));
        } else {
            let words: Vec<_> = input.split(' ').collect();
            for (idx, word) in words.iter().enumerate() {
                let chunk = if idx + 1 < words.len() {
                    format!("{word} ")
                } else {
                    (*word).to_owned()
                };
                events.push_back(ModelResponseEvent::ContentDelta(chunk));
            }
            events
                .push_back(ModelResponseEvent::Completed(FinishReason::Stop));
        }
        Ok(Self {
            events,
            sleep: None,
        })
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.events.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(EchoResponse::for_request(req))
    }
}

async fn drain(
    mut resp: EchoResponse,
) -> (String, Vec<InvocationRequest>, Option<FinishReason>) {
    let mut content = String::new();
    let mut invocations = Vec::new();
    let mut finish_reason = None;
    loop {
        let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap();
        match event {
            Some(ModelResponseEvent::ContentDelta(delta)) => {
                content.push_str(&delta);
            }
            Some(ModelResponseEvent::Invocation(req)) => {
                invocations.push(req);
            }
            Some(ModelResponseEvent::Completed(reason)) => {
                finish_reason = Some(reason);
            }
            None => break,
        }
    }
    (content, invocations, finish_reason)
}

#[tokio::test]
async fn test_plain_completion() {
    let req = ModelRequest {
        messages: vec![
            ModelMessage::system("Echo things."),
            ModelMessage::user("Good morning"),
        ],
        capabilities: vec![],
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();

    let (content, invocations, finish_reason) = drain(resp).await;
    assert_eq!(content, "Good morning");
    assert!(invocations.is_empty());
    assert_eq!(finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn test_invocation_request() {
    let req = ModelRequest {
        messages: vec![ModelMessage::user("Good morning")],
        capabilities: vec![turnloop_model::CapabilityDecl {
            name: "echo".to_owned(),
            description: "Echoes text".to_owned(),
            parameters: serde_json::Value::Null,
        }],
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();

    let (content, invocations, finish_reason) = drain(resp).await;
    assert!(content.is_empty());
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].capability, "echo");
    assert_eq!(finish_reason, Some(FinishReason::Invocations));
}

#[tokio::test]
async fn test_error_without_user_message() {
    let req = ModelRequest {
        messages: vec![],
        capabilities: vec![],
    };
    let err = EchoProvider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}
