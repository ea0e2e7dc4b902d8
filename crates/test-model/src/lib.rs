//! A local scripted model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use turnloop_model::{
    ErrorKind, FinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct ScriptedModelResponse {
    events: VecDeque<ScriptEvent>,
    finish_reason: Option<FinishReason>,
    sleep: Option<Pin<Box<Sleep>>>,
    delay: Duration,
}

impl ScriptedModelResponse {
    fn new(response: ScriptedResponse, delay: Duration) -> Self {
        let has_invocation = response
            .events
            .iter()
            .any(|event| matches!(event, ScriptEvent::Invocation(_)));
        Self {
            events: response.events.into(),
            finish_reason: Some(if has_invocation {
                FinishReason::Invocations
            } else {
                FinishReason::Stop
            }),
            sleep: None,
            delay,
        }
    }
}

impl ModelResponse for ScriptedModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(event) = this.events.pop_front() {
                let event = match event {
                    ScriptEvent::ContentDelta(chunk) => {
                        ModelResponseEvent::ContentDelta(chunk)
                    }
                    ScriptEvent::Invocation(req) => {
                        ModelResponseEvent::Invocation(req)
                    }
                };
                return Poll::Ready(Ok(Some(event)));
            }
            if let Some(reason) = this.finish_reason.take() {
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    reason,
                ))));
            }
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

enum ScriptStep {
    Respond(ScriptedResponse),
    Fail(ErrorKind),
}

/// A local scripted model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the model should respond to requests. Steps are consumed in order,
/// one per request. When the script runs out, a looping response is
/// replayed if one has been set, and otherwise an `Unavailable` error
/// is returned.
///
/// The provider is cheaply cloneable and all clones share the same
/// script and call counter, so a test can keep a handle for assertions
/// after handing the provider off.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    steps: Arc<Mutex<VecDeque<ScriptStep>>>,
    loop_response: Arc<Mutex<Option<ScriptedResponse>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Appends a scripted response to the script.
    pub fn push_response(&self, response: ScriptedResponse) {
        self.steps
            .lock()
            .unwrap()
            .push_back(ScriptStep::Respond(response));
    }

    /// Appends a failing step to the script.
    pub fn push_failure(&self, kind: ErrorKind) {
        self.steps.lock().unwrap().push_back(ScriptStep::Fail(kind));
    }

    /// Sets a response that is replayed for every request once the
    /// script has been consumed.
    pub fn set_loop_response(&self, response: ScriptedResponse) {
        *self.loop_response.lock().unwrap() = Some(response);
    }

    /// Sets the pacing delay between response events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the number of requests this provider has received.
    #[inline]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ModelProvider for ScriptedProvider {
    type Error = crate::Error;
    type Response = ScriptedModelResponse;

    fn send_request(
        &self,
        _req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let step = self.steps.lock().unwrap().pop_front();
        let step = match step {
            Some(step) => step,
            None => match self.loop_response.lock().unwrap().clone() {
                Some(response) => ScriptStep::Respond(response),
                None => ScriptStep::Fail(ErrorKind::Unavailable),
            },
        };

        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        let result = match step {
            ScriptStep::Respond(response) => {
                Ok(ScriptedModelResponse::new(response, delay))
            }
            ScriptStep::Fail(kind) => Err(Error {
                message: "scripted failure",
                kind,
            }),
        };
        ready(result)
    }
}
