use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
///
/// The [`ErrorKind`] a provider reports decides how a failing turn is
/// surfaced to the caller: `Unavailable` and `Other` mean the provider
/// could not serve the request, `Rejected` means it refused to.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A chat-model backend that the turn executor samples from.
///
/// A provider receives the full conversation so far plus the declared
/// capabilities, and produces one assistant response, streamed as
/// events. Whether that response is plain text or requests capability
/// invocations is entirely the model's decision; the provider just
/// relays it.
///
/// Once the provider is created, it should behave like a stateless
/// object. It can still have internal state (connections, caches), but
/// callers should not rely on it, and the provider should be prepared
/// for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Samples the model once for the next assistant message.
    ///
    /// The returned future must not borrow from `self`; the executor
    /// may still be draining the response after the request future has
    /// been dropped.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
