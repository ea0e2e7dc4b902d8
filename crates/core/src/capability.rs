//! Capability invocation supports.

mod error;
mod registry;

use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use registry::Registry;

/// The result of invoking a capability.
pub type CapabilityResult = Result<String, Error>;

/// A named external operation that can be invoked by the model.
///
/// Implementations of this trait should be stateless, and may not maintain
/// any internal state. Ownership of any side effects belongs to the
/// capability's own implementation.
///
/// The capability can be context-aware, meaning it can access additional
/// information about the current execution context, such as the working
/// directory or the current user. To do this, make the context an immutable
/// state of the capability, which can be set during initialization, and
/// copy it when executing.
pub trait Capability: Send + Sync + 'static {
    /// The type of input that the capability accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the capability.
    fn name(&self) -> &str;

    /// Returns the description of the capability.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the capability.
    fn parameter_schema(&self) -> &Value;

    /// Invokes the capability with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = CapabilityResult> + Send + 'static;
}

pub(crate) trait CapabilityObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = CapabilityResult> + Send>>;
}

pub(crate) struct AnyCapability<T: Capability>(pub T);

impl<T: Capability> CapabilityObject for AnyCapability<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = CapabilityResult> + Send>> {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(CapabilityResult::Err(
                    Error::invalid_arguments().with_reason(reason),
                )));
            }
        };
        Box::pin(self.0.execute(input))
    }
}
