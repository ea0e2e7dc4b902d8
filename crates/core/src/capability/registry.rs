use std::collections::HashMap;
use std::pin::Pin;

use turnloop_model::{CapabilityDecl, InvocationRequest};

use crate::capability::{
    AnyCapability, Capability, CapabilityObject, CapabilityResult,
};

/// An object that manages the set of capabilities exposed to the model
/// and dispatches invocation requests to them.
#[derive(Default)]
pub struct Registry {
    capabilities: HashMap<String, Box<dyn CapabilityObject>>,
}

impl Registry {
    /// Registers a capability.
    ///
    /// Registering a capability with a name that is already present
    /// replaces the earlier one.
    pub fn add<T: Capability>(&mut self, capability: T) {
        let name = capability.name().to_owned();
        self.capabilities
            .insert(name, Box::new(AnyCapability(capability)));
    }

    /// Returns the declarations of all registered capabilities, for
    /// inclusion in a model request.
    #[inline]
    pub fn declarations(&self) -> Vec<CapabilityDecl> {
        self.capabilities
            .values()
            .map(|capability| CapabilityDecl {
                name: capability.name().to_owned(),
                description: capability.description().to_owned(),
                parameters: capability.parameter_schema().clone(),
            })
            .collect()
    }

    /// Dispatches an invocation request to the matching capability.
    ///
    /// Returns `None` when no capability with the requested name is
    /// registered; converting that into a fail-soft result is the
    /// caller's concern.
    pub fn dispatch(
        &self,
        req: &InvocationRequest,
    ) -> Option<Pin<Box<dyn Future<Output = CapabilityResult> + Send>>> {
        let Some(capability) = self.capabilities.get(&req.capability) else {
            warn!("capability not found: {}", req.capability);
            return None;
        };
        trace!(
            "dispatching an invocation ({}) with args: {:?}",
            req.id, req.arguments
        );
        Some(capability.execute(req.arguments.clone()))
    }
}
