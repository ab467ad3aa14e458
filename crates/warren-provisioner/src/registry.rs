use std::collections::HashMap;
use std::sync::Arc;

use warren_client::ManagementApi;

use crate::error::ProvisionerError;
use crate::kinds::{Binding, Exchange, Permissions, Policy, Queue, ResourceKind, User, Vhost};
use crate::reconciler::{Reconciler, ResourceHandler};

/// One handler per resource kind, resolved by kind or kind name.
///
/// Built once at startup. Every handler shares the same client.
pub struct Registry {
    handlers: HashMap<ResourceKind, Box<dyn ResourceHandler>>,
}

impl Registry {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        let handlers: Vec<Box<dyn ResourceHandler>> = vec![
            Box::new(Reconciler::<Vhost>::new(api.clone())),
            Box::new(Reconciler::<User>::new(api.clone())),
            Box::new(Reconciler::<Permissions>::new(api.clone())),
            Box::new(Reconciler::<Exchange>::new(api.clone())),
            Box::new(Reconciler::<Queue>::new(api.clone())),
            Box::new(Reconciler::<Binding>::new(api.clone())),
            Box::new(Reconciler::<Policy>::new(api)),
        ];

        Self {
            handlers: handlers.into_iter().map(|h| (h.kind(), h)).collect(),
        }
    }

    pub fn handler(&self, kind: ResourceKind) -> Result<&dyn ResourceHandler, ProvisionerError> {
        self.handlers
            .get(&kind)
            .map(|h| h.as_ref())
            .ok_or_else(|| ProvisionerError::UnknownKind(kind.to_string()))
    }

    /// Look a handler up by name, e.g. `"user"` or `"rabbitmq_user"`.
    pub fn resolve(&self, name: &str) -> Result<&dyn ResourceHandler, ProvisionerError> {
        self.handler(name.parse()?)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.handlers.keys().copied()
    }
}
