use std::marker::PhantomData;
use std::sync::Arc;

use warren_client::{BoxFuture, ManagementApi};

use crate::error::ProvisionerError;
use crate::kinds::{KindSpec, OnExisting, ResourceKind};
use crate::schema::{Attributes, Schema};

/// Result of a resource create.
#[derive(Debug, Clone)]
pub struct ResourceResult {
    pub id: String,
    pub observed: Attributes,
}

/// The four-operation contract every resource kind satisfies.
///
/// Methods return boxed futures for dyn compatibility, so the registry can
/// hold one `Box<dyn ResourceHandler>` per kind.
pub trait ResourceHandler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn schema(&self) -> &Schema;

    /// Create the remote object and confirm it with a read.
    fn create<'a>(
        &'a self,
        declared: &'a Attributes,
    ) -> BoxFuture<'a, Result<ResourceResult, ProvisionerError>>;

    /// Current remote state, normalized. `None` = the object is gone.
    fn read<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Attributes>, ProvisionerError>>;

    /// Apply a new declaration in place. `prior` is the last applied
    /// declaration; any force-new change against it is rejected.
    fn update<'a>(
        &'a self,
        id: &'a str,
        prior: &'a Attributes,
        declared: &'a Attributes,
    ) -> BoxFuture<'a, Result<Attributes, ProvisionerError>>;

    /// Delete the remote object. Already absent counts as success.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ProvisionerError>>;
}

/// [`ResourceHandler`] for any [`KindSpec`].
pub struct Reconciler<K> {
    api: Arc<dyn ManagementApi>,
    schema: Schema,
    _kind: PhantomData<fn() -> K>,
}

impl<K: KindSpec> Reconciler<K> {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self {
            api,
            schema: K::schema(),
            _kind: PhantomData,
        }
    }

    async fn read_remote(&self, id: &str) -> Result<Option<Attributes>, ProvisionerError> {
        let key = K::key_for_id(id)?;
        match self.api.get(&key).await {
            Ok(remote) => {
                tracing::debug!(kind = %K::KIND, id = %id, "remote object retrieved");
                Ok(Some(self.schema.normalize(&K::observe(id, &remote))))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read that must find the object, used after a mutation.
    async fn confirm(&self, id: &str, applied: &Attributes) -> Result<Attributes, ProvisionerError> {
        let mut observed =
            self.read_remote(id)
                .await?
                .ok_or_else(|| ProvisionerError::NotFound {
                    kind: K::KIND.to_string(),
                    id: id.to_string(),
                })?;
        self.schema.carry_write_only(applied, &mut observed);
        Ok(observed)
    }

    async fn create_inner(&self, declared: &Attributes) -> Result<ResourceResult, ProvisionerError> {
        self.schema.validate(declared)?;
        let attrs = self.schema.apply_defaults(declared);
        let key = K::create_key(&attrs)?;

        tracing::info!(kind = %K::KIND, key = %key, "creating resource");
        tracing::debug!(kind = %K::KIND, attributes = ?self.schema.redact(&attrs), "declared");

        if K::ON_EXISTING == OnExisting::Reject {
            match self.api.get(&key).await {
                Ok(_) => {
                    return Err(ProvisionerError::AlreadyExists {
                        kind: K::KIND.to_string(),
                        id: K::natural_id(&attrs).unwrap_or_else(|| key.to_string()),
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }

        let created = self.api.create(&key, &K::request_body(&attrs)).await?;
        let id = K::id_after_create(&attrs, &created)?;
        let observed = self.confirm(&id, &attrs).await?;

        tracing::info!(kind = %K::KIND, id = %id, "resource created");
        Ok(ResourceResult { id, observed })
    }

    async fn update_inner(
        &self,
        id: &str,
        prior: &Attributes,
        declared: &Attributes,
    ) -> Result<Attributes, ProvisionerError> {
        self.schema.validate(declared)?;

        let changed = self.schema.force_new_changes(prior, declared);
        if !changed.is_empty() {
            let fields: Vec<&str> = changed.iter().map(|d| d.field.as_str()).collect();
            return Err(ProvisionerError::Validation(format!(
                "cannot update force-new attribute(s) {} of {} '{id}' in place",
                fields.join(", "),
                K::KIND
            )));
        }

        let attrs = self.schema.apply_defaults(declared);
        let key = K::key_for_id(id)?;
        if let Some(natural) = K::natural_id(&attrs) {
            // Compare resolved keys: an imported id may be written unencoded.
            if K::key_for_id(&natural)? != key {
                return Err(ProvisionerError::Validation(format!(
                    "declaration resolves to {} '{natural}', not '{id}'",
                    K::KIND
                )));
            }
        }

        if self.schema.has_mutable() {
            tracing::info!(kind = %K::KIND, id = %id, "updating resource");
            self.api.update(&key, &K::request_body(&attrs)).await?;
        }

        self.confirm(id, &attrs).await
    }

    async fn delete_inner(&self, id: &str) -> Result<(), ProvisionerError> {
        let key = K::key_for_id(id)?;
        tracing::info!(kind = %K::KIND, id = %id, "deleting resource");

        match self.api.delete(&key).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(kind = %K::KIND, id = %id, "already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<K: KindSpec> ResourceHandler for Reconciler<K> {
    fn kind(&self) -> ResourceKind {
        K::KIND
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        declared: &'a Attributes,
    ) -> BoxFuture<'a, Result<ResourceResult, ProvisionerError>> {
        Box::pin(self.create_inner(declared))
    }

    fn read<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Attributes>, ProvisionerError>> {
        Box::pin(self.read_remote(id))
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        prior: &'a Attributes,
        declared: &'a Attributes,
    ) -> BoxFuture<'a, Result<Attributes, ProvisionerError>> {
        Box::pin(self.update_inner(id, prior, declared))
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(self.delete_inner(id))
    }
}
