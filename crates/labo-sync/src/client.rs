//! [`ResourceClient`]: fail-soft access to one resource collection.

use std::{collections::BTreeSet, marker::PhantomData, sync::Arc, time::Duration};

use labo_core::{
  backend::ResourceBackend,
  member::MemberId,
  resource::{NewResource, Resource, ResourceFields, ResourceId, ResourceKind},
};

use crate::{Result, cache::AssociationCache};

/// Wraps a [`ResourceBackend`] with the error policy of the list views and
/// the per-kind association cache.
///
/// - `list_all` degrades to an empty list.
/// - `create` / `update` return a failure sentinel; the caller tells the user.
/// - `get` / `delete` propagate the error.
///
/// Every swallowed error is logged at `warn`.
pub struct ResourceClient<F, R> {
  backend: Arc<R>,
  cache:   AssociationCache,
  _kind:   PhantomData<fn() -> F>,
}

impl<F, R> ResourceClient<F, R>
where
  F: ResourceFields,
  R: ResourceBackend<F>,
{
  pub fn new(backend: Arc<R>, cache_ttl: Duration) -> Self {
    Self {
      backend,
      cache: AssociationCache::new(cache_ttl),
      _kind: PhantomData,
    }
  }

  pub fn kind(&self) -> ResourceKind { F::KIND }

  pub async fn list_all(&self) -> Vec<Resource<F>> {
    match self.backend.list().await {
      Ok(list) => list,
      Err(e) => {
        tracing::warn!(kind = %F::KIND, error = %e, "listing failed");
        Vec::new()
      }
    }
  }

  pub async fn get(&self, id: ResourceId) -> Result<Resource<F>> {
    self
      .backend
      .get(id)
      .await
      .map_err(labo_core::Error::transport)?
      .ok_or_else(|| {
        labo_core::Error::NotFound {
          kind: F::KIND.as_str(),
          id,
        }
        .into()
      })
  }

  pub async fn create(&self, input: NewResource<F>) -> Option<Resource<F>> {
    match self.backend.create(input).await {
      Ok(created) => Some(created),
      Err(e) => {
        tracing::warn!(kind = %F::KIND, error = %e, "create failed");
        None
      }
    }
  }

  /// `false` if the backend rejected the update.
  pub async fn update(&self, id: ResourceId, input: NewResource<F>) -> bool {
    match self.backend.update(id, input).await {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(kind = %F::KIND, id, error = %e, "update failed");
        false
      }
    }
  }

  pub async fn delete(&self, id: ResourceId) -> Result<()> {
    self
      .backend
      .delete(id)
      .await
      .map_err(labo_core::Error::transport)?;
    Ok(())
  }

  // ── Association cache ─────────────────────────────────────────────────────

  pub fn set_associations(&self, id: ResourceId, members: BTreeSet<MemberId>) {
    self.cache.set(id, members);
  }

  pub fn associations(&self, id: ResourceId) -> Option<BTreeSet<MemberId>> {
    self.cache.get(id)
  }
}
