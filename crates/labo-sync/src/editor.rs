//! Create, edit and delete flows for publications, events and tools.

use std::{collections::BTreeSet, sync::Arc};

use labo_core::{
  backend::{MemberBackend, ResourceBackend},
  change::ResourceChange,
  member::MemberId,
  resource::{NewResource, Resource, ResourceFields, ResourceId},
};

use crate::{
  Error, Result,
  client::ResourceClient,
  sync::{SyncReport, Synchronizer},
};

/// A resource as saved, with the outcome of its association calls.
#[derive(Debug, Clone)]
pub struct Saved<F> {
  pub resource: Resource<F>,
  pub report:   SyncReport,
}

pub struct ResourceEditor<F, R, M> {
  client: Arc<ResourceClient<F, R>>,
  sync:   Arc<Synchronizer<M>>,
}

impl<F, R, M> ResourceEditor<F, R, M>
where
  F: ResourceFields,
  R: ResourceBackend<F>,
  M: MemberBackend,
{
  pub fn new(client: Arc<ResourceClient<F, R>>, sync: Arc<Synchronizer<M>>) -> Self {
    Self { client, sync }
  }

  pub fn client(&self) -> &ResourceClient<F, R> { &self.client }

  pub async fn list(&self) -> Vec<Resource<F>> { self.client.list_all().await }

  /// Create the resource, then associate every member of the draft with it.
  pub async fn create(&self, draft: NewResource<F>) -> Result<Saved<F>> {
    draft.validate()?;
    let members = draft.members.clone();
    let created = self.client.create(draft).await.ok_or(Error::Rejected {
      kind:   F::KIND,
      action: "create",
    })?;

    let report = self
      .sync
      .reconcile(&self.client, created.id, &BTreeSet::new(), &members)
      .await;
    tracing::info!(kind = %F::KIND, id = created.id, "resource created");
    Ok(Saved {
      resource: Resource { members, ..created },
      report,
    })
  }

  /// Update the resource's fields, then move its associations from what the
  /// backend (or the cache) last reported to `draft.members`.
  pub async fn update(
    &self,
    id: ResourceId,
    draft: NewResource<F>,
  ) -> Result<SyncReport> {
    draft.validate()?;
    let original = match self.client.get(id).await {
      Ok(current) if !current.members.is_empty() => current.members,
      Ok(_) => self.cached(id),
      Err(Error::Core(labo_core::Error::NotFound { kind, id })) => {
        return Err(labo_core::Error::NotFound { kind, id }.into());
      }
      Err(e) => {
        tracing::warn!(kind = %F::KIND, id, error = %e, "reading original associations failed");
        self.cached(id)
      }
    };

    let members = draft.members.clone();
    if !self.client.update(id, draft).await {
      return Err(Error::Rejected {
        kind:   F::KIND,
        action: "update",
      });
    }

    let report = self.sync.reconcile(&self.client, id, &original, &members).await;
    tracing::info!(kind = %F::KIND, id, "resource updated");
    Ok(report)
  }

  /// Delete the resource and notify its former members.
  pub async fn delete(&self, id: ResourceId) -> Result<()> {
    let former = match self.client.get(id).await {
      Ok(current) if !current.members.is_empty() => current.members,
      Ok(_) => self.cached(id),
      Err(e) => {
        tracing::warn!(kind = %F::KIND, id, error = %e, "reading members before delete failed");
        BTreeSet::new()
      }
    };

    self.client.delete(id).await?;
    if !former.is_empty() {
      self.sync.bus().emit(ResourceChange {
        kind:       F::KIND,
        member_ids: former,
      });
    }
    tracing::info!(kind = %F::KIND, id, "resource deleted");
    Ok(())
  }

  fn cached(&self, id: ResourceId) -> BTreeSet<MemberId> {
    self.client.associations(id).unwrap_or_default()
  }
}
