//! [`Lab`] wires one backend into every flow of the console.

use std::{sync::Arc, time::Duration};

use labo_core::{
  backend::{MemberBackend, ResourceBackend},
  member::{Member, MemberId, NewMember},
  resource::{EventFields, PublicationFields, ToolFields},
};

use crate::{
  Result,
  bus::{ChangeBus, Subscription},
  cache::DEFAULT_TTL,
  cascade::{CascadeDelete, Confirm, DeleteOutcome},
  client::ResourceClient,
  dashboard::DashboardStats,
  detail::MemberDetail,
  editor::ResourceEditor,
  sync::Synchronizer,
};

/// A backend that serves members and all three resource collections.
pub trait LabBackend:
  MemberBackend
  + ResourceBackend<PublicationFields>
  + ResourceBackend<EventFields>
  + ResourceBackend<ToolFields>
{
}

impl<B> LabBackend for B where
  B: MemberBackend
    + ResourceBackend<PublicationFields>
    + ResourceBackend<EventFields>
    + ResourceBackend<ToolFields>
{
}

pub type Editor<F, B> = ResourceEditor<F, B, B>;

pub struct Lab<B> {
  backend:      Arc<B>,
  bus:          Arc<ChangeBus>,
  publications: Editor<PublicationFields, B>,
  events:       Editor<EventFields, B>,
  tools:        Editor<ToolFields, B>,
  cascade:      CascadeDelete<B>,
}

impl<B: LabBackend> Lab<B> {
  pub fn new(backend: B) -> Self { Self::with_cache_ttl(backend, DEFAULT_TTL) }

  pub fn with_cache_ttl(backend: B, cache_ttl: Duration) -> Self {
    let backend = Arc::new(backend);
    let bus = Arc::new(ChangeBus::new());
    let sync = Arc::new(Synchronizer::new(backend.clone(), bus.clone()));
    Self {
      publications: ResourceEditor::new(
        Arc::new(ResourceClient::new(backend.clone(), cache_ttl)),
        sync.clone(),
      ),
      events: ResourceEditor::new(
        Arc::new(ResourceClient::new(backend.clone(), cache_ttl)),
        sync.clone(),
      ),
      tools: ResourceEditor::new(
        Arc::new(ResourceClient::new(backend.clone(), cache_ttl)),
        sync,
      ),
      cascade: CascadeDelete::new(backend.clone()),
      backend,
      bus,
    }
  }

  pub fn backend(&self) -> &B { &self.backend }

  pub fn bus(&self) -> &ChangeBus { &self.bus }

  pub fn subscribe(&self) -> Subscription { self.bus.subscribe() }

  pub fn publications(&self) -> &Editor<PublicationFields, B> { &self.publications }

  pub fn events(&self) -> &Editor<EventFields, B> { &self.events }

  pub fn tools(&self) -> &Editor<ToolFields, B> { &self.tools }

  // ── Members ───────────────────────────────────────────────────────────────

  /// Every member; empty if the listing fails.
  pub async fn members(&self) -> Vec<Member> {
    match self.backend.list_members().await {
      Ok(all) => all,
      Err(e) => {
        tracing::warn!(error = %e, "member listing failed");
        Vec::new()
      }
    }
  }

  /// Validate and create a member.
  pub async fn add_member(&self, draft: NewMember) -> Result<()> {
    draft.validate()?;
    self
      .backend
      .create_member(draft)
      .await
      .map_err(labo_core::Error::transport)?;
    Ok(())
  }

  pub async fn member(&self, id: MemberId) -> Result<Member> {
    let member = self
      .backend
      .get_member(id)
      .await
      .map_err(labo_core::Error::transport)?
      .ok_or(labo_core::Error::NotFound { kind: "member", id })?;
    Ok(member)
  }

  /// Validate and write back an edited member. The payload goes to the
  /// collection of the draft's role.
  pub async fn update_member(&self, id: MemberId, draft: NewMember) -> Result<()> {
    draft.validate()?;
    self
      .backend
      .update_member(id, draft)
      .await
      .map_err(labo_core::Error::transport)?;
    tracing::info!(member = id, "member updated");
    Ok(())
  }

  pub async fn delete_member<C>(
    &self,
    id: MemberId,
    confirm: &C,
  ) -> Result<DeleteOutcome>
  where
    C: Confirm + ?Sized,
  {
    self.cascade.delete_member(id, confirm).await
  }

  pub async fn member_detail(&self, id: MemberId) -> Result<MemberDetail<B>> {
    MemberDetail::load(self.backend.clone(), id).await
  }

  pub async fn dashboard(&self) -> DashboardStats {
    DashboardStats::collect(
      self.backend.as_ref(),
      self.publications.client(),
      self.events.client(),
      self.tools.client(),
    )
    .await
  }
}
