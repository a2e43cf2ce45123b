//! The association synchroniser.
//!
//! Given the member set a resource had and the one it should have, issue one
//! link call per added member and one unlink call per removed member, tell
//! the bus which members were touched, and remember the new set.

use std::{collections::BTreeSet, sync::Arc};

use futures::future::join_all;
use labo_core::{
  backend::{MemberBackend, ResourceBackend},
  change::ResourceChange,
  member::MemberId,
  resource::{ResourceFields, ResourceId, ResourceKind},
};
use serde::Serialize;

use crate::{bus::ChangeBus, client::ResourceClient};

/// Per-member outcome of one [`Synchronizer::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
  pub succeeded_adds:    BTreeSet<MemberId>,
  pub failed_adds:       BTreeSet<MemberId>,
  pub succeeded_removes: BTreeSet<MemberId>,
  pub failed_removes:    BTreeSet<MemberId>,
}

impl SyncReport {
  /// `true` if every link and unlink call succeeded.
  pub fn is_complete(&self) -> bool {
    self.failed_adds.is_empty() && self.failed_removes.is_empty()
  }

  /// Members whose association state is known to have changed.
  pub fn touched(&self) -> BTreeSet<MemberId> {
    self
      .succeeded_adds
      .union(&self.succeeded_removes)
      .copied()
      .collect()
  }
}

pub struct Synchronizer<M> {
  members: Arc<M>,
  bus:     Arc<ChangeBus>,
}

impl<M: MemberBackend> Synchronizer<M> {
  pub fn new(members: Arc<M>, bus: Arc<ChangeBus>) -> Self {
    Self { members, bus }
  }

  pub fn bus(&self) -> &Arc<ChangeBus> { &self.bus }

  /// Bring the associations of `resource` from `previous` to `new`.
  ///
  /// Links run concurrently and are all awaited; a failed link is logged and
  /// the flow continues. Then exactly one change carrying
  /// `added ∪ removed` is emitted (none if both are empty), the unlinks run
  /// concurrently, and finally the cache of `client` is set to `new` whatever
  /// the outcomes were.
  pub async fn reconcile<F, R>(
    &self,
    client: &ResourceClient<F, R>,
    resource: ResourceId,
    previous: &BTreeSet<MemberId>,
    new: &BTreeSet<MemberId>,
  ) -> SyncReport
  where
    F: ResourceFields,
    R: ResourceBackend<F>,
  {
    let kind = F::KIND;
    let added: BTreeSet<MemberId> = new.difference(previous).copied().collect();
    let removed: BTreeSet<MemberId> =
      previous.difference(new).copied().collect();
    let mut report = SyncReport::default();

    if !added.is_empty() {
      let (ok, failed) = self.fan_out(kind, resource, &added, true).await;
      report.succeeded_adds = ok;
      report.failed_adds = failed;
    }

    let notify: BTreeSet<MemberId> = added.union(&removed).copied().collect();
    if !notify.is_empty() {
      self.bus.emit(ResourceChange {
        kind,
        member_ids: notify,
      });
    }

    if !removed.is_empty() {
      let (ok, failed) = self.fan_out(kind, resource, &removed, false).await;
      report.succeeded_removes = ok;
      report.failed_removes = failed;
    }

    client.set_associations(resource, new.clone());

    if report.is_complete() {
      tracing::debug!(%kind, resource, ?added, ?removed, "associations synchronised");
    } else {
      tracing::warn!(
        %kind,
        resource,
        failed_adds = ?report.failed_adds,
        failed_removes = ?report.failed_removes,
        "associations partially synchronised"
      );
    }
    report
  }

  /// Issue one link (or unlink) per member concurrently and split the
  /// members by outcome.
  async fn fan_out(
    &self,
    kind: ResourceKind,
    resource: ResourceId,
    members: &BTreeSet<MemberId>,
    link: bool,
  ) -> (BTreeSet<MemberId>, BTreeSet<MemberId>) {
    let calls = members.iter().map(|&member| async move {
      let outcome = if link {
        self.members.link(kind, member, resource).await
      } else {
        self.members.unlink(kind, member, resource).await
      };
      (member, outcome)
    });

    let mut ok = BTreeSet::new();
    let mut failed = BTreeSet::new();
    for (member, outcome) in join_all(calls).await {
      match outcome {
        Ok(()) => {
          ok.insert(member);
        }
        Err(e) => {
          let action = if link { "link" } else { "unlink" };
          tracing::warn!(%kind, resource, member, error = %e, "{action} failed");
          failed.insert(member);
        }
      }
    }
    (ok, failed)
  }
}
