//! Change notifications exchanged between resource editors and views.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{member::MemberId, resource::ResourceKind};

/// Announces that the associations of some members with a resource of `kind`
/// changed. Ephemeral: never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
  pub kind:       ResourceKind,
  pub member_ids: BTreeSet<MemberId>,
}

impl ResourceChange {
  pub fn new(
    kind: ResourceKind,
    member_ids: impl IntoIterator<Item = MemberId>,
  ) -> Self {
    Self {
      kind,
      member_ids: member_ids.into_iter().collect(),
    }
  }

  /// Subscriber-side filter: does this change concern `member_id`?
  pub fn affects(&self, member_id: MemberId) -> bool {
    self.member_ids.contains(&member_id)
  }
}
