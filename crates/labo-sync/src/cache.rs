//! Time-boxed "last known associations" per resource.
//!
//! Populated after creates and updates so an edit issued right after can
//! still diff against the right member set when the backend's read-back omits
//! associations. Advisory only: the backend stays the source of truth.

use std::{
  collections::{BTreeSet, HashMap},
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use labo_core::{member::MemberId, resource::ResourceId};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry {
  members:   BTreeSet<MemberId>,
  stored_at: Instant,
}

/// In-memory `resource id → member ids` map whose entries expire after `ttl`.
/// Never fails; a poisoned lock is recovered.
pub struct AssociationCache {
  ttl:     Duration,
  entries: Mutex<HashMap<ResourceId, Entry>>,
}

impl AssociationCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn set(&self, resource: ResourceId, members: BTreeSet<MemberId>) {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(resource, Entry {
      members,
      stored_at: Instant::now(),
    });
  }

  /// The cached members of `resource`, or `None` if absent or expired.
  pub fn get(&self, resource: ResourceId) -> Option<BTreeSet<MemberId>> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    let expired = entries
      .get(&resource)
      .map(|e| e.stored_at.elapsed() >= self.ttl)?;
    if expired {
      entries.remove(&resource);
      None
    } else {
      entries.get(&resource).map(|e| e.members.clone())
    }
  }
}

impl Default for AssociationCache {
  fn default() -> Self { Self::new(DEFAULT_TTL) }
}
