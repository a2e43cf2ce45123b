//! Publications, events and tools: the resources members are associated
//! with.
//!
//! All three share the same shape: an id, kind-specific fields, and a set of
//! associated member ids. [`Resource`] is generic over the kind-specific
//! [`ResourceFields`].

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, member::MemberId};

pub type ResourceId = i64;

// ─── Kind ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
  Publication,
  Event,
  Tool,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 3] = [Self::Publication, Self::Event, Self::Tool];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Publication => "publication",
      Self::Event => "event",
      Self::Tool => "tool",
    }
  }
}

impl std::fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.pad(self.as_str())
  }
}

// ─── Kind-specific fields ────────────────────────────────────────────────────

/// The kind-specific part of a resource.
pub trait ResourceFields:
  Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static
{
  const KIND: ResourceKind;

  /// Names of required fields that are empty.
  fn missing_fields(&self) -> Vec<&'static str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationFields {
  /// Free-form category, e.g. "article" or "conference".
  pub category:   String,
  pub title:      String,
  pub link:       Option<String>,
  pub date:       Option<NaiveDate>,
  pub pdf_source: Option<String>,
}

impl ResourceFields for PublicationFields {
  const KIND: ResourceKind = ResourceKind::Publication;

  fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.category.trim().is_empty() {
      missing.push("type");
    }
    if self.title.trim().is_empty() {
      missing.push("title");
    }
    missing
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
  pub title:    String,
  pub start:    Option<NaiveDate>,
  pub end:      Option<NaiveDate>,
  pub location: String,
}

impl ResourceFields for EventFields {
  const KIND: ResourceKind = ResourceKind::Event;

  fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.title.trim().is_empty() {
      missing.push("title");
    }
    if self.start.is_none() {
      missing.push("start");
    }
    if self.end.is_none() {
      missing.push("end");
    }
    if self.location.trim().is_empty() {
      missing.push("location");
    }
    missing
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFields {
  pub date:   Option<NaiveDate>,
  pub source: String,
}

impl ResourceFields for ToolFields {
  const KIND: ResourceKind = ResourceKind::Tool;

  fn missing_fields(&self) -> Vec<&'static str> {
    if self.source.trim().is_empty() {
      vec!["source"]
    } else {
      Vec::new()
    }
  }
}

// ─── Resource ────────────────────────────────────────────────────────────────

/// A persisted resource of kind `F::KIND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<F> {
  pub id:      ResourceId,
  pub fields:  F,
  /// Associated members. The backend is the source of truth; this may be
  /// empty when the backend omits associations from a read.
  pub members: BTreeSet<MemberId>,
}

impl<F: ResourceFields> Resource<F> {
  pub fn kind(&self) -> ResourceKind { F::KIND }

  pub fn to_new(&self) -> NewResource<F> {
    NewResource {
      fields:  self.fields.clone(),
      members: self.members.clone(),
    }
  }
}

/// Input to resource creation and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource<F> {
  pub fields:  F,
  pub members: BTreeSet<MemberId>,
}

impl<F: ResourceFields> NewResource<F> {
  pub fn new(fields: F, members: impl IntoIterator<Item = MemberId>) -> Self {
    Self {
      fields,
      members: members.into_iter().collect(),
    }
  }

  /// Reject drafts with an empty required field or no associated member.
  pub fn validate(&self) -> Result<()> {
    let mut missing = self.fields.missing_fields();
    if self.members.is_empty() {
      missing.push("members");
    }
    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(missing))
    }
  }
}

pub type Publication = Resource<PublicationFields>;
pub type Event = Resource<EventFields>;
pub type Tool = Resource<ToolFields>;
