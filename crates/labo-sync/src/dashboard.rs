//! Aggregate figures for the landing dashboard.

use futures::future::join_all;
use labo_core::{
  backend::{MemberBackend, ResourceBackend},
  member::{Member, MemberId},
  resource::{EventFields, PublicationFields, ToolFields},
};
use serde::Serialize;

use crate::client::ResourceClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberPublications {
  pub member:       MemberId,
  pub name:         String,
  pub publications: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
  pub members:                 usize,
  pub publications:            usize,
  pub tools:                   usize,
  pub events:                  usize,
  pub teachers:                usize,
  pub students:                usize,
  pub publications_per_member: Vec<MemberPublications>,
}

impl DashboardStats {
  /// Every list is read concurrently and degrades to empty on failure. A
  /// member whose aggregated read fails counts zero publications.
  pub async fn collect<M, R>(
    members: &M,
    publications: &ResourceClient<PublicationFields, R>,
    events: &ResourceClient<EventFields, R>,
    tools: &ResourceClient<ToolFields, R>,
  ) -> Self
  where
    M: MemberBackend,
    R: ResourceBackend<PublicationFields>
      + ResourceBackend<EventFields>
      + ResourceBackend<ToolFields>,
  {
    let list_members = async {
      members.list_members().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "member listing failed");
        Vec::new()
      })
    };
    let (all, pubs, evts, outils) = futures::join!(
      list_members,
      publications.list_all(),
      events.list_all(),
      tools.list_all(),
    );

    let per_member = join_all(all.iter().map(|m| count_publications(members, m))).await;
    let teachers = all.iter().filter(|m| m.is_teacher()).count();

    Self {
      members: all.len(),
      publications: pubs.len(),
      tools: outils.len(),
      events: evts.len(),
      teachers,
      students: all.len() - teachers,
      publications_per_member: per_member,
    }
  }
}

async fn count_publications<M: MemberBackend>(
  members: &M,
  member: &Member,
) -> MemberPublications {
  let publications = match members.get_full_member(member.id).await {
    Ok(Some(full)) => full.publications.len(),
    Ok(None) => 0,
    Err(e) => {
      tracing::warn!(member = member.id, error = %e, "association read failed");
      0
    }
  };
  MemberPublications {
    member: member.id,
    name: member.display_name(),
    publications,
  }
}
