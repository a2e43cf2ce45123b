//! The member detail view: who a member is, who they supervise or are
//! supervised by, and what they are associated with.

use std::sync::Arc;

use labo_core::{
  backend::MemberBackend,
  change::ResourceChange,
  member::{Member, MemberId, Role},
  resource::ResourceId,
};
use serde::Serialize;

use crate::{Error, Result, bus::Subscription};

/// Resource ids a member is associated with, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Associations {
  pub publications: Vec<ResourceId>,
  pub events:       Vec<ResourceId>,
  pub tools:        Vec<ResourceId>,
}

pub struct MemberDetail<M> {
  backend:          Arc<M>,
  pub member:       Member,
  /// The resolved supervisor of a student, when it could be read.
  pub supervisor:   Option<Member>,
  /// Students supervised by a teacher.
  pub students:     Vec<Member>,
  pub associations: Associations,
}

impl<M: MemberBackend> MemberDetail<M> {
  pub async fn load(backend: Arc<M>, id: MemberId) -> Result<Self> {
    let member = backend
      .get_member(id)
      .await
      .map_err(labo_core::Error::transport)?
      .ok_or(labo_core::Error::NotFound { kind: "member", id })?;

    let mut detail = Self {
      backend,
      member,
      supervisor: None,
      students: Vec::new(),
      associations: Associations::default(),
    };

    if detail.member.is_teacher() {
      detail.students = detail
        .list_members()
        .await
        .into_iter()
        .filter(|m| m.is_supervised_by(id))
        .collect();
    } else if let Some(sup) = detail.member.supervisor() {
      detail.supervisor = match detail.backend.get_member(sup).await {
        Ok(found) => found,
        Err(e) => {
          tracing::warn!(member = id, supervisor = sup, error = %e, "supervisor read failed");
          None
        }
      };
    }

    detail.reload_associations().await;
    Ok(detail)
  }

  /// Re-read the aggregated associations. A failed read leaves them empty.
  pub async fn reload_associations(&mut self) {
    let id = self.member.id;
    self.associations = match self.backend.get_full_member(id).await {
      Ok(Some(full)) => Associations {
        publications: full.publications,
        events:       full.events,
        tools:        full.tools,
      },
      Ok(None) => Associations::default(),
      Err(e) => {
        tracing::warn!(member = id, error = %e, "association read failed");
        Associations::default()
      }
    };
  }

  pub fn is_affected_by(&self, change: &ResourceChange) -> bool {
    change.affects(self.member.id)
  }

  /// Reload if `change` concerns this member. Returns whether it did.
  pub async fn apply(&mut self, change: &ResourceChange) -> bool {
    if !self.is_affected_by(change) {
      return false;
    }
    self.reload_associations().await;
    true
  }

  /// Keep the associations current until the bus goes away.
  pub async fn follow(&mut self, subscription: &mut Subscription) {
    while let Some(change) = subscription.recv().await {
      if self.apply(&change).await {
        tracing::debug!(member = self.member.id, kind = %change.kind, "detail reloaded");
      }
    }
  }

  // ── Supervision ───────────────────────────────────────────────────────────

  /// Students without a supervisor that are not already listed here.
  pub async fn available_students(&self) -> Vec<Member> {
    self
      .list_members()
      .await
      .into_iter()
      .filter(|m| m.is_student() && m.supervisor().is_none())
      .filter(|m| !self.students.iter().any(|s| s.id == m.id))
      .collect()
  }

  /// Make this teacher the supervisor of `student`.
  pub async fn assign_student(&mut self, mut student: Member) -> Result<()> {
    let teacher = self.require_teacher()?;
    self
      .backend
      .set_supervisor(student.id, Some(teacher))
      .await
      .map_err(labo_core::Error::transport)?;
    if let Role::Student(role) = &mut student.role {
      role.supervisor = Some(teacher);
    }
    tracing::info!(teacher, student = student.id, "student assigned");
    self.students.push(student);
    Ok(())
  }

  /// Clear the supervisor of one of this teacher's students.
  pub async fn remove_student(&mut self, student: MemberId) -> Result<()> {
    let teacher = self.require_teacher()?;
    if !self.students.iter().any(|s| s.id == student) {
      return Err(Error::NotSupervised { teacher, student });
    }
    self
      .backend
      .set_supervisor(student, None)
      .await
      .map_err(labo_core::Error::transport)?;
    self.students.retain(|s| s.id != student);
    tracing::info!(teacher, student, "student unassigned");
    Ok(())
  }

  fn require_teacher(&self) -> Result<MemberId> {
    if self.member.is_teacher() {
      Ok(self.member.id)
    } else {
      Err(Error::NotATeacher(self.member.id))
    }
  }

  async fn list_members(&self) -> Vec<Member> {
    match self.backend.list_members().await {
      Ok(all) => all,
      Err(e) => {
        tracing::warn!(error = %e, "member listing failed");
        Vec::new()
      }
    }
  }
}
