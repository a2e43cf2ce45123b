//! Member deletion with dependent cleanup.
//!
//! Deleting a teacher who still supervises students first clears every
//! student's supervisor, then removes every publication, event and tool
//! association the teacher has, and only then deletes the record. The user
//! confirms before anything is changed. A failure part-way aborts the
//! deletion; steps already persisted stay persisted and are listed in
//! [`Error::PartialCascade`].

use std::{fmt, sync::Arc};

use futures::future::join_all;
use labo_core::{
  backend::MemberBackend,
  member::{Member, MemberId},
  resource::{ResourceId, ResourceKind},
};
use serde::Serialize;

use crate::{Error, Result};

// ─── Confirmation ────────────────────────────────────────────────────────────

/// What the user is asked before a teacher with students is deleted.
#[derive(Debug, Clone)]
pub struct DependentsPrompt {
  pub teacher:  Member,
  pub students: Vec<Member>,
}

impl DependentsPrompt {
  pub fn message(&self) -> String {
    let n = self.students.len();
    format!(
      "{} supervises {n} student{}. Their supervision and all of this \
       member's publication, event and tool associations will be removed \
       before deletion. Continue?",
      self.teacher.display_name(),
      if n == 1 { "" } else { "s" },
    )
  }
}

/// Asks the user to approve a cascading deletion.
pub trait Confirm {
  fn confirm(&self, prompt: &DependentsPrompt) -> bool;
}

impl<F> Confirm for F
where
  F: Fn(&DependentsPrompt) -> bool,
{
  fn confirm(&self, prompt: &DependentsPrompt) -> bool { self(prompt) }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Mutations persisted by a cascade so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedSteps {
  /// Students whose supervisor was cleared.
  pub cleared_supervisions: Vec<MemberId>,
  pub removed_associations: Vec<(ResourceKind, ResourceId)>,
}

impl AppliedSteps {
  pub fn is_empty(&self) -> bool {
    self.cleared_supervisions.is_empty() && self.removed_associations.is_empty()
  }
}

/// Where a cascade stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CascadeStage {
  DiscoveringStudents,
  ClearingSupervisions,
  ReadingAssociations,
  RemovingAssociations,
  DeletingMember,
}

impl fmt::Display for CascadeStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::DiscoveringStudents => "discovering supervised students",
      Self::ClearingSupervisions => "clearing supervisions",
      Self::ReadingAssociations => "reading associations",
      Self::RemovingAssociations => "removing associations",
      Self::DeletingMember => "deleting the member",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted(AppliedSteps),
  AbortedByUser,
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct CascadeDelete<M> {
  members: Arc<M>,
}

impl<M: MemberBackend> CascadeDelete<M> {
  pub fn new(members: Arc<M>) -> Self { Self { members } }

  /// Delete member `id`, cleaning up after it if it is a teacher with
  /// students.
  ///
  /// A member that cannot be read is deleted directly. Students and teachers
  /// without students are deleted without a prompt and without cleanup.
  pub async fn delete_member<C>(
    &self,
    id: MemberId,
    confirm: &C,
  ) -> Result<DeleteOutcome>
  where
    C: Confirm + ?Sized,
  {
    let member = match self.members.get_member(id).await {
      Ok(Some(member)) => member,
      Ok(None) => {
        tracing::warn!(member = id, "member not found, deleting directly");
        return self.finish(id, AppliedSteps::default()).await;
      }
      Err(e) => {
        tracing::warn!(member = id, error = %e, "member read failed, deleting directly");
        return self.finish(id, AppliedSteps::default()).await;
      }
    };

    if !member.is_teacher() {
      return self.finish(id, AppliedSteps::default()).await;
    }

    let students: Vec<Member> = match self.members.list_members().await {
      Ok(all) => all.into_iter().filter(|m| m.is_supervised_by(id)).collect(),
      Err(e) => {
        return Err(partial(
          id,
          CascadeStage::DiscoveringStudents,
          AppliedSteps::default(),
          e,
        ));
      }
    };
    if students.is_empty() {
      return self.finish(id, AppliedSteps::default()).await;
    }

    let prompt = DependentsPrompt {
      teacher: member,
      students,
    };
    if !confirm.confirm(&prompt) {
      tracing::info!(member = id, "deletion declined");
      return Ok(DeleteOutcome::AbortedByUser);
    }

    let mut applied = AppliedSteps::default();
    self.clear_supervisions(id, &prompt.students, &mut applied).await?;
    self.remove_associations(id, &mut applied).await?;
    self.finish(id, applied).await
  }

  async fn clear_supervisions(
    &self,
    id: MemberId,
    students: &[Member],
    applied: &mut AppliedSteps,
  ) -> Result<()> {
    let calls = students.iter().map(|s| async move {
      (s.id, self.members.set_supervisor(s.id, None).await)
    });
    let mut first_error = None;
    for (student, outcome) in join_all(calls).await {
      match outcome {
        Ok(()) => applied.cleared_supervisions.push(student),
        Err(e) => {
          tracing::warn!(member = id, student, error = %e, "clearing supervisor failed");
          first_error.get_or_insert(e);
        }
      }
    }
    match first_error {
      Some(e) => {
        Err(partial(id, CascadeStage::ClearingSupervisions, applied.clone(), e))
      }
      None => Ok(()),
    }
  }

  async fn remove_associations(
    &self,
    id: MemberId,
    applied: &mut AppliedSteps,
  ) -> Result<()> {
    let full = match self.members.get_full_member(id).await {
      Ok(full) => full,
      Err(e) => {
        return Err(partial(
          id,
          CascadeStage::ReadingAssociations,
          applied.clone(),
          e,
        ));
      }
    };
    let Some(full) = full else {
      return Ok(());
    };

    let calls = full.associations().map(|(kind, resource)| async move {
      (kind, resource, self.members.unlink(kind, id, resource).await)
    });
    let mut first_error = None;
    for (kind, resource, outcome) in join_all(calls).await {
      match outcome {
        Ok(()) => applied.removed_associations.push((kind, resource)),
        Err(e) => {
          tracing::warn!(member = id, %kind, resource, error = %e, "removing association failed");
          first_error.get_or_insert(e);
        }
      }
    }
    match first_error {
      Some(e) => {
        Err(partial(id, CascadeStage::RemovingAssociations, applied.clone(), e))
      }
      None => Ok(()),
    }
  }

  async fn finish(
    &self,
    id: MemberId,
    applied: AppliedSteps,
  ) -> Result<DeleteOutcome> {
    match self.members.delete_member(id).await {
      Ok(()) => {
        tracing::info!(
          member = id,
          cleared = applied.cleared_supervisions.len(),
          unlinked = applied.removed_associations.len(),
          "member deleted"
        );
        Ok(DeleteOutcome::Deleted(applied))
      }
      Err(e) if applied.is_empty() => Err(labo_core::Error::transport(e).into()),
      Err(e) => Err(partial(id, CascadeStage::DeletingMember, applied, e)),
    }
  }
}

fn partial<E>(
  member: MemberId,
  stage: CascadeStage,
  applied: AppliedSteps,
  source: E,
) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::PartialCascade {
    member,
    stage,
    applied,
    source: labo_core::Error::transport(source),
  }
}
