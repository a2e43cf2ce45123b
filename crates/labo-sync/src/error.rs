//! Error type for `labo-sync`.

use labo_core::{member::MemberId, resource::ResourceKind};
use thiserror::Error;

use crate::cascade::{AppliedSteps, CascadeStage};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] labo_core::Error),

  /// A fail-soft write returned its failure sentinel; the cause was logged.
  #[error("the {kind} service rejected the {action}")]
  Rejected {
    kind:   ResourceKind,
    action: &'static str,
  },

  #[error("member {0} is not a teacher")]
  NotATeacher(MemberId),

  #[error("member {student} is not supervised by member {teacher}")]
  NotSupervised {
    teacher: MemberId,
    student: MemberId,
  },

  /// A member deletion stopped part-way. Steps listed in `applied` were
  /// persisted and are not rolled back.
  #[error("deletion of member {member} aborted while {stage}: {source}")]
  PartialCascade {
    member:  MemberId,
    stage:   CascadeStage,
    applied: AppliedSteps,
    #[source]
    source:  labo_core::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
