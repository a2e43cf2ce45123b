//! Members of the laboratory and the supervision relation between them.
//!
//! A member is either a student or a teacher. The role is an explicit variant
//! chosen when the member is built; only the wire layer ever has to infer it
//! (see [`RoleKind::from_enrollment`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  resource::{ResourceId, ResourceKind},
};

pub type MemberId = i64;

// ─── Personal fields ─────────────────────────────────────────────────────────

/// Fields shared by every member regardless of role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// National identity card number.
  pub cin:        String,
  pub name:       String,
  pub surname:    String,
  pub birth_date: Option<NaiveDate>,
  pub email:      String,
  pub password:   String,
  /// Inline data URL or a link; opaque to this crate.
  pub photo:      Option<String>,
  pub cv:         Option<String>,
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRole {
  pub enrollment_date: NaiveDate,
  pub diploma:         String,
  pub subject:         String,
  /// The supervising teacher, if any. At most one per student.
  pub supervisor:      Option<MemberId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRole {
  pub grade:       String,
  pub institution: String,
}

/// The role variant of a member. Only students carry a supervisor reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
  Student(StudentRole),
  Teacher(TeacherRole),
}

/// Field-less discriminant of [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
  Student,
  Teacher,
}

impl RoleKind {
  /// Classify a backend record: a present enrollment date marks a student,
  /// anything else a teacher.
  pub fn from_enrollment<T>(enrollment_date: Option<&T>) -> Self {
    match enrollment_date {
      Some(_) => Self::Student,
      None => Self::Teacher,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Teacher => "teacher",
    }
  }
}

impl std::fmt::Display for RoleKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.pad(self.as_str())
  }
}

impl Role {
  pub fn kind(&self) -> RoleKind {
    match self {
      Self::Student(_) => RoleKind::Student,
      Self::Teacher(_) => RoleKind::Teacher,
    }
  }

  pub fn supervisor(&self) -> Option<MemberId> {
    match self {
      Self::Student(s) => s.supervisor,
      Self::Teacher(_) => None,
    }
  }
}

// ─── Member ──────────────────────────────────────────────────────────────────

/// A persisted member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub id:      MemberId,
  pub profile: Profile,
  pub role:    Role,
}

impl Member {
  pub fn is_teacher(&self) -> bool { matches!(self.role, Role::Teacher(_)) }

  pub fn is_student(&self) -> bool { matches!(self.role, Role::Student(_)) }

  pub fn supervisor(&self) -> Option<MemberId> { self.role.supervisor() }

  /// `true` if this member is a student supervised by `teacher_id`.
  pub fn is_supervised_by(&self, teacher_id: MemberId) -> bool {
    self.supervisor() == Some(teacher_id)
  }

  pub fn display_name(&self) -> String {
    format!("{} {}", self.profile.name, self.profile.surname)
  }

  /// The write payload that reproduces this member as-is.
  pub fn to_new(&self) -> NewMember {
    NewMember {
      profile: self.profile.clone(),
      role:    self.role.clone(),
    }
  }
}

/// Input to member creation and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
  pub profile: Profile,
  pub role:    Role,
}

impl NewMember {
  /// Reject drafts that lack a required field.
  pub fn validate(&self) -> Result<()> {
    let p = &self.profile;
    let mut missing = Vec::new();
    if p.cin.trim().is_empty() {
      missing.push("cin");
    }
    if p.name.trim().is_empty() {
      missing.push("name");
    }
    if p.surname.trim().is_empty() {
      missing.push("surname");
    }
    if !p.email.contains('@') {
      missing.push("email");
    }
    if p.password.is_empty() {
      missing.push("password");
    }
    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(missing))
    }
  }
}

// ─── Aggregated read ─────────────────────────────────────────────────────────

/// A member together with every resource they are associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullMember {
  pub member:       Member,
  pub publications: Vec<ResourceId>,
  pub events:       Vec<ResourceId>,
  pub tools:        Vec<ResourceId>,
}

impl FullMember {
  /// Every association as `(kind, resource id)`, publications first.
  pub fn associations(
    &self,
  ) -> impl Iterator<Item = (ResourceKind, ResourceId)> + '_ {
    let pubs = self
      .publications
      .iter()
      .map(|id| (ResourceKind::Publication, *id));
    let events = self.events.iter().map(|id| (ResourceKind::Event, *id));
    let tools = self.tools.iter().map(|id| (ResourceKind::Tool, *id));
    pubs.chain(events).chain(tools)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn profile() -> Profile {
    Profile {
      cin: "01234567".into(),
      name: "Amira".into(),
      surname: "Ben Salah".into(),
      email: "amira@lab.tn".into(),
      password: "secret".into(),
      ..Profile::default()
    }
  }

  #[test]
  fn role_is_derived_from_enrollment_date() {
    let date = NaiveDate::from_ymd_opt(2023, 9, 15);
    assert_eq!(RoleKind::from_enrollment(date.as_ref()), RoleKind::Student);
    assert_eq!(
      RoleKind::from_enrollment::<NaiveDate>(None),
      RoleKind::Teacher
    );
  }

  #[test]
  fn only_students_have_a_supervisor() {
    let teacher = Role::Teacher(TeacherRole::default());
    assert_eq!(teacher.supervisor(), None);

    let student = Role::Student(StudentRole {
      enrollment_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
      diploma:         "master".into(),
      subject:         "graphs".into(),
      supervisor:      Some(5),
    });
    let member = Member {
      id:      9,
      profile: profile(),
      role:    student,
    };
    assert!(member.is_supervised_by(5));
    assert!(!member.is_supervised_by(6));
  }

  #[test]
  fn validate_reports_every_missing_field() {
    let draft = NewMember {
      profile: Profile {
        email: "not-an-address".into(),
        ..Profile::default()
      },
      role:    Role::Teacher(TeacherRole::default()),
    };
    match draft.validate() {
      Err(Error::Validation(fields)) => assert_eq!(
        fields,
        vec!["cin", "name", "surname", "email", "password"]
      ),
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn validate_accepts_complete_draft() {
    let draft = NewMember {
      profile: profile(),
      role:    Role::Teacher(TeacherRole::default()),
    };
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn associations_are_listed_per_kind() {
    let full = FullMember {
      member:       Member {
        id:      5,
        profile: profile(),
        role:    Role::Teacher(TeacherRole::default()),
      },
      publications: vec![3],
      events:       vec![4, 6],
      tools:        vec![],
    };
    let all: Vec<_> = full.associations().collect();
    assert_eq!(all, vec![
      (ResourceKind::Publication, 3),
      (ResourceKind::Event, 4),
      (ResourceKind::Event, 6),
    ]);
  }
}
