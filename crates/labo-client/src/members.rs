//! [`MemberBackend`] over the member service.
//!
//! | Method | Path |
//! |--------|------|
//! | `GET`    | `/MEMBRE-SERVICE/membres` |
//! | `GET`    | `/MEMBRE-SERVICE/membres/{id}` |
//! | `GET`    | `/MEMBRE-SERVICE/fullmember/{id}` |
//! | `POST`   | `/MEMBRE-SERVICE/membres/{etudiant,enseignant}` |
//! | `PUT`    | `/MEMBRE-SERVICE/membres/{etudiant,enseignant}/{id}` |
//! | `DELETE` | `/MEMBRE-SERVICE/membres/{id}` |
//! | `POST`   | `/MEMBRE-SERVICE/<link endpoint>/{member}/{resource}` |

use labo_core::{
  backend::MemberBackend,
  member::{FullMember, Member, MemberId, NewMember, Role},
  resource::{ResourceId, ResourceKind},
};
use serde_json::json;

use crate::{
  ApiClient, Error, Result,
  wire::{FullMemberIn, MemberIn, MemberOut},
};

const MEMBERS: &str = "/MEMBRE-SERVICE/membres";
const FULL_MEMBER: &str = "/MEMBRE-SERVICE/fullmember";

/// Path segment of the link (`true`) or unlink (`false`) endpoint for `kind`.
fn association_endpoint(kind: ResourceKind, link: bool) -> &'static str {
  match (kind, link) {
    (ResourceKind::Publication, true) => "affecterauteurTopublication",
    (ResourceKind::Publication, false) => "removeauteurTopublication",
    (ResourceKind::Event, true) => "affectermembreToevenement",
    (ResourceKind::Event, false) => "removeMembreToevenement",
    (ResourceKind::Tool, true) => "affectermembreTooutil",
    (ResourceKind::Tool, false) => "removeMembreTooutil",
  }
}

impl ApiClient {
  async fn associate(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
    link: bool,
  ) -> Result<()> {
    let endpoint = association_endpoint(kind, link);
    let path = format!("/MEMBRE-SERVICE/{endpoint}/{member}/{resource}");
    self.post(&path, &json!({})).await
  }
}

impl MemberBackend for ApiClient {
  type Error = Error;

  async fn list_members(&self) -> Result<Vec<Member>> {
    let raw: Vec<MemberIn> = self.get_json(MEMBERS, "members").await?;
    Ok(raw.into_iter().map(Member::from).collect())
  }

  async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
    let raw: Option<MemberIn> =
      self.get_optional(&format!("{MEMBERS}/{id}"), "member").await?;
    Ok(raw.map(Member::from))
  }

  async fn get_full_member(&self, id: MemberId) -> Result<Option<FullMember>> {
    let raw: Option<FullMemberIn> = self
      .get_optional(&format!("{FULL_MEMBER}/{id}"), "full member")
      .await?;
    Ok(raw.map(FullMember::from))
  }

  async fn create_member(&self, input: NewMember) -> Result<()> {
    let body = MemberOut::from(&input);
    self
      .post(&format!("{MEMBERS}/{}", body.segment()), &body)
      .await
  }

  async fn update_member(&self, id: MemberId, input: NewMember) -> Result<()> {
    let body = MemberOut::from(&input);
    self
      .put(&format!("{MEMBERS}/{}/{id}", body.segment()), &body)
      .await
  }

  async fn delete_member(&self, id: MemberId) -> Result<()> {
    self.delete(&format!("{MEMBERS}/{id}")).await
  }

  async fn link(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> Result<()> {
    self.associate(kind, member, resource, true).await
  }

  async fn unlink(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> Result<()> {
    self.associate(kind, member, resource, false).await
  }

  /// The member service has no dedicated supervisor endpoint: the student is
  /// re-read and its full student payload written back with the reference
  /// replaced. Teachers are left untouched.
  async fn set_supervisor(
    &self,
    student: MemberId,
    supervisor: Option<MemberId>,
  ) -> Result<()> {
    let Some(member) = self.get_member(student).await? else {
      return Err(Error::MemberNotFound(student));
    };
    let mut input = member.to_new();
    match &mut input.role {
      Role::Student(s) => s.supervisor = supervisor,
      Role::Teacher(_) => {
        tracing::warn!(member = student, "cannot set the supervisor of a teacher");
        return Ok(());
      }
    }
    self.update_member(student, input).await
  }
}
