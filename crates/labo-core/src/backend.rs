//! The backend traits.
//!
//! The traits are implemented by the HTTP client (`labo-client`) and by
//! in-memory fakes in tests. Higher layers (`labo-sync`, `labo-cli`) depend on
//! these abstractions, not on any concrete transport.

use std::future::Future;

use crate::{
  member::{FullMember, Member, MemberId, NewMember},
  resource::{NewResource, Resource, ResourceFields, ResourceId, ResourceKind},
};

// ─── Resources ───────────────────────────────────────────────────────────────

/// CRUD access to one resource collection (publications, events or tools).
///
/// All methods return `Send` futures so implementations can be driven from a
/// multi-threaded tokio runtime.
pub trait ResourceBackend<F: ResourceFields>: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every resource of the collection.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<Resource<F>>, Self::Error>> + Send + '_;

  /// Retrieve a resource by id. Returns `None` if the backend reports it
  /// missing.
  fn get(
    &self,
    id: ResourceId,
  ) -> impl Future<Output = Result<Option<Resource<F>>, Self::Error>> + Send + '_;

  /// Persist a new resource and return it as stored. The returned member set
  /// may be empty even if `input.members` was not.
  fn create(
    &self,
    input: NewResource<F>,
  ) -> impl Future<Output = Result<Resource<F>, Self::Error>> + Send + '_;

  /// Replace the resource's fields (and member references) with `input`.
  fn update(
    &self,
    id: ResourceId,
    input: NewResource<F>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete(
    &self,
    id: ResourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// Access to the member service, including the association and supervision
/// endpoints it owns.
pub trait MemberBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  fn list_members(
    &self,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;

  /// Retrieve a member (with its supervisor reference). `None` if missing.
  fn get_member(
    &self,
    id: MemberId,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  /// Retrieve a member together with its publications, events and tools.
  fn get_full_member(
    &self,
    id: MemberId,
  ) -> impl Future<Output = Result<Option<FullMember>, Self::Error>> + Send + '_;

  fn create_member(
    &self,
    input: NewMember,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn update_member(
    &self,
    id: MemberId,
    input: NewMember,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_member(
    &self,
    id: MemberId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Associations ──────────────────────────────────────────────────────

  /// Associate `member` with the resource `resource` of `kind`.
  fn link(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove the association between `member` and `resource`.
  fn unlink(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Supervision ───────────────────────────────────────────────────────

  /// Set (`Some`) or clear (`None`) the supervisor of a student.
  fn set_supervisor(
    &self,
    student: MemberId,
    supervisor: Option<MemberId>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
