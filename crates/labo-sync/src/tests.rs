//! Flow tests against an in-memory backend that records every mutating call.

use std::{
  collections::{BTreeMap, BTreeSet, HashSet},
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::NaiveDate;
use futures::StreamExt;
use labo_core::{
  backend::{MemberBackend, ResourceBackend},
  change::ResourceChange,
  member::{
    FullMember, Member, MemberId, NewMember, Profile, Role, RoleKind,
    StudentRole, TeacherRole,
  },
  resource::{
    EventFields, NewResource, PublicationFields, Resource, ResourceFields,
    ResourceId, ResourceKind, ToolFields,
  },
};
use pretty_assertions::assert_eq;

use crate::{
  Error, Lab,
  bus::ChangeBus,
  cache::AssociationCache,
  cascade::{AppliedSteps, CascadeStage, DeleteOutcome, DependentsPrompt},
  client::ResourceClient,
  sync::{SyncReport, Synchronizer},
};

// ─── Fake backend ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Call {
  Link(ResourceKind, MemberId, ResourceId),
  Unlink(ResourceKind, MemberId, ResourceId),
  SetSupervisor(MemberId, Option<MemberId>),
  CreateMember,
  UpdateMember(MemberId, RoleKind),
  DeleteMember(MemberId),
  Create(ResourceKind),
  Update(ResourceKind, ResourceId),
  Delete(ResourceKind, ResourceId),
  // Reads: never logged, but can be made to fail.
  ListMembers,
  GetMember(MemberId),
  FullMember(MemberId),
  Get(ResourceKind, ResourceId),
}

impl Call {
  fn is_read(&self) -> bool {
    matches!(
      self,
      Self::ListMembers | Self::GetMember(_) | Self::FullMember(_) | Self::Get(..)
    )
  }
}

#[derive(Debug, thiserror::Error)]
#[error("fake backend refused {0:?}")]
struct FakeError(Call);

#[derive(Default)]
struct State {
  members:      BTreeMap<MemberId, Member>,
  publications: BTreeMap<ResourceId, Resource<PublicationFields>>,
  events:       BTreeMap<ResourceId, Resource<EventFields>>,
  tools:        BTreeMap<ResourceId, Resource<ToolFields>>,
  next_id:      ResourceId,
  /// Resource reads come back without their member references.
  omit_members: bool,
  fail:         HashSet<Call>,
  log:          Vec<Call>,
}

impl State {
  fn members_of(
    &mut self,
    kind: ResourceKind,
    id: ResourceId,
  ) -> Option<&mut BTreeSet<MemberId>> {
    match kind {
      ResourceKind::Publication => self.publications.get_mut(&id).map(|r| &mut r.members),
      ResourceKind::Event => self.events.get_mut(&id).map(|r| &mut r.members),
      ResourceKind::Tool => self.tools.get_mut(&id).map(|r| &mut r.members),
    }
  }
}

fn ids_with<F>(table: &BTreeMap<ResourceId, Resource<F>>, member: MemberId) -> Vec<ResourceId> {
  table
    .values()
    .filter(|r| r.members.contains(&member))
    .map(|r| r.id)
    .collect()
}

#[derive(Clone, Default)]
struct Fake {
  state: Arc<Mutex<State>>,
}

impl Fake {
  fn check(&self, call: Call) -> Result<(), FakeError> {
    let mut state = self.state.lock().unwrap();
    if !call.is_read() {
      state.log.push(call.clone());
    }
    if state.fail.contains(&call) {
      Err(FakeError(call))
    } else {
      Ok(())
    }
  }

  fn fail(&self, call: Call) { self.state.lock().unwrap().fail.insert(call); }

  fn calls(&self) -> Vec<Call> { self.state.lock().unwrap().log.clone() }

  fn clear_log(&self) { self.state.lock().unwrap().log.clear(); }

  fn add_member(&self, member: Member) {
    self.state.lock().unwrap().members.insert(member.id, member);
  }

  fn member(&self, id: MemberId) -> Option<Member> {
    self.state.lock().unwrap().members.get(&id).cloned()
  }

  fn add_tool(&self, id: ResourceId, members: &[MemberId]) {
    let tool = Resource {
      id,
      fields: tool_fields(),
      members: members.iter().copied().collect(),
    };
    self.state.lock().unwrap().tools.insert(id, tool);
  }

  fn add_publication(&self, id: ResourceId, members: &[MemberId]) {
    let publication = Resource {
      id,
      fields: PublicationFields {
        category: "article".into(),
        title: format!("Publication {id}"),
        ..PublicationFields::default()
      },
      members: members.iter().copied().collect(),
    };
    self.state.lock().unwrap().publications.insert(id, publication);
  }

  fn add_event(&self, id: ResourceId, members: &[MemberId]) {
    let event = Resource {
      id,
      fields: event_fields(),
      members: members.iter().copied().collect(),
    };
    self.state.lock().unwrap().events.insert(id, event);
  }
}

trait FakeKind: ResourceFields {
  fn table(state: &mut State) -> &mut BTreeMap<ResourceId, Resource<Self>>;
}

impl FakeKind for PublicationFields {
  fn table(state: &mut State) -> &mut BTreeMap<ResourceId, Resource<Self>> {
    &mut state.publications
  }
}

impl FakeKind for EventFields {
  fn table(state: &mut State) -> &mut BTreeMap<ResourceId, Resource<Self>> {
    &mut state.events
  }
}

impl FakeKind for ToolFields {
  fn table(state: &mut State) -> &mut BTreeMap<ResourceId, Resource<Self>> {
    &mut state.tools
  }
}

impl<F: FakeKind> ResourceBackend<F> for Fake {
  type Error = FakeError;

  async fn list(&self) -> Result<Vec<Resource<F>>, FakeError> {
    let mut state = self.state.lock().unwrap();
    Ok(F::table(&mut state).values().cloned().collect())
  }

  async fn get(&self, id: ResourceId) -> Result<Option<Resource<F>>, FakeError> {
    self.check(Call::Get(F::KIND, id))?;
    let mut state = self.state.lock().unwrap();
    let omit = state.omit_members;
    Ok(F::table(&mut state).get(&id).cloned().map(|mut r| {
      if omit {
        r.members.clear();
      }
      r
    }))
  }

  async fn create(&self, input: NewResource<F>) -> Result<Resource<F>, FakeError> {
    self.check(Call::Create(F::KIND))?;
    let mut state = self.state.lock().unwrap();
    state.next_id += 1;
    let id = 100 + state.next_id;
    // Associations are only made through the link endpoints.
    let created = Resource {
      id,
      fields: input.fields,
      members: BTreeSet::new(),
    };
    F::table(&mut state).insert(id, created.clone());
    Ok(created)
  }

  async fn update(&self, id: ResourceId, input: NewResource<F>) -> Result<(), FakeError> {
    self.check(Call::Update(F::KIND, id))?;
    let mut state = self.state.lock().unwrap();
    if let Some(existing) = F::table(&mut state).get_mut(&id) {
      existing.fields = input.fields;
    }
    Ok(())
  }

  async fn delete(&self, id: ResourceId) -> Result<(), FakeError> {
    self.check(Call::Delete(F::KIND, id))?;
    F::table(&mut self.state.lock().unwrap()).remove(&id);
    Ok(())
  }
}

impl MemberBackend for Fake {
  type Error = FakeError;

  async fn list_members(&self) -> Result<Vec<Member>, FakeError> {
    self.check(Call::ListMembers)?;
    Ok(self.state.lock().unwrap().members.values().cloned().collect())
  }

  async fn get_member(&self, id: MemberId) -> Result<Option<Member>, FakeError> {
    self.check(Call::GetMember(id))?;
    Ok(self.member(id))
  }

  async fn get_full_member(&self, id: MemberId) -> Result<Option<FullMember>, FakeError> {
    self.check(Call::FullMember(id))?;
    let state = self.state.lock().unwrap();
    Ok(state.members.get(&id).map(|member| FullMember {
      member:       member.clone(),
      publications: ids_with(&state.publications, id),
      events:       ids_with(&state.events, id),
      tools:        ids_with(&state.tools, id),
    }))
  }

  async fn create_member(&self, input: NewMember) -> Result<(), FakeError> {
    self.check(Call::CreateMember)?;
    let mut state = self.state.lock().unwrap();
    let id = state.members.keys().max().copied().unwrap_or(0) + 1;
    state.members.insert(id, Member {
      id,
      profile: input.profile,
      role: input.role,
    });
    Ok(())
  }

  async fn update_member(&self, id: MemberId, input: NewMember) -> Result<(), FakeError> {
    self.check(Call::UpdateMember(id, input.role.kind()))?;
    let mut state = self.state.lock().unwrap();
    if let Some(m) = state.members.get_mut(&id) {
      m.profile = input.profile;
      m.role = input.role;
    }
    Ok(())
  }

  async fn delete_member(&self, id: MemberId) -> Result<(), FakeError> {
    self.check(Call::DeleteMember(id))?;
    self.state.lock().unwrap().members.remove(&id);
    Ok(())
  }

  async fn link(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> Result<(), FakeError> {
    self.check(Call::Link(kind, member, resource))?;
    if let Some(set) = self.state.lock().unwrap().members_of(kind, resource) {
      set.insert(member);
    }
    Ok(())
  }

  async fn unlink(
    &self,
    kind: ResourceKind,
    member: MemberId,
    resource: ResourceId,
  ) -> Result<(), FakeError> {
    self.check(Call::Unlink(kind, member, resource))?;
    if let Some(set) = self.state.lock().unwrap().members_of(kind, resource) {
      set.remove(&member);
    }
    Ok(())
  }

  async fn set_supervisor(
    &self,
    student: MemberId,
    supervisor: Option<MemberId>,
  ) -> Result<(), FakeError> {
    self.check(Call::SetSupervisor(student, supervisor))?;
    if let Some(Member {
      role: Role::Student(role),
      ..
    }) = self.state.lock().unwrap().members.get_mut(&student)
    {
      role.supervisor = supervisor;
    }
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn profile(id: MemberId) -> Profile {
  Profile {
    cin: format!("{id:08}"),
    name: format!("Name{id}"),
    surname: format!("Surname{id}"),
    email: format!("m{id}@lab.tn"),
    password: "secret".into(),
    ..Profile::default()
  }
}

fn teacher(id: MemberId) -> Member {
  Member {
    id,
    profile: profile(id),
    role: Role::Teacher(TeacherRole {
      grade:       "MC".into(),
      institution: "ENIS".into(),
    }),
  }
}

fn student(id: MemberId, supervisor: Option<MemberId>) -> Member {
  Member {
    id,
    profile: profile(id),
    role: Role::Student(StudentRole {
      enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 15).unwrap(),
      diploma: "master".into(),
      subject: "graphs".into(),
      supervisor,
    }),
  }
}

fn tool_fields() -> ToolFields {
  ToolFields {
    date:   None,
    source: "https://git.lab.tn/solver".into(),
  }
}

fn event_fields() -> EventFields {
  EventFields {
    title:    "Doctoral day".into(),
    start:    NaiveDate::from_ymd_opt(2024, 3, 1),
    end:      NaiveDate::from_ymd_opt(2024, 3, 2),
    location: "Sfax".into(),
  }
}

fn set(ids: &[MemberId]) -> BTreeSet<MemberId> { ids.iter().copied().collect() }

fn drain(sub: &mut crate::bus::Subscription) -> Vec<ResourceChange> {
  std::iter::from_fn(|| sub.try_recv()).collect()
}

/// Teacher 5 supervising students 9 and 11, with student 12 unsupervised.
/// Teacher 5 authored publication 3, attends event 4 and maintains tool 8.
fn teacher_five() -> Fake {
  let fake = Fake::default();
  fake.add_member(teacher(5));
  fake.add_member(student(9, Some(5)));
  fake.add_member(student(11, Some(5)));
  fake.add_member(student(12, None));
  fake.add_publication(3, &[5, 9]);
  fake.add_event(4, &[5]);
  fake.add_tool(8, &[5, 11]);
  fake
}

fn accept(_: &DependentsPrompt) -> bool { true }

fn decline(_: &DependentsPrompt) -> bool { false }

fn never_asked(prompt: &DependentsPrompt) -> bool {
  panic!("unexpected prompt: {}", prompt.message())
}

// ─── Synchroniser ────────────────────────────────────────────────────────────

fn synchroniser(fake: &Fake) -> (Synchronizer<Fake>, ResourceClient<ToolFields, Fake>) {
  let backend = Arc::new(fake.clone());
  let sync = Synchronizer::new(backend.clone(), Arc::new(ChangeBus::new()));
  let client = ResourceClient::new(backend, Duration::from_secs(300));
  (sync, client)
}

#[tokio::test]
async fn tool_members_one_two_become_two_three() {
  let fake = Fake::default();
  fake.add_tool(8, &[1, 2]);
  let (sync, client) = synchroniser(&fake);
  let mut sub = sync.bus().subscribe();

  let report = sync.reconcile(&client, 8, &set(&[1, 2]), &set(&[2, 3])).await;

  assert_eq!(fake.calls(), vec![
    Call::Link(ResourceKind::Tool, 3, 8),
    Call::Unlink(ResourceKind::Tool, 1, 8),
  ]);
  assert_eq!(drain(&mut sub), vec![ResourceChange::new(ResourceKind::Tool, [1, 3])]);
  assert_eq!(report.succeeded_adds, set(&[3]));
  assert_eq!(report.succeeded_removes, set(&[1]));
  assert!(report.is_complete());
  assert_eq!(client.associations(8), Some(set(&[2, 3])));
}

#[tokio::test]
async fn unchanged_members_issue_no_calls() {
  let fake = Fake::default();
  let (sync, client) = synchroniser(&fake);
  let mut sub = sync.bus().subscribe();

  let report = sync.reconcile(&client, 8, &set(&[1, 2]), &set(&[2, 1])).await;

  assert!(fake.calls().is_empty());
  assert!(drain(&mut sub).is_empty());
  assert_eq!(report, SyncReport::default());
  assert_eq!(client.associations(8), Some(set(&[1, 2])));
}

#[tokio::test]
async fn failed_calls_are_reported_and_cache_still_updated() {
  let fake = Fake::default();
  fake.fail(Call::Link(ResourceKind::Tool, 3, 8));
  fake.fail(Call::Unlink(ResourceKind::Tool, 1, 8));
  let (sync, client) = synchroniser(&fake);
  let mut sub = sync.bus().subscribe();

  let report = sync.reconcile(&client, 8, &set(&[1, 2]), &set(&[2, 3, 4])).await;

  assert_eq!(report.succeeded_adds, set(&[4]));
  assert_eq!(report.failed_adds, set(&[3]));
  assert_eq!(report.failed_removes, set(&[1]));
  assert!(!report.is_complete());
  assert_eq!(report.touched(), set(&[4]));
  // Notification carries the intended diff, not the outcome.
  assert_eq!(drain(&mut sub), vec![ResourceChange::new(ResourceKind::Tool, [1, 3, 4])]);
  assert_eq!(client.associations(8), Some(set(&[2, 3, 4])));
}

// ─── Bus and cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn bus_delivers_to_live_subscribers_without_replay() {
  let bus = ChangeBus::new();
  let first = ResourceChange::new(ResourceKind::Event, [1]);
  let second = ResourceChange::new(ResourceKind::Publication, [2, 3]);

  let mut early = bus.subscribe();
  let dropped = bus.subscribe();
  assert_eq!(bus.emit(first.clone()), 2);

  drop(dropped);
  let mut late = bus.subscribe();
  assert_eq!(bus.emit(second.clone()), 2);

  assert_eq!(early.next().await, Some(first));
  assert_eq!(early.next().await, Some(second.clone()));
  assert_eq!(drain(&mut late), vec![second]);
}

#[tokio::test]
async fn subscription_ends_with_the_bus() {
  let bus = ChangeBus::new();
  let mut sub = bus.subscribe();
  drop(bus);
  assert_eq!(sub.recv().await, None);
}

#[test]
fn affects_filters_by_member() {
  let change = ResourceChange::new(ResourceKind::Tool, [1, 3]);
  assert!(change.affects(3));
  assert!(!change.affects(2));
}

#[test]
fn cache_entries_expire() {
  let cache = AssociationCache::new(Duration::ZERO);
  cache.set(8, set(&[1]));
  assert_eq!(cache.get(8), None);

  let cache = AssociationCache::default();
  cache.set(8, set(&[1]));
  cache.set(8, set(&[2]));
  assert_eq!(cache.get(8), Some(set(&[2])));
  assert_eq!(cache.get(9), None);
}

// ─── Cascading delete ────────────────────────────────────────────────────────

#[tokio::test]
async fn student_is_deleted_without_discovery_or_prompt() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());

  let outcome = lab.delete_member(9, &never_asked).await.unwrap();

  assert_eq!(outcome, DeleteOutcome::Deleted(AppliedSteps::default()));
  assert_eq!(fake.calls(), vec![Call::DeleteMember(9)]);
}

#[tokio::test]
async fn teacher_without_students_is_deleted_directly() {
  let fake = Fake::default();
  fake.add_member(teacher(6));
  fake.add_member(student(12, None));
  fake.add_publication(3, &[6]);
  let lab = Lab::new(fake.clone());

  let outcome = lab.delete_member(6, &never_asked).await.unwrap();

  assert_eq!(outcome, DeleteOutcome::Deleted(AppliedSteps::default()));
  assert_eq!(fake.calls(), vec![Call::DeleteMember(6)]);
}

#[tokio::test]
async fn unreadable_member_is_deleted_directly() {
  let fake = teacher_five();
  fake.fail(Call::GetMember(5));
  let lab = Lab::new(fake.clone());

  lab.delete_member(5, &never_asked).await.unwrap();

  assert_eq!(fake.calls(), vec![Call::DeleteMember(5)]);
}

#[tokio::test]
async fn teacher_with_students_is_cleaned_up_then_deleted() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());
  let asked = Mutex::new(None);

  let confirm = |prompt: &DependentsPrompt| {
    *asked.lock().unwrap() = Some(prompt.message());
    let ids: Vec<_> = prompt.students.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![9, 11]);
    true
  };
  let outcome = lab.delete_member(5, &confirm).await.unwrap();

  assert!(asked.lock().unwrap().as_deref().unwrap().contains("2 students"));
  assert_eq!(fake.calls(), vec![
    Call::SetSupervisor(9, None),
    Call::SetSupervisor(11, None),
    Call::Unlink(ResourceKind::Publication, 5, 3),
    Call::Unlink(ResourceKind::Event, 5, 4),
    Call::Unlink(ResourceKind::Tool, 5, 8),
    Call::DeleteMember(5),
  ]);
  assert_eq!(
    outcome,
    DeleteOutcome::Deleted(AppliedSteps {
      cleared_supervisions: vec![9, 11],
      removed_associations: vec![
        (ResourceKind::Publication, 3),
        (ResourceKind::Event, 4),
        (ResourceKind::Tool, 8),
      ],
    })
  );
  assert_eq!(fake.member(9).unwrap().supervisor(), None);
  assert_eq!(fake.member(11).unwrap().supervisor(), None);
  assert!(fake.member(5).is_none());
}

#[tokio::test]
async fn teacher_without_associations_only_clears_students() {
  let fake = Fake::default();
  fake.add_member(teacher(5));
  fake.add_member(student(9, Some(5)));
  let lab = Lab::new(fake.clone());

  lab.delete_member(5, &accept).await.unwrap();

  assert_eq!(fake.calls(), vec![
    Call::SetSupervisor(9, None),
    Call::DeleteMember(5),
  ]);
}

#[tokio::test]
async fn declining_issues_no_calls() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());

  let outcome = lab.delete_member(5, &decline).await.unwrap();

  assert_eq!(outcome, DeleteOutcome::AbortedByUser);
  assert!(fake.calls().is_empty());
  assert!(fake.member(5).is_some());
}

#[tokio::test]
async fn student_discovery_failure_changes_nothing() {
  let fake = teacher_five();
  fake.fail(Call::ListMembers);
  let lab = Lab::new(fake.clone());

  let err = lab.delete_member(5, &never_asked).await.unwrap_err();

  match err {
    Error::PartialCascade { stage, applied, .. } => {
      assert_eq!(stage, CascadeStage::DiscoveringStudents);
      assert!(applied.is_empty());
    }
    other => panic!("expected partial cascade, got {other:?}"),
  }
  assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn failed_supervisor_clear_aborts_before_associations() {
  let fake = teacher_five();
  fake.fail(Call::SetSupervisor(11, None));
  let lab = Lab::new(fake.clone());

  let err = lab.delete_member(5, &accept).await.unwrap_err();

  match err {
    Error::PartialCascade {
      member,
      stage,
      applied,
      ..
    } => {
      assert_eq!(member, 5);
      assert_eq!(stage, CascadeStage::ClearingSupervisions);
      assert_eq!(applied.cleared_supervisions, vec![9]);
      assert!(applied.removed_associations.is_empty());
    }
    other => panic!("expected partial cascade, got {other:?}"),
  }
  assert_eq!(fake.calls(), vec![
    Call::SetSupervisor(9, None),
    Call::SetSupervisor(11, None),
  ]);
  // Not rolled back.
  assert_eq!(fake.member(9).unwrap().supervisor(), None);
}

#[tokio::test]
async fn failed_association_removal_keeps_the_member() {
  let fake = teacher_five();
  fake.fail(Call::Unlink(ResourceKind::Event, 5, 4));
  let lab = Lab::new(fake.clone());

  let err = lab.delete_member(5, &accept).await.unwrap_err();

  match err {
    Error::PartialCascade { stage, applied, .. } => {
      assert_eq!(stage, CascadeStage::RemovingAssociations);
      assert_eq!(applied.cleared_supervisions, vec![9, 11]);
      assert_eq!(applied.removed_associations, vec![
        (ResourceKind::Publication, 3),
        (ResourceKind::Tool, 8),
      ]);
    }
    other => panic!("expected partial cascade, got {other:?}"),
  }
  assert!(!fake.calls().contains(&Call::DeleteMember(5)));
  assert!(fake.member(5).is_some());
}

#[tokio::test]
async fn failed_association_read_aborts() {
  let fake = teacher_five();
  fake.fail(Call::FullMember(5));
  let lab = Lab::new(fake.clone());

  let err = lab.delete_member(5, &accept).await.unwrap_err();

  assert!(matches!(
    err,
    Error::PartialCascade {
      stage: CascadeStage::ReadingAssociations,
      ..
    }
  ));
  assert!(!fake.calls().contains(&Call::DeleteMember(5)));
}

// ─── Resource editor ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_links_every_member_and_notifies_once() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());
  let mut sub = lab.subscribe();

  let saved = lab
    .tools()
    .create(NewResource::new(tool_fields(), [2, 1]))
    .await
    .unwrap();

  let id = saved.resource.id;
  assert_eq!(saved.resource.members, set(&[1, 2]));
  assert!(saved.report.is_complete());
  assert_eq!(fake.calls(), vec![
    Call::Create(ResourceKind::Tool),
    Call::Link(ResourceKind::Tool, 1, id),
    Call::Link(ResourceKind::Tool, 2, id),
  ]);
  assert_eq!(drain(&mut sub), vec![ResourceChange::new(ResourceKind::Tool, [1, 2])]);
  assert_eq!(lab.tools().client().associations(id), Some(set(&[1, 2])));
}

#[tokio::test]
async fn create_rejects_incomplete_draft_before_any_call() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());

  let err = lab
    .events()
    .create(NewResource::new(event_fields(), []))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Core(labo_core::Error::Validation(ref f)) if f == &vec!["members"]));
  assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn failed_create_skips_association() {
  let fake = Fake::default();
  fake.fail(Call::Create(ResourceKind::Tool));
  let lab = Lab::new(fake.clone());

  let err = lab
    .tools()
    .create(NewResource::new(tool_fields(), [1]))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Rejected {
    kind:   ResourceKind::Tool,
    action: "create",
  }));
  assert_eq!(fake.calls(), vec![Call::Create(ResourceKind::Tool)]);
}

#[tokio::test]
async fn update_diffs_against_backend_members() {
  let fake = Fake::default();
  fake.add_tool(8, &[1, 2]);
  let lab = Lab::new(fake.clone());
  let mut sub = lab.subscribe();

  let report = lab
    .tools()
    .update(8, NewResource::new(tool_fields(), [2, 3]))
    .await
    .unwrap();

  assert!(report.is_complete());
  assert_eq!(fake.calls(), vec![
    Call::Update(ResourceKind::Tool, 8),
    Call::Link(ResourceKind::Tool, 3, 8),
    Call::Unlink(ResourceKind::Tool, 1, 8),
  ]);
  assert_eq!(drain(&mut sub), vec![ResourceChange::new(ResourceKind::Tool, [1, 3])]);
}

#[tokio::test]
async fn update_falls_back_to_cached_members() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());
  let saved = lab
    .tools()
    .create(NewResource::new(tool_fields(), [1, 2]))
    .await
    .unwrap();
  let id = saved.resource.id;
  fake.state.lock().unwrap().omit_members = true;
  fake.clear_log();

  lab
    .tools()
    .update(id, NewResource::new(tool_fields(), [2, 3]))
    .await
    .unwrap();

  assert_eq!(fake.calls(), vec![
    Call::Update(ResourceKind::Tool, id),
    Call::Link(ResourceKind::Tool, 3, id),
    Call::Unlink(ResourceKind::Tool, 1, id),
  ]);
}

#[tokio::test]
async fn update_falls_back_to_cache_when_read_fails() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());
  let saved = lab
    .tools()
    .create(NewResource::new(tool_fields(), [1]))
    .await
    .unwrap();
  let id = saved.resource.id;
  fake.fail(Call::Get(ResourceKind::Tool, id));
  fake.clear_log();

  lab
    .tools()
    .update(id, NewResource::new(tool_fields(), [1, 4]))
    .await
    .unwrap();

  assert_eq!(fake.calls(), vec![
    Call::Update(ResourceKind::Tool, id),
    Call::Link(ResourceKind::Tool, 4, id),
  ]);
}

#[tokio::test]
async fn update_of_missing_resource_is_not_found() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());

  let err = lab
    .tools()
    .update(42, NewResource::new(tool_fields(), [1]))
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Core(labo_core::Error::NotFound { id: 42, .. })
  ));
  assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn rejected_update_leaves_associations_alone() {
  let fake = Fake::default();
  fake.add_tool(8, &[1, 2]);
  fake.fail(Call::Update(ResourceKind::Tool, 8));
  let lab = Lab::new(fake.clone());
  let mut sub = lab.subscribe();

  let err = lab
    .tools()
    .update(8, NewResource::new(tool_fields(), [3]))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Rejected { action: "update", .. }));
  assert_eq!(fake.calls(), vec![Call::Update(ResourceKind::Tool, 8)]);
  assert!(drain(&mut sub).is_empty());
}

#[tokio::test]
async fn delete_notifies_former_members() {
  let fake = Fake::default();
  fake.add_publication(3, &[5, 9]);
  let lab = Lab::new(fake.clone());
  let mut sub = lab.subscribe();

  lab.publications().delete(3).await.unwrap();

  assert_eq!(fake.calls(), vec![Call::Delete(ResourceKind::Publication, 3)]);
  assert_eq!(drain(&mut sub), vec![ResourceChange::new(
    ResourceKind::Publication,
    [5, 9]
  )]);
}

#[tokio::test]
async fn list_failure_degrades_to_empty() {
  let fake = Fake::default();
  fake.add_tool(8, &[1]);
  fake.fail(Call::ListMembers);
  let lab = Lab::new(fake.clone());

  assert_eq!(lab.tools().list().await.len(), 1);
  assert!(lab.members().await.is_empty());
}

// ─── Member detail ───────────────────────────────────────────────────────────

#[tokio::test]
async fn teacher_detail_lists_students_and_associations() {
  let lab = Lab::new(teacher_five());

  let detail = lab.member_detail(5).await.unwrap();

  let students: Vec<_> = detail.students.iter().map(|s| s.id).collect();
  assert_eq!(students, vec![9, 11]);
  assert_eq!(detail.associations.publications, vec![3]);
  assert_eq!(detail.associations.events, vec![4]);
  assert_eq!(detail.associations.tools, vec![8]);
  assert!(detail.supervisor.is_none());
}

#[tokio::test]
async fn student_detail_resolves_supervisor() {
  let lab = Lab::new(teacher_five());

  let detail = lab.member_detail(9).await.unwrap();

  assert_eq!(detail.supervisor.as_ref().map(|m| m.id), Some(5));
  assert!(detail.students.is_empty());
  assert_eq!(detail.associations.publications, vec![3]);
}

#[tokio::test]
async fn detail_of_missing_member_is_not_found() {
  let lab = Lab::new(Fake::default());
  let err = lab.member_detail(77).await.err().unwrap();
  assert!(matches!(
    err,
    Error::Core(labo_core::Error::NotFound { kind: "member", id: 77 })
  ));
}

#[tokio::test]
async fn detail_reloads_only_on_relevant_changes() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());
  let mut detail = lab.member_detail(12).await.unwrap();
  assert!(detail.associations.tools.is_empty());

  fake.add_tool(20, &[12]);
  let unrelated = ResourceChange::new(ResourceKind::Tool, [5]);
  assert!(!detail.apply(&unrelated).await);
  assert!(detail.associations.tools.is_empty());

  let relevant = ResourceChange::new(ResourceKind::Tool, [12]);
  assert!(detail.apply(&relevant).await);
  assert_eq!(detail.associations.tools, vec![20]);
}

#[tokio::test]
async fn detail_follows_editor_changes() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());
  let mut detail = lab.member_detail(12).await.unwrap();
  let mut sub = lab.subscribe();

  lab
    .tools()
    .update(8, NewResource::new(tool_fields(), [5, 11, 12]))
    .await
    .unwrap();
  drop(lab);

  detail.follow(&mut sub).await;
  assert_eq!(detail.associations.tools, vec![8]);
}

#[tokio::test]
async fn assigning_and_removing_students() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());
  let mut detail = lab.member_detail(5).await.unwrap();

  let available = detail.available_students().await;
  assert_eq!(available.iter().map(|m| m.id).collect::<Vec<_>>(), vec![12]);

  detail.assign_student(available[0].clone()).await.unwrap();
  detail.remove_student(9).await.unwrap();

  let students: Vec<_> = detail.students.iter().map(|s| s.id).collect();
  assert_eq!(students, vec![11, 12]);
  assert!(detail.students[1].is_supervised_by(5));
  assert_eq!(fake.calls(), vec![
    Call::SetSupervisor(12, Some(5)),
    Call::SetSupervisor(9, None),
  ]);
  assert!(fake.member(12).unwrap().is_supervised_by(5));
}

#[tokio::test]
async fn another_teachers_student_cannot_be_removed() {
  let fake = teacher_five();
  fake.add_member(teacher(6));
  fake.add_member(student(13, Some(6)));
  let lab = Lab::new(fake.clone());
  let mut detail = lab.member_detail(5).await.unwrap();

  let err = detail.remove_student(13).await.unwrap_err();

  assert!(matches!(err, Error::NotSupervised { teacher: 5, student: 13 }));
  assert!(fake.calls().is_empty());
  assert!(fake.member(13).unwrap().is_supervised_by(6));
  assert_eq!(detail.students.len(), 2);
}

#[tokio::test]
async fn students_cannot_supervise() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());
  let mut detail = lab.member_detail(9).await.unwrap();

  let err = detail.remove_student(11).await.unwrap_err();

  assert!(matches!(err, Error::NotATeacher(9)));
  assert!(fake.calls().is_empty());
}

// ─── Members and dashboard ───────────────────────────────────────────────────

#[tokio::test]
async fn add_member_validates_first() {
  let fake = Fake::default();
  let lab = Lab::new(fake.clone());

  let mut draft = teacher(1).to_new();
  draft.profile.email = "nowhere".into();
  let err = lab.add_member(draft).await.unwrap_err();
  assert!(matches!(err, Error::Core(labo_core::Error::Validation(_))));
  assert!(fake.calls().is_empty());

  lab.add_member(student(1, None).to_new()).await.unwrap();
  assert_eq!(fake.calls(), vec![Call::CreateMember]);
}

#[tokio::test]
async fn edited_member_is_written_to_its_role_collection() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());

  let mut draft = lab.member(9).await.unwrap().to_new();
  draft.profile.email = "ines@lab.tn".into();
  lab.update_member(9, draft).await.unwrap();

  let mut draft = lab.member(5).await.unwrap().to_new();
  if let Role::Teacher(role) = &mut draft.role {
    role.grade = "PR".into();
  }
  lab.update_member(5, draft).await.unwrap();

  assert_eq!(fake.calls(), vec![
    Call::UpdateMember(9, RoleKind::Student),
    Call::UpdateMember(5, RoleKind::Teacher),
  ]);
  assert_eq!(fake.member(9).unwrap().profile.email, "ines@lab.tn");
  // The supervisor reference survives an edit.
  assert!(fake.member(9).unwrap().is_supervised_by(5));
}

#[tokio::test]
async fn invalid_member_edit_is_not_written() {
  let fake = teacher_five();
  let lab = Lab::new(fake.clone());

  let mut draft = lab.member(9).await.unwrap().to_new();
  draft.profile.name = " ".into();
  let err = lab.update_member(9, draft).await.unwrap_err();

  assert!(matches!(err, Error::Core(labo_core::Error::Validation(ref f)) if f == &vec!["name"]));
  assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn dashboard_counts_everything() {
  let fake = teacher_five();
  fake.add_publication(30, &[9]);
  fake.fail(Call::FullMember(11));
  let lab = Lab::new(fake.clone());

  let stats = lab.dashboard().await;

  assert_eq!(stats.members, 4);
  assert_eq!(stats.teachers, 1);
  assert_eq!(stats.students, 3);
  assert_eq!(stats.publications, 2);
  assert_eq!(stats.events, 1);
  assert_eq!(stats.tools, 1);
  let per_member: Vec<_> = stats
    .publications_per_member
    .iter()
    .map(|p| (p.member, p.publications))
    .collect();
  assert_eq!(per_member, vec![(5, 1), (9, 2), (11, 0), (12, 0)]);
}
