//! JSON shapes exchanged with the backend services and their mapping to the
//! domain types.
//!
//! The services grew several spellings for the same logical field over time.
//! Inbound shapes accept all of them (`sourcePdf`/`sourcepdf`,
//! `membres`/`auteurs`, `pubs`/`publications`, ...); outbound shapes always
//! emit the canonical one. Associations are written as `{"id": n}` references
//! and dates as `YYYY-MM-DD`.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use labo_core::{
  member::{
    FullMember, Member, MemberId, NewMember, Profile, Role, RoleKind,
    StudentRole, TeacherRole,
  },
  resource::{
    EventFields, NewResource, PublicationFields, Resource, ResourceFields,
    ToolFields,
  },
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

// ─── Shared pieces ───────────────────────────────────────────────────────────

/// An outbound `{"id": n}` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
  pub id: i64,
}

/// An inbound reference: either a nested object carrying an `id` (other
/// fields ignored) or a bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefIn {
  Id(i64),
  Object { id: i64 },
}

impl RefIn {
  pub fn id(&self) -> i64 {
    match self {
      Self::Id(id) | Self::Object { id } => *id,
    }
  }
}

fn ids(refs: Option<Vec<RefIn>>) -> BTreeSet<i64> {
  refs.unwrap_or_default().iter().map(RefIn::id).collect()
}

fn id_refs(ids: &BTreeSet<i64>) -> Vec<IdRef> {
  ids.iter().map(|&id| IdRef { id }).collect()
}

fn today() -> NaiveDate { Local::now().date_naive() }

/// Parse `YYYY-MM-DD`, tolerating a trailing time component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  let day = raw.get(..10).unwrap_or(raw);
  NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Deserialise an optional, possibly malformed date; anything unparsable
/// reads as absent.
fn lenient_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(de)?;
  Ok(raw.as_deref().and_then(parse_date))
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// A member record as returned by `GET /membres[/{id}]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberIn {
  pub id:               MemberId,
  #[serde(default)]
  pub cin:              Option<String>,
  #[serde(default)]
  pub nom:              Option<String>,
  #[serde(default)]
  pub prenom:           Option<String>,
  #[serde(default, deserialize_with = "lenient_date")]
  pub date_naissance:   Option<NaiveDate>,
  #[serde(default)]
  pub email:            Option<String>,
  #[serde(default)]
  pub password:         Option<String>,
  #[serde(default)]
  pub photo:            Option<String>,
  #[serde(default)]
  pub cv:               Option<String>,
  /// Kept raw: its mere presence decides the role.
  #[serde(default)]
  pub date_inscription: Option<String>,
  #[serde(default)]
  pub diplome:          Option<String>,
  #[serde(default)]
  pub sujet:            Option<String>,
  #[serde(default)]
  pub encadrant:        Option<RefIn>,
  #[serde(default)]
  pub grade:            Option<String>,
  #[serde(default)]
  pub etablissement:    Option<String>,
}

impl From<MemberIn> for Member {
  fn from(m: MemberIn) -> Self {
    let role = match RoleKind::from_enrollment(m.date_inscription.as_ref()) {
      RoleKind::Student => {
        let raw = m.date_inscription.as_deref().unwrap_or_default();
        let enrollment_date = parse_date(raw).unwrap_or_else(|| {
          tracing::warn!(member = m.id, raw, "unparsable enrollment date");
          today()
        });
        Role::Student(StudentRole {
          enrollment_date,
          diploma: m.diplome.unwrap_or_default(),
          subject: m.sujet.unwrap_or_default(),
          supervisor: m.encadrant.as_ref().map(RefIn::id),
        })
      }
      RoleKind::Teacher => Role::Teacher(TeacherRole {
        grade:       m.grade.unwrap_or_default(),
        institution: m.etablissement.unwrap_or_default(),
      }),
    };
    Member {
      id: m.id,
      profile: Profile {
        cin:        m.cin.unwrap_or_default(),
        name:       m.nom.unwrap_or_default(),
        surname:    m.prenom.unwrap_or_default(),
        birth_date: m.date_naissance,
        email:      m.email.unwrap_or_default(),
        password:   m.password.unwrap_or_default(),
        photo:      m.photo,
        cv:         m.cv,
      },
      role,
    }
  }
}

/// The aggregated record returned by `GET /fullmember/{id}`.
///
/// Each association list has several spellings and a record may carry more
/// than one of them; all present lists are merged.
#[derive(Debug, Clone, Deserialize)]
pub struct FullMemberIn {
  #[serde(flatten)]
  pub member:       MemberIn,
  #[serde(default)]
  pub pubs:         Option<Vec<RefIn>>,
  #[serde(default)]
  pub publications: Option<Vec<RefIn>>,
  #[serde(default)]
  pub evts:         Option<Vec<RefIn>>,
  #[serde(default)]
  pub evenements:   Option<Vec<RefIn>>,
  #[serde(default)]
  pub events:       Option<Vec<RefIn>>,
  #[serde(default)]
  pub outils:       Option<Vec<RefIn>>,
}

fn merged(lists: impl IntoIterator<Item = Option<Vec<RefIn>>>) -> Vec<i64> {
  let all: BTreeSet<i64> = lists.into_iter().flat_map(ids).collect();
  all.into_iter().collect()
}

impl From<FullMemberIn> for FullMember {
  fn from(f: FullMemberIn) -> Self {
    FullMember {
      member:       f.member.into(),
      publications: merged([f.pubs, f.publications]),
      events:       merged([f.evts, f.evenements, f.events]),
      tools:        merged([f.outils]),
    }
  }
}

/// Personal fields common to both outbound member payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOut {
  pub cin:            String,
  pub nom:            String,
  pub prenom:         String,
  pub date_naissance: NaiveDate,
  pub email:          String,
  pub password:       String,
  pub photo:          Option<String>,
  pub cv:             String,
}

/// Body of `POST|PUT /membres/etudiant[/{id}]`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOut {
  #[serde(flatten)]
  pub profile:          ProfileOut,
  pub date_inscription: NaiveDate,
  pub diplome:          String,
  pub sujet:            String,
  pub encadrant:        Option<IdRef>,
}

/// Body of `POST|PUT /membres/enseignant[/{id}]`.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherOut {
  #[serde(flatten)]
  pub profile:       ProfileOut,
  pub grade:         String,
  pub etablissement: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MemberOut {
  Student(StudentOut),
  Teacher(TeacherOut),
}

impl MemberOut {
  /// The role-specific collection segment: `etudiant` or `enseignant`.
  pub fn segment(&self) -> &'static str {
    match self {
      Self::Student(_) => "etudiant",
      Self::Teacher(_) => "enseignant",
    }
  }
}

impl From<&NewMember> for MemberOut {
  fn from(m: &NewMember) -> Self {
    let p = &m.profile;
    let profile = ProfileOut {
      cin:            p.cin.clone(),
      nom:            p.name.clone(),
      prenom:         p.surname.clone(),
      date_naissance: p.birth_date.unwrap_or_else(today),
      email:          p.email.clone(),
      password:       p.password.clone(),
      photo:          p.photo.clone(),
      cv:             p.cv.clone().unwrap_or_default(),
    };
    match &m.role {
      Role::Student(s) => Self::Student(StudentOut {
        profile,
        date_inscription: s.enrollment_date,
        diplome: s.diploma.clone(),
        sujet: s.subject.clone(),
        encadrant: s.supervisor.map(|id| IdRef { id }),
      }),
      Role::Teacher(t) => Self::Teacher(TeacherOut {
        profile,
        grade: t.grade.clone(),
        etablissement: t.institution.clone(),
      }),
    }
  }
}

// ─── Resources ───────────────────────────────────────────────────────────────

/// Wire mapping for one resource kind.
pub trait WireResource: ResourceFields {
  /// Collection path under the gateway, e.g. `/OUTIL-SERVICE/outils`.
  const PATH: &'static str;

  type In: DeserializeOwned + Send + 'static;
  type Out: Serialize + Send + Sync + 'static;

  fn from_wire(raw: Self::In) -> Resource<Self>;

  fn to_wire(input: &NewResource<Self>) -> Self::Out;
}

// ── Publications ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationIn {
  pub id:         i64,
  #[serde(default, rename = "type")]
  pub category:   Option<String>,
  #[serde(default)]
  pub titre:      Option<String>,
  #[serde(default)]
  pub lien:       Option<String>,
  #[serde(default, deserialize_with = "lenient_date")]
  pub date:       Option<NaiveDate>,
  #[serde(default)]
  pub source_pdf: Option<String>,
  /// Older spelling of `sourcePdf`; used when that one is absent or null.
  #[serde(default)]
  pub sourcepdf:  Option<String>,
  #[serde(default)]
  pub membres:    Option<Vec<RefIn>>,
  /// Older spelling of `membres`; used when that one is absent or null.
  #[serde(default)]
  pub auteurs:    Option<Vec<RefIn>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicationOut {
  #[serde(rename = "type")]
  pub category:  String,
  pub titre:     String,
  pub lien:      Option<String>,
  pub date:      Option<NaiveDate>,
  pub sourcepdf: Option<String>,
  pub membres:   Vec<IdRef>,
}

impl WireResource for PublicationFields {
  const PATH: &'static str = "/PUBLICATION-SERVICE/publications";

  type In = PublicationIn;
  type Out = PublicationOut;

  fn from_wire(p: PublicationIn) -> Resource<Self> {
    Resource {
      id:      p.id,
      fields:  PublicationFields {
        category:   p.category.unwrap_or_default(),
        title:      p.titre.unwrap_or_default(),
        link:       p.lien,
        date:       p.date,
        pdf_source: p.source_pdf.or(p.sourcepdf),
      },
      members: ids(p.membres.or(p.auteurs)),
    }
  }

  fn to_wire(input: &NewResource<Self>) -> PublicationOut {
    let f = &input.fields;
    PublicationOut {
      category:  f.category.clone(),
      titre:     f.title.clone(),
      lien:      f.link.clone(),
      date:      f.date,
      sourcepdf: f.pdf_source.clone(),
      membres:   id_refs(&input.members),
    }
  }
}

// ── Events ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIn {
  pub id:       i64,
  #[serde(default)]
  pub titre:    Option<String>,
  #[serde(default, deserialize_with = "lenient_date")]
  pub date_deb: Option<NaiveDate>,
  #[serde(default, deserialize_with = "lenient_date")]
  pub date_fin: Option<NaiveDate>,
  /// Single-day events from older records only carry `date`.
  #[serde(default, deserialize_with = "lenient_date")]
  pub date:     Option<NaiveDate>,
  #[serde(default)]
  pub lieu:     Option<String>,
  #[serde(default)]
  pub membres:  Option<Vec<RefIn>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOut {
  pub titre:    String,
  pub date_deb: Option<NaiveDate>,
  pub date_fin: Option<NaiveDate>,
  pub lieu:     String,
  pub membres:  Vec<IdRef>,
}

impl WireResource for EventFields {
  const PATH: &'static str = "/EVENEMENT-SERVICE/evenements";

  type In = EventIn;
  type Out = EventOut;

  fn from_wire(e: EventIn) -> Resource<Self> {
    Resource {
      id:      e.id,
      fields:  EventFields {
        title:    e.titre.unwrap_or_default(),
        start:    e.date_deb.or(e.date),
        end:      e.date_fin.or(e.date),
        location: e.lieu.unwrap_or_default(),
      },
      members: ids(e.membres),
    }
  }

  fn to_wire(input: &NewResource<Self>) -> EventOut {
    let f = &input.fields;
    EventOut {
      titre:    f.title.clone(),
      date_deb: f.start,
      date_fin: f.end,
      lieu:     f.location.clone(),
      membres:  id_refs(&input.members),
    }
  }
}

// ── Tools ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ToolIn {
  pub id:      i64,
  #[serde(default, deserialize_with = "lenient_date")]
  pub date:    Option<NaiveDate>,
  #[serde(default)]
  pub source:  Option<String>,
  #[serde(default)]
  pub membres: Option<Vec<RefIn>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolOut {
  pub date:    Option<NaiveDate>,
  pub source:  String,
  pub membres: Vec<IdRef>,
}

impl WireResource for ToolFields {
  const PATH: &'static str = "/OUTIL-SERVICE/outils";

  type In = ToolIn;
  type Out = ToolOut;

  fn from_wire(t: ToolIn) -> Resource<Self> {
    Resource {
      id:      t.id,
      fields:  ToolFields {
        date:   t.date,
        source: t.source.unwrap_or_default(),
      },
      members: ids(t.membres),
    }
  }

  fn to_wire(input: &NewResource<Self>) -> ToolOut {
    ToolOut {
      date:    input.fields.date,
      source:  input.fields.source.clone(),
      membres: id_refs(&input.members),
    }
  }
}
