//! `labo publications|events|tools …`

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use labo_client::{ApiClient, WireResource};
use labo_core::{
  member::MemberId,
  resource::{
    EventFields, NewResource, PublicationFields, Resource, ResourceFields,
    ResourceId, ToolFields,
  },
};
use labo_sync::{Lab, lab::Editor, sync::SyncReport};
use serde::Serialize;

use crate::Output;

/// Operations every resource kind supports.
#[derive(Subcommand, Debug)]
pub enum CommonCmd {
  /// List every entry.
  List,
  /// Replace the members associated with an entry.
  Members {
    id:      ResourceId,
    members: Vec<MemberId>,
  },
  /// Delete an entry.
  Delete { id: ResourceId },
}

// ─── Publications ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum PublicationCmd {
  #[command(flatten)]
  Common(CommonCmd),
  /// Create a publication and associate its authors.
  Create(PublicationDraft),
  /// Change some fields of a publication.
  Update(PublicationUpdate),
}

#[derive(Args, Debug)]
pub struct PublicationUpdate {
  id:       ResourceId,
  #[arg(long = "type")]
  category: Option<String>,
  #[arg(long)]
  title:    Option<String>,
  #[arg(long)]
  link:     Option<String>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  date:     Option<NaiveDate>,
  #[arg(long)]
  pdf:      Option<String>,
  /// Replaces the authors when given; repeat for several.
  #[arg(long = "member")]
  members:  Vec<MemberId>,
}

impl PublicationUpdate {
  fn apply(self, f: &mut PublicationFields) {
    overlay(&mut f.category, self.category);
    overlay(&mut f.title, self.title);
    if self.link.is_some() {
      f.link = self.link;
    }
    if self.date.is_some() {
      f.date = self.date;
    }
    if self.pdf.is_some() {
      f.pdf_source = self.pdf;
    }
  }
}

#[derive(Args, Debug)]
pub struct PublicationDraft {
  /// Category, e.g. "article" or "conference".
  #[arg(long = "type")]
  category: String,
  #[arg(long)]
  title:    String,
  #[arg(long)]
  link:     Option<String>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  date:     Option<NaiveDate>,
  /// Link to the PDF.
  #[arg(long)]
  pdf:      Option<String>,
  /// Author id; repeat for several.
  #[arg(long = "member")]
  members:  Vec<MemberId>,
}

pub async fn run_publications(
  lab: &Lab<ApiClient>,
  cmd: PublicationCmd,
  out: Output,
) -> Result<()> {
  let editor = lab.publications();
  match cmd {
    PublicationCmd::Common(cmd) => run_common(editor, cmd, out, publication_row).await,
    PublicationCmd::Create(d) => {
      let fields = PublicationFields {
        category:   d.category,
        title:      d.title,
        link:       d.link,
        date:       d.date,
        pdf_source: d.pdf,
      };
      create(editor, NewResource::new(fields, d.members), out).await
    }
    PublicationCmd::Update(u) => {
      let (id, members) = (u.id, u.members.clone());
      update(editor, id, members, |f| u.apply(f), out).await
    }
  }
}

fn publication_row(p: &Resource<PublicationFields>) {
  println!(
    "{:>5}  {:<12} {:<10} {}  {:?}",
    p.id,
    p.fields.category,
    day(p.fields.date),
    p.fields.title,
    p.members
  );
}

// ─── Events ───────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum EventCmd {
  #[command(flatten)]
  Common(CommonCmd),
  /// Create an event and associate its participants.
  Create(EventDraft),
  /// Change some fields of an event.
  Update(EventUpdate),
}

#[derive(Args, Debug)]
pub struct EventUpdate {
  id:       ResourceId,
  #[arg(long)]
  title:    Option<String>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  start:    Option<NaiveDate>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  end:      Option<NaiveDate>,
  #[arg(long)]
  location: Option<String>,
  /// Replaces the participants when given; repeat for several.
  #[arg(long = "member")]
  members:  Vec<MemberId>,
}

impl EventUpdate {
  fn apply(self, f: &mut EventFields) {
    overlay(&mut f.title, self.title);
    if self.start.is_some() {
      f.start = self.start;
    }
    if self.end.is_some() {
      f.end = self.end;
    }
    overlay(&mut f.location, self.location);
  }
}

#[derive(Args, Debug)]
pub struct EventDraft {
  #[arg(long)]
  title:    String,
  #[arg(long, value_name = "YYYY-MM-DD")]
  start:    Option<NaiveDate>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  end:      Option<NaiveDate>,
  #[arg(long, default_value = "")]
  location: String,
  /// Participant id; repeat for several.
  #[arg(long = "member")]
  members:  Vec<MemberId>,
}

pub async fn run_events(lab: &Lab<ApiClient>, cmd: EventCmd, out: Output) -> Result<()> {
  let editor = lab.events();
  match cmd {
    EventCmd::Common(cmd) => run_common(editor, cmd, out, event_row).await,
    EventCmd::Create(d) => {
      let fields = EventFields {
        title:    d.title,
        start:    d.start,
        end:      d.end,
        location: d.location,
      };
      create(editor, NewResource::new(fields, d.members), out).await
    }
    EventCmd::Update(u) => {
      let (id, members) = (u.id, u.members.clone());
      update(editor, id, members, |f| u.apply(f), out).await
    }
  }
}

fn event_row(e: &Resource<EventFields>) {
  println!(
    "{:>5}  {} → {}  {} @ {}  {:?}",
    e.id,
    day(e.fields.start),
    day(e.fields.end),
    e.fields.title,
    e.fields.location,
    e.members
  );
}

// ─── Tools ────────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum ToolCmd {
  #[command(flatten)]
  Common(CommonCmd),
  /// Register a tool and associate its maintainers.
  Create(ToolDraft),
  /// Change some fields of a tool.
  Update(ToolUpdate),
}

#[derive(Args, Debug)]
pub struct ToolUpdate {
  id:      ResourceId,
  #[arg(long)]
  source:  Option<String>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  date:    Option<NaiveDate>,
  /// Replaces the maintainers when given; repeat for several.
  #[arg(long = "member")]
  members: Vec<MemberId>,
}

impl ToolUpdate {
  fn apply(self, f: &mut ToolFields) {
    overlay(&mut f.source, self.source);
    if self.date.is_some() {
      f.date = self.date;
    }
  }
}

#[derive(Args, Debug)]
pub struct ToolDraft {
  /// Repository or download link.
  #[arg(long)]
  source:  String,
  #[arg(long, value_name = "YYYY-MM-DD")]
  date:    Option<NaiveDate>,
  /// Maintainer id; repeat for several.
  #[arg(long = "member")]
  members: Vec<MemberId>,
}

pub async fn run_tools(lab: &Lab<ApiClient>, cmd: ToolCmd, out: Output) -> Result<()> {
  let editor = lab.tools();
  match cmd {
    ToolCmd::Common(cmd) => run_common(editor, cmd, out, tool_row).await,
    ToolCmd::Create(d) => {
      let fields = ToolFields {
        date:   d.date,
        source: d.source,
      };
      create(editor, NewResource::new(fields, d.members), out).await
    }
    ToolCmd::Update(u) => {
      let (id, members) = (u.id, u.members.clone());
      update(editor, id, members, |f| u.apply(f), out).await
    }
  }
}

fn tool_row(t: &Resource<ToolFields>) {
  println!("{:>5}  {:<10} {}  {:?}", t.id, day(t.fields.date), t.fields.source, t.members);
}

// ─── Shared ───────────────────────────────────────────────────────────────────

async fn run_common<F>(
  editor: &Editor<F, ApiClient>,
  cmd: CommonCmd,
  out: Output,
  row: fn(&Resource<F>),
) -> Result<()>
where
  F: WireResource + Serialize,
{
  match cmd {
    CommonCmd::List => {
      let all = editor.list().await;
      out.emit(&all, |all| all.iter().for_each(row))
    }
    CommonCmd::Members { id, members } => {
      let current = editor.client().get(id).await?;
      let draft = NewResource::new(current.fields, members);
      let report = editor.update(id, draft).await?;
      out.emit(&report, print_report)
    }
    CommonCmd::Delete { id } => {
      editor.delete(id).await?;
      println!("{} {id} deleted", F::KIND);
      Ok(())
    }
  }
}

async fn create<F>(
  editor: &Editor<F, ApiClient>,
  draft: NewResource<F>,
  out: Output,
) -> Result<()>
where
  F: WireResource + Serialize,
{
  let saved = editor.create(draft).await?;
  out.emit(&saved.resource, |r| {
    println!("{} {} created", F::KIND, r.id);
    print_report(&saved.report);
  })
}

/// Read the entry, let `edit` change its fields, and write it back. An empty
/// `members` keeps the current associations.
async fn update<F>(
  editor: &Editor<F, ApiClient>,
  id: ResourceId,
  members: Vec<MemberId>,
  edit: impl FnOnce(&mut F),
  out: Output,
) -> Result<()>
where
  F: WireResource + Serialize,
{
  let current = editor.client().get(id).await?;
  let draft = edit_draft(current, members, edit);
  let report = editor.update(id, draft).await?;
  out.emit(&report, print_report)
}

fn edit_draft<F: ResourceFields>(
  current: Resource<F>,
  members: Vec<MemberId>,
  edit: impl FnOnce(&mut F),
) -> NewResource<F> {
  let mut draft = current.to_new();
  edit(&mut draft.fields);
  if !members.is_empty() {
    draft.members = members.into_iter().collect();
  }
  draft
}

fn overlay<T>(field: &mut T, value: Option<T>) {
  if let Some(value) = value {
    *field = value;
  }
}

fn print_report(report: &SyncReport) {
  if report.is_complete() {
    println!("members {:?}", report.touched());
  } else {
    println!(
      "some associations failed: not linked {:?}, not unlinked {:?}",
      report.failed_adds, report.failed_removes
    );
  }
}

fn day(d: Option<NaiveDate>) -> String {
  d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
