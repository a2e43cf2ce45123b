//! `labo members …`

use std::{
  io::{self, BufRead as _, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use labo_client::ApiClient;
use labo_core::member::{
  Member, MemberId, NewMember, Profile, Role, StudentRole, TeacherRole,
};
use labo_sync::{
  Lab,
  cascade::{DeleteOutcome, DependentsPrompt},
};

use crate::Output;

#[derive(Subcommand, Debug)]
pub enum MembersCmd {
  /// List every member.
  List,
  /// Show a member with its supervision and associations.
  Show { id: MemberId },
  /// Register a member.
  Add(AddMember),
  /// Change some fields of a member; the others keep their value.
  Edit(EditMember),
  /// Delete a member. A teacher's students and associations are released
  /// first.
  Delete {
    id:  MemberId,
    /// Do not ask for confirmation.
    #[arg(short, long)]
    yes: bool,
  },
  /// Make TEACHER the supervisor of STUDENT.
  Assign { teacher: MemberId, student: MemberId },
  /// Clear the supervisor of STUDENT.
  Unassign { teacher: MemberId, student: MemberId },
}

#[derive(Args, Debug)]
pub struct AddMember {
  #[arg(long)]
  cin:        String,
  #[arg(long)]
  name:       String,
  #[arg(long)]
  surname:    String,
  #[arg(long)]
  email:      String,
  #[arg(long)]
  password:   String,
  #[arg(long, value_name = "YYYY-MM-DD")]
  birth_date: Option<NaiveDate>,
  /// Image file, stored inline as a data URL.
  #[arg(long, value_name = "FILE")]
  photo:      Option<PathBuf>,
  /// Link to a CV.
  #[arg(long)]
  cv:         Option<String>,
  #[command(subcommand)]
  role:       RoleArgs,
}

#[derive(Subcommand, Debug)]
pub enum RoleArgs {
  Student {
    #[arg(long, value_name = "YYYY-MM-DD")]
    enrolled:   NaiveDate,
    #[arg(long, default_value = "")]
    diploma:    String,
    #[arg(long, default_value = "")]
    subject:    String,
    #[arg(long)]
    supervisor: Option<MemberId>,
  },
  Teacher {
    #[arg(long, default_value = "")]
    grade:       String,
    #[arg(long, default_value = "")]
    institution: String,
  },
}

#[derive(Args, Debug)]
pub struct EditMember {
  id:          MemberId,
  #[arg(long)]
  cin:         Option<String>,
  #[arg(long)]
  name:        Option<String>,
  #[arg(long)]
  surname:     Option<String>,
  #[arg(long)]
  email:       Option<String>,
  #[arg(long)]
  password:    Option<String>,
  #[arg(long, value_name = "YYYY-MM-DD")]
  birth_date:  Option<NaiveDate>,
  #[arg(long, value_name = "FILE")]
  photo:       Option<PathBuf>,
  #[arg(long)]
  cv:          Option<String>,
  /// Students only.
  #[arg(long, value_name = "YYYY-MM-DD")]
  enrolled:    Option<NaiveDate>,
  /// Students only.
  #[arg(long)]
  diploma:     Option<String>,
  /// Students only.
  #[arg(long)]
  subject:     Option<String>,
  /// Teachers only.
  #[arg(long)]
  grade:       Option<String>,
  /// Teachers only.
  #[arg(long)]
  institution: Option<String>,
}

impl EditMember {
  /// Overlay the given flags on `current`.
  fn apply(self, current: &Member) -> Result<NewMember> {
    let mut draft = current.to_new();
    let p = &mut draft.profile;
    overlay(&mut p.cin, self.cin);
    overlay(&mut p.name, self.name);
    overlay(&mut p.surname, self.surname);
    overlay(&mut p.email, self.email);
    overlay(&mut p.password, self.password);
    if self.birth_date.is_some() {
      p.birth_date = self.birth_date;
    }
    if let Some(photo) = self.photo.as_deref() {
      p.photo = Some(data_url(photo)?);
    }
    if self.cv.is_some() {
      p.cv = self.cv;
    }

    match &mut draft.role {
      Role::Student(s) => {
        if self.grade.is_some() || self.institution.is_some() {
          bail!("member {} is a student; --grade and --institution do not apply", current.id);
        }
        overlay(&mut s.enrollment_date, self.enrolled);
        overlay(&mut s.diploma, self.diploma);
        overlay(&mut s.subject, self.subject);
      }
      Role::Teacher(t) => {
        if self.enrolled.is_some() || self.diploma.is_some() || self.subject.is_some() {
          bail!(
            "member {} is a teacher; --enrolled, --diploma and --subject do not apply",
            current.id
          );
        }
        overlay(&mut t.grade, self.grade);
        overlay(&mut t.institution, self.institution);
      }
    }
    Ok(draft)
  }
}

fn overlay<T>(field: &mut T, value: Option<T>) {
  if let Some(value) = value {
    *field = value;
  }
}

impl AddMember {
  fn into_new(self) -> Result<NewMember> {
    let photo = self.photo.as_deref().map(data_url).transpose()?;
    let role = match self.role {
      RoleArgs::Student {
        enrolled,
        diploma,
        subject,
        supervisor,
      } => Role::Student(StudentRole {
        enrollment_date: enrolled,
        diploma,
        subject,
        supervisor,
      }),
      RoleArgs::Teacher { grade, institution } => {
        Role::Teacher(TeacherRole { grade, institution })
      }
    };
    Ok(NewMember {
      profile: Profile {
        cin: self.cin,
        name: self.name,
        surname: self.surname,
        birth_date: self.birth_date,
        email: self.email,
        password: self.password,
        photo,
        cv: self.cv,
      },
      role,
    })
  }
}

pub async fn run(lab: &Lab<ApiClient>, cmd: MembersCmd, out: Output) -> Result<()> {
  match cmd {
    MembersCmd::List => {
      let members = lab.members().await;
      out.emit(&members, |all| all.iter().for_each(print_row))
    }
    MembersCmd::Show { id } => {
      let detail = lab.member_detail(id).await?;
      let view = serde_json::json!({
        "member": detail.member,
        "supervisor": detail.supervisor,
        "students": detail.students,
        "associations": detail.associations,
      });
      out.emit(&view, |_| {
        print_row(&detail.member);
        if let Some(sup) = &detail.supervisor {
          println!("supervised by {} ({})", sup.display_name(), sup.id);
        }
        for s in &detail.students {
          println!("supervises   {} ({})", s.display_name(), s.id);
        }
        let a = &detail.associations;
        println!("publications {:?}", a.publications);
        println!("events       {:?}", a.events);
        println!("tools        {:?}", a.tools);
      })
    }
    MembersCmd::Add(args) => {
      let draft = args.into_new()?;
      lab.add_member(draft).await?;
      tracing::info!("member created");
      Ok(())
    }
    MembersCmd::Edit(args) => {
      let id = args.id;
      let current = lab.member(id).await?;
      let draft = args.apply(&current)?;
      lab.update_member(id, draft).await?;
      Ok(())
    }
    MembersCmd::Delete { id, yes } => {
      let confirm = |prompt: &DependentsPrompt| yes || ask(&prompt.message());
      match lab.delete_member(id, &confirm).await? {
        DeleteOutcome::Deleted(applied) => out.emit(&applied, |a| {
          println!(
            "member {id} deleted ({} supervision(s) cleared, {} association(s) removed)",
            a.cleared_supervisions.len(),
            a.removed_associations.len()
          )
        }),
        DeleteOutcome::AbortedByUser => {
          println!("deletion cancelled");
          Ok(())
        }
      }
    }
    MembersCmd::Assign { teacher, student } => {
      let mut detail = lab.member_detail(teacher).await?;
      let Some(candidate) = detail
        .available_students()
        .await
        .into_iter()
        .find(|m| m.id == student)
      else {
        bail!("member {student} is not a student without a supervisor");
      };
      detail.assign_student(candidate).await?;
      Ok(())
    }
    MembersCmd::Unassign { teacher, student } => {
      let mut detail = lab.member_detail(teacher).await?;
      detail.remove_student(student).await?;
      Ok(())
    }
  }
}

fn print_row(m: &Member) {
  let extra = match m.supervisor() {
    Some(sup) => format!("  supervisor {sup}"),
    None => String::new(),
  };
  println!(
    "{:>5}  {:<8} {:<32} {}{extra}",
    m.id,
    m.role.kind(),
    m.display_name(),
    m.profile.email
  );
}

/// Ask a yes/no question on the terminal. Anything but "y" declines.
fn ask(question: &str) -> bool {
  print!("{question} [y/N] ");
  io::stdout().flush().ok();
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line).is_err() {
    return false;
  }
  matches!(line.trim(), "y" | "Y" | "yes")
}

/// Inline an image file as a `data:` URL.
fn data_url(path: &Path) -> Result<String> {
  let bytes =
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);
  let mime = match ext.as_deref() {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    _ => "application/octet-stream",
  };
  Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
