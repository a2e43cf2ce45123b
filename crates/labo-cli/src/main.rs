//! `labo`: command-line console for the laboratory services.
//!
//! # Usage
//!
//! ```
//! labo                                  # dashboard or member list
//! labo members show 5
//! labo members delete 5 --yes
//! labo tools members 8 2 3              # tool 8 is now maintained by 2 and 3
//! labo --config ~/.config/labo.toml dashboard
//! ```

mod members;
mod resources;
mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use labo_client::ApiClient;
use labo_core::landing::{Landing, landing_for};
use labo_sync::Lab;
use serde::Serialize;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "labo", version, about = "Console for the laboratory services")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "labo.toml")]
  config: PathBuf,

  /// Gateway base URL; overrides the configuration.
  #[arg(long)]
  url: Option<String>,

  /// Bearer token attached to every request.
  #[arg(long)]
  token: Option<String>,

  /// Address of the signed-in user; picks the default view.
  #[arg(long = "as", value_name = "EMAIL")]
  user_email: Option<String>,

  /// Print JSON instead of text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Students and teachers.
  #[command(subcommand)]
  Members(members::MembersCmd),
  #[command(subcommand)]
  Publications(resources::PublicationCmd),
  #[command(subcommand)]
  Events(resources::EventCmd),
  #[command(subcommand)]
  Tools(resources::ToolCmd),
  /// Laboratory figures.
  Dashboard,
}

// ─── Output ───────────────────────────────────────────────────────────────────

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub struct Output {
  json: bool,
}

impl Output {
  /// Print `value` as JSON, or run `text` to print it for humans.
  pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value).context("encoding output")?);
    } else {
      text(value);
    }
    Ok(())
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Flags override the file and the environment.
  let mut settings = Settings::load(&args.config)?;
  if let Some(url) = args.url {
    settings.base_url = url;
  }
  if args.token.is_some() {
    settings.token = args.token;
  }
  if args.user_email.is_some() {
    settings.user_email = args.user_email;
  }

  let client = ApiClient::new(settings.api_config()).context("building HTTP client")?;
  tracing::debug!(base_url = client.base_url(), "gateway configured");
  let lab = Lab::with_cache_ttl(client, settings.cache_ttl());
  let out = Output { json: args.json };

  let command = match args.command {
    Some(command) => command,
    None => {
      let email = settings.user_email.as_deref().unwrap_or_default();
      match landing_for(email, &settings.admin_email) {
        Landing::Dashboard => Command::Dashboard,
        Landing::MemberList => Command::Members(members::MembersCmd::List),
      }
    }
  };

  match command {
    Command::Members(cmd) => members::run(&lab, cmd, out).await,
    Command::Publications(cmd) => resources::run_publications(&lab, cmd, out).await,
    Command::Events(cmd) => resources::run_events(&lab, cmd, out).await,
    Command::Tools(cmd) => resources::run_tools(&lab, cmd, out).await,
    Command::Dashboard => dashboard(&lab, out).await,
  }
}

async fn dashboard(lab: &Lab<ApiClient>, out: Output) -> Result<()> {
  let stats = lab.dashboard().await;
  out.emit(&stats, |s| {
    println!(
      "members {}  (teachers {}, students {})",
      s.members, s.teachers, s.students
    );
    println!(
      "publications {}  events {}  tools {}",
      s.publications, s.events, s.tools
    );
    println!();
    for row in &s.publications_per_member {
      println!("{:>5}  {:<32} {}", row.member, row.name, row.publications);
    }
  })
}
