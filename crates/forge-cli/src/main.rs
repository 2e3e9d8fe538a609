//! `forge`: command-line client for a CollabForge server.
//!
//! # Usage
//!
//! ```text
//! forge --user alice --password secret signup --email alice@example.com
//! forge songs
//! forge --config ~/.config/forge/config.toml release --title "Night Drive" demo.mp3
//! forge like 5f0c...
//! ```

mod client;
mod fmt;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, InlineAudio};
use forge_core::song::VersionCategory;
use serde::Deserialize;
use session::Session;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "forge", about = "Release songs and remix them on CollabForge")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the CollabForge server (default: http://localhost:8080).
  #[arg(long, env = "FORGE_URL")]
  url: Option<String>,

  /// Account username.
  #[arg(long, env = "FORGE_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "FORGE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account with the configured username and password.
  Signup {
    #[arg(long)]
    email: String,
  },
  /// List songs, newest first.
  Songs {
    /// Only songs released by the signed-in user.
    #[arg(long)]
    mine: bool,
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Show one song with every version.
  Show { song_id: Uuid },
  /// Release a new song with its original recording.
  Release {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    /// Mood or genre tags, e.g. "lofi, chill".
    #[arg(long)]
    tags: Option<String>,
    file: PathBuf,
  },
  /// Add a remix or cover to an existing song.
  Remix {
    song_id: Uuid,
    file: PathBuf,
    #[arg(long)]
    notes: Option<String>,
    /// `alter` or `cover`.
    #[arg(long)]
    category: Option<VersionCategory>,
  },
  /// Like a version, or remove your like if it is already there.
  Like { version_id: Uuid },
  /// Your releases, contributions and like totals.
  Dashboard,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn read_config_file(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// CLI flags override the config file, which overrides defaults.
fn resolve(args: &Args, file: ConfigFile) -> ApiConfig {
  fn pick(flag: &Option<String>, file: String) -> Option<String> {
    flag.clone().or_else(|| (!file.is_empty()).then_some(file))
  }
  ApiConfig {
    base_url: pick(&args.url, file.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: pick(&args.user, file.username).unwrap_or_default(),
    password: pick(&args.password, file.password).unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = read_config_file(args.config.as_deref())?;
  let client = ApiClient::new(resolve(&args, file_cfg))?;
  let mut session = Session::new(client);

  run(&mut session, args.command).await
}

async fn run(session: &mut Session, command: Command) -> Result<()> {
  let now = Utc::now();
  match command {
    Command::Signup { email } => {
      let user = session.client().signup(&email).await?;
      println!("Welcome, @{}!", user.username);
    }
    Command::Songs { mine, limit } => {
      let author = if mine {
        Some(session.sign_in().await?.user_id)
      } else {
        None
      };
      session.reload(author, limit).await?;
      let songs = session.state().songs();
      if songs.is_empty() {
        println!("No songs yet.");
      }
      for song in songs {
        println!("{}", fmt::song(song, now, false));
      }
    }
    Command::Show { song_id } => {
      let song = session.client().song(song_id).await?;
      print!("{}", fmt::song(&song, now, true));
    }
    Command::Release {
      title,
      description,
      tags,
      file,
    } => {
      let audio = InlineAudio::read(&file).await?;
      let song = session
        .release(&title, description.as_deref(), tags.as_deref(), audio)
        .await?;
      println!("Released!");
      print!("{}", fmt::song(&song, now, false));
    }
    Command::Remix {
      song_id,
      file,
      notes,
      category,
    } => {
      let audio = InlineAudio::read(&file).await?;
      let song = session
        .remix(song_id, notes.as_deref(), category, audio)
        .await?;
      println!("Version added.");
      print!("{}", fmt::song(&song, now, false));
    }
    Command::Like { version_id } => {
      let outcome = session.toggle_like(version_id).await?;
      let verb = if outcome.liked { "Liked" } else { "Unliked" };
      println!("{verb} ({} likes)", outcome.like_count);
      if outcome.song_completed {
        println!("🎉 \"{}\" is ready for distribution!", outcome.song.song.title);
      }
      if let Some(song) = session.state().song(outcome.song_id) {
        print!("{}", fmt::song(song, now, false));
      }
    }
    Command::Dashboard => {
      let dashboard = session.client().dashboard().await?;
      print!("{}", fmt::dashboard(&dashboard, now));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv).unwrap()
  }

  #[test]
  fn flags_override_file() {
    let file = ConfigFile {
      url:      "http://forge.example".into(),
      username: "file-user".into(),
      password: "file-pass".into(),
    };
    let mut parsed = args(&["forge", "--user", "flag-user", "--password", "flag-pass", "dashboard"]);
    parsed.url = None;
    let cfg = resolve(&parsed, file);
    assert_eq!(cfg.base_url, "http://forge.example");
    assert_eq!(cfg.username, "flag-user");
    assert_eq!(cfg.password, "flag-pass");
  }

  #[test]
  fn defaults_apply_when_unset() {
    let cfg = resolve(&args(&["forge", "--url", "http://x", "songs"]), ConfigFile::default());
    assert_eq!(cfg.base_url, "http://x");

    let mut bare = args(&["forge", "songs"]);
    bare.url = None;
    assert_eq!(resolve(&bare, ConfigFile::default()).base_url, DEFAULT_URL);
  }

  #[test]
  fn parses_config_file() {
    let file: ConfigFile = toml::from_str("url = \"http://a\"\nusername = \"bob\"").unwrap();
    assert_eq!(file.url, "http://a");
    assert_eq!(file.username, "bob");
    assert!(file.password.is_empty());
  }

  #[test]
  fn parses_remix_category() {
    let parsed = args(&[
      "forge", "remix", &Uuid::nil().to_string(), "take.mp3", "--category", "cover",
    ]);
    match parsed.command {
      Command::Remix { category, .. } => assert_eq!(category, Some(VersionCategory::Cover)),
      other => panic!("unexpected command {other:?}"),
    }
  }
}
