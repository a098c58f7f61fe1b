//! Bundler hook mirroring the dev-server/build lifecycle of the companion
//! bundler plugin: `dev-start` announces a running dev server through the
//! marker file, `build-start` clears it, and `sync-config` regenerates the
//! config artifact the resolver reads at discovery time.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vite_bridge::{GeneratedConfig, devmode};

#[derive(Parser)]
#[command(
  name = "vite-bridge",
  version,
  about = "Maintain the dev marker and config artifact for vite_bridge sites"
)]
struct Cli {
  /// Site root holding the marker file and config artifact.
  #[arg(long, default_value = ".")]
  root: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Write the marker file announcing a running dev server.
  DevStart {
    /// Dev-server origin, e.g. `http://localhost:5173`.
    #[arg(long)]
    server: String,
  },
  /// Remove the marker file when a production build starts.
  BuildStart,
  /// Regenerate the config artifact from the bundler's resolved settings.
  SyncConfig {
    /// Bundler source root relative to the project root.
    #[arg(long)]
    root_dir: Option<String>,
    /// Build output directory relative to the project root.
    #[arg(long)]
    out_dir: Option<String>,
    /// Assets directory inside the output directory.
    #[arg(long)]
    assets_dir: Option<String>,
    /// Whether a legacy build is configured.
    #[arg(long)]
    legacy: bool,
    /// Manifest file name when the bundler overrides the default.
    #[arg(long)]
    manifest: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();
  match cli.command {
    Command::DevStart { server } => {
      devmode::write_marker(&cli.root, &server)?;
      info!(origin = %server, "dev marker written");
    }
    Command::BuildStart => {
      devmode::remove_marker(&cli.root)?;
      info!("dev marker cleared");
    }
    Command::SyncConfig {
      root_dir,
      out_dir,
      assets_dir,
      legacy,
      manifest,
    } => {
      let artifact = GeneratedConfig {
        root_dir,
        out_dir,
        assets_dir,
        legacy: Some(legacy),
        manifest,
      };
      if artifact.write_if_changed(&cli.root)? {
        info!("config artifact updated");
      } else {
        debug!("config artifact already up to date");
      }
    }
  }
  Ok(())
}
