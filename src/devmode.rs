//! Detection and maintenance of the development-mode marker file.
//!
//! The bundler hook drops a `.dev` file into the site root while its dev
//! server is running and removes it when a build starts. The resolver only
//! ever reads the marker; the write/remove halves exist for the hook binary.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::ResolverError;

const MARKER_FILE: &str = ".dev";
const MARKER_KEY: &str = "VITE_SERVER";

/// Outcome of probing the marker file.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerState {
  /// No marker file exists, the site is serving a production build.
  Absent,
  /// The dev server is running at the advertised origin.
  Present {
    /// Origin parsed from the marker, e.g. `http://localhost:5173`.
    origin: String,
  },
}

/// Location of the marker file within a site root.
pub fn marker_path(root: &Path) -> PathBuf {
  root.join(MARKER_FILE)
}

/// Check for the marker file and parse the origin it advertises.
///
/// A present but malformed marker is a configuration error; the caller decides
/// whether to surface it or degrade to production.
pub fn probe(root: &Path) -> Result<MarkerState, ResolverError> {
  let path = marker_path(root);
  let content = match fs::read_to_string(&path) {
    Ok(content) => content,
    Err(_) => return Ok(MarkerState::Absent),
  };

  let line_pattern =
    Regex::new(&format!(r"^{MARKER_KEY}=(\S+)\s*$")).expect("invalid marker regex");
  match line_pattern.captures(content.trim()) {
    Some(captures) => Ok(MarkerState::Present {
      origin: captures[1].to_string(),
    }),
    None => Err(ResolverError::MarkerFile { path }),
  }
}

/// Write the marker file announcing a running dev server.
pub fn write_marker(root: &Path, origin: &str) -> Result<()> {
  let path = marker_path(root);
  fs::write(&path, format!("{MARKER_KEY}={origin}"))
    .with_context(|| format!("failed to write dev marker at {}", path.display()))
}

/// Remove the marker file. Removing an already absent marker is not an error.
pub fn remove_marker(root: &Path) -> Result<()> {
  let path = marker_path(root);
  match fs::remove_file(&path) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => {
      Err(err).with_context(|| format!("failed to remove dev marker at {}", path.display()))
    }
  }
}
