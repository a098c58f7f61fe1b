//! Failure taxonomy for asset resolution.

use std::path::PathBuf;

/// Errors produced while resolving assets against the marker file and manifest.
///
/// Whether a variant surfaces to the caller depends on the configured failure
/// policy: with `debug` enabled every lookup failure is returned, otherwise the
/// resolver substitutes an absent result so a missing asset never breaks a
/// page render.
#[derive(Debug)]
pub enum ResolverError {
  /// The dev marker file exists but does not contain a `VITE_SERVER=<origin>` line.
  MarkerFile {
    /// Path of the malformed marker file.
    path: PathBuf,
  },
  /// The manifest file is absent at its expected location.
  ManifestMissing {
    /// Path where the manifest was expected.
    path: PathBuf,
  },
  /// The manifest exists but could not be parsed as a JSON entry map.
  ManifestParse {
    /// Path of the unparsable manifest.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// The requested entry key is not present in the manifest.
  ManifestEntryMissing {
    /// Entry key that was looked up.
    entry: String,
  },
  /// The entry exists but lacks the requested property.
  ManifestPropertyMissing {
    /// Entry key that was looked up.
    entry: String,
    /// Name of the missing property.
    property: &'static str,
  },
}

impl std::fmt::Display for ResolverError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::MarkerFile { path } => {
        write!(
          f,
          "marker file {} is malformed, expected a single `VITE_SERVER=<origin>` line",
          path.display()
        )
      }
      Self::ManifestMissing { path } => {
        write!(f, "manifest does not exist at {}", path.display())
      }
      Self::ManifestParse { path, source } => {
        write!(f, "failed to parse manifest {}: {}", path.display(), source)
      }
      Self::ManifestEntryMissing { entry } => {
        write!(f, "no manifest entry exists for `{entry}`")
      }
      Self::ManifestPropertyMissing { entry, property } => {
        write!(f, "manifest entry `{entry}` has no `{property}`")
      }
    }
  }
}

impl std::error::Error for ResolverError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::ManifestParse { source, .. } => Some(source),
      _ => None,
    }
  }
}
