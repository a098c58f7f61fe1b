//! Loading and interpreting the bundler's build manifest.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ResolverError;

/// Marker suffix identifying the polyfills chunk emitted by a legacy build.
pub const LEGACY_POLYFILLS_MARKER: &str = "legacy-polyfills-legacy";

/// One build output unit, keyed in the manifest by its logical source path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestEntry {
  /// Hashed output path relative to the output directory.
  #[serde(default)]
  pub file: String,
  /// CSS files directly associated with this entry, in emit order.
  #[serde(default)]
  pub css: Vec<String>,
  /// Manifest keys of chunks this entry imports.
  #[serde(default)]
  pub imports: Vec<String>,
}

/// Build manifest mapping logical entry keys to hashed output metadata.
///
/// Loaded once per resolver instance and treated as an immutable snapshot; the
/// bundler is the only writer of the underlying file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
  entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
  /// Read and parse a manifest file.
  pub fn load(path: &Path) -> Result<Self, ResolverError> {
    let content = fs::read_to_string(path).map_err(|_| ResolverError::ManifestMissing {
      path: path.to_path_buf(),
    })?;
    serde_json::from_str(&content).map_err(|source| ResolverError::ManifestParse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Whether the manifest contains no entries.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Look up an entry by key.
  pub fn entry(&self, key: &str) -> Result<&ManifestEntry, ResolverError> {
    self
      .entries
      .get(key)
      .ok_or_else(|| ResolverError::ManifestEntryMissing { entry: key.into() })
  }

  /// Hashed output path for an entry.
  ///
  /// An entry without a `file` value is reported as a missing property rather
  /// than an empty path, so callers never emit a tag pointing at the output
  /// directory itself.
  pub fn file(&self, key: &str) -> Result<&str, ResolverError> {
    let entry = self.entry(key)?;
    if entry.file.is_empty() {
      return Err(ResolverError::ManifestPropertyMissing {
        entry: key.into(),
        property: "file",
      });
    }
    Ok(&entry.file)
  }

  /// All CSS paths an entry pulls in: its own `css` list first, then the CSS
  /// of every chunk reachable through `imports`, depth-first in declared
  /// order. Duplicate paths and already-visited chunks are skipped, so shared
  /// chunks contribute their styles exactly once.
  ///
  /// Import keys that point outside the manifest are ignored; a missing chunk
  /// must not take the page down with it.
  pub fn css_chain(&self, key: &str) -> Result<Vec<&str>, ResolverError> {
    self.entry(key)?;

    let mut visited = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut chain = Vec::new();
    self.collect_css(key, &mut visited, &mut seen, &mut chain);
    Ok(chain)
  }

  fn collect_css<'a>(
    &'a self,
    key: &str,
    visited: &mut BTreeSet<&'a str>,
    seen: &mut BTreeSet<&'a str>,
    chain: &mut Vec<&'a str>,
  ) {
    let Some((key, entry)) = self.entries.get_key_value(key) else {
      return;
    };
    if !visited.insert(key.as_str()) {
      return;
    }

    for css in &entry.css {
      if seen.insert(css.as_str()) {
        chain.push(css.as_str());
      }
    }
    for import in &entry.imports {
      self.collect_css(import, visited, seen, chain);
    }
  }

  /// The polyfills chunk of a legacy build, when one was produced.
  ///
  /// Keys are scanned in map order, so the result is deterministic even if a
  /// manifest somehow carries several matching chunks.
  pub fn legacy_polyfills(&self) -> Option<&ManifestEntry> {
    self
      .entries
      .iter()
      .find(|(key, _)| key.ends_with(LEGACY_POLYFILLS_MARKER))
      .map(|(_, entry)| entry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn manifest(json: &str) -> Manifest {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn parses_entries_with_defaults() {
    let manifest = manifest(
      r#"{
        "main.js": {"file": "assets/main.1234.js", "isEntry": true},
        "main.css": {"file": "assets/main.1234.css"}
      }"#,
    );

    let entry = manifest.entry("main.js").unwrap();
    assert_eq!(entry.file, "assets/main.1234.js");
    assert!(entry.css.is_empty());
    assert!(entry.imports.is_empty());
  }

  #[test]
  fn missing_entry_and_empty_file_are_distinct_errors() {
    let manifest = manifest(r#"{"empty.js": {"file": ""}}"#);

    assert!(matches!(
      manifest.file("missing.js"),
      Err(ResolverError::ManifestEntryMissing { .. })
    ));
    assert!(matches!(
      manifest.file("empty.js"),
      Err(ResolverError::ManifestPropertyMissing { property: "file", .. })
    ));
  }

  #[test]
  fn css_chain_walks_imports_depth_first() {
    let manifest = manifest(
      r#"{
        "main.js": {
          "file": "assets/main.js",
          "css": ["assets/main.css"],
          "imports": ["_shared.js", "_widget.js"]
        },
        "_shared.js": {
          "file": "assets/shared.js",
          "css": ["assets/shared.css"],
          "imports": ["_deep.js"]
        },
        "_widget.js": {"file": "assets/widget.js", "css": ["assets/widget.css"]},
        "_deep.js": {"file": "assets/deep.js", "css": ["assets/deep.css"]}
      }"#,
    );

    let chain = manifest.css_chain("main.js").unwrap();
    assert_eq!(chain, vec![
      "assets/main.css",
      "assets/shared.css",
      "assets/deep.css",
      "assets/widget.css",
    ]);
  }

  #[test]
  fn css_chain_skips_duplicates_and_dangling_imports() {
    let manifest = manifest(
      r#"{
        "main.js": {
          "file": "assets/main.js",
          "css": ["assets/common.css"],
          "imports": ["_a.js", "_b.js", "_gone.js"]
        },
        "_a.js": {"file": "assets/a.js", "css": ["assets/common.css"], "imports": ["_b.js"]},
        "_b.js": {"file": "assets/b.js", "css": ["assets/b.css"]}
      }"#,
    );

    let chain = manifest.css_chain("main.js").unwrap();
    assert_eq!(chain, vec!["assets/common.css", "assets/b.css"]);
  }

  #[test]
  fn css_chain_requires_the_entry_itself() {
    let manifest = manifest("{}");
    assert!(matches!(
      manifest.css_chain("main.js"),
      Err(ResolverError::ManifestEntryMissing { .. })
    ));
  }

  #[test]
  fn finds_legacy_polyfills_chunk() {
    let manifest = manifest(
      r#"{
        "main-legacy.js": {"file": "assets/main-legacy.js"},
        "vite/legacy-polyfills-legacy": {"file": "assets/polyfills-legacy.js"}
      }"#,
    );

    let polyfills = manifest.legacy_polyfills().unwrap();
    assert_eq!(polyfills.file, "assets/polyfills-legacy.js");
    assert!(manifest.entry("main.js").is_err());
  }

  #[test]
  fn load_reports_missing_and_unparsable_files() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("manifest.json");

    assert!(matches!(
      Manifest::load(&path),
      Err(ResolverError::ManifestMissing { .. })
    ));

    fs::write(&path, "not json").unwrap();
    assert!(matches!(
      Manifest::load(&path),
      Err(ResolverError::ManifestParse { .. })
    ));

    fs::write(&path, r#"{"main.js": {"file": "main.1234.js"}}"#).unwrap();
    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.file("main.js").unwrap(), "main.1234.js");
  }
}
