//! Resolver configuration and the machine-generated bundler config artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const GENERATED_CONFIG_FILE: &str = "vite.config.json";

/// Runtime configuration for a [`crate::ViteResolver`] instance.
///
/// All options are optional in the serialized form and fall back to the
/// defaults below. Directory options accept both `dist` and `/dist/` spellings
/// and are normalised before use.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Site root on disk, used to locate the manifest and the dev marker file.
    pub root: PathBuf,
    /// Public root URL of the site, prefixed to production asset paths.
    pub base_url: String,
    /// Production output directory, relative to the site root.
    pub out_dir: String,
    /// Bundler source root. If the dev server serves an asset under
    /// `localhost:3000/src/index.js`, `/src` is the root directory.
    pub root_dir: String,
    /// Dev-server origin used when the marker file does not supply one.
    pub dev_server: String,
    /// Default entry key when none is supplied to a call.
    pub entry: String,
    /// Manifest file name inside the output directory.
    pub manifest: String,
    /// Whether production script tags get `type="module"`.
    pub module: bool,
    /// Whether to additionally resolve the legacy bundle and its polyfills.
    pub legacy: bool,
    /// Explicit override of the mode detector.
    pub dev: Option<bool>,
    /// Strict failure policy: surface lookup errors instead of omitting assets.
    pub debug: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root: ".".into(),
            base_url: "/".into(),
            out_dir: "/dist".into(),
            root_dir: "/src".into(),
            dev_server: "http://localhost:3000".into(),
            entry: "index.js".into(),
            manifest: "manifest.json".into(),
            module: true,
            legacy: false,
            dev: None,
            debug: false,
        }
    }
}

impl ResolverConfig {
    /// Build the effective configuration for a site root.
    ///
    /// Starts from the defaults and overlays the generated config artifact when
    /// the bundler hook has written one. Missing or unparsable artifacts leave
    /// the defaults in place so callers can continue with sensible assumptions.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = Self {
            root: root.clone(),
            ..Self::default()
        };
        match GeneratedConfig::load(&root) {
            Some(generated) => generated.apply(config).normalized(),
            None => config.normalized(),
        }
    }

    /// Normalise directory-shaped options into the `/dir` form.
    pub fn normalized(mut self) -> Self {
        self.out_dir = sanitize_dir(&self.out_dir);
        self.root_dir = sanitize_dir(&self.root_dir);
        self
    }

    /// Path of the manifest file for this configuration.
    pub fn manifest_path(&self) -> PathBuf {
        join_site_path(&self.root, &format!("{}/{}", self.out_dir, self.manifest))
    }
}

/// Make sure a directory starts with a slash and doesn't end with one.
///
/// A bare `/` collapses to the empty string so later concatenation never
/// produces double slashes.
pub fn sanitize_dir(dir: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Join a root-relative site path (`/dist/manifest.json`) onto a filesystem root.
pub(crate) fn join_site_path(root: &Path, site_path: &str) -> PathBuf {
    root.join(site_path.trim_start_matches('/'))
}

/// Config artifact regenerated by the bundler hook on every config resolution.
///
/// Mirrors the subset of the bundler's resolved configuration the resolver
/// needs to agree on. All fields are optional so partial artifacts written by
/// older hook versions keep loading.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratedConfig {
    /// Bundler source root relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    /// Build output directory relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    /// Assets directory inside the output directory. Recorded for parity with
    /// the bundler plugin; hashed manifest paths already carry this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<String>,
    /// Whether a legacy build is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
    /// Manifest file name when the bundler overrides the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
}

impl GeneratedConfig {
    /// Read the generated artifact from a site root if present.
    pub fn load(root: &Path) -> Option<Self> {
        let content = fs::read_to_string(root.join(GENERATED_CONFIG_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Overlay the artifact onto a resolver configuration.
    pub fn apply(self, mut config: ResolverConfig) -> ResolverConfig {
        if let Some(root_dir) = self.root_dir {
            config.root_dir = root_dir;
        }
        if let Some(out_dir) = self.out_dir {
            config.out_dir = out_dir;
        }
        if let Some(legacy) = self.legacy {
            config.legacy = legacy;
        }
        if let Some(manifest) = self.manifest {
            config.manifest = manifest;
        }
        config
    }

    /// Serialise the artifact into a site root, skipping the write when the
    /// existing content already matches.
    ///
    /// Returns `true` when the file was (re)written.
    pub fn write_if_changed(&self, root: &Path) -> Result<bool> {
        let path = root.join(GENERATED_CONFIG_FILE);
        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config artifact")?;

        if let Ok(existing) = fs::read_to_string(&path)
            && existing == content
        {
            return Ok(false);
        }

        fs::write(&path, &content)
            .with_context(|| format!("failed to write config artifact at {}", path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitizes_directory_spellings() {
        assert_eq!(sanitize_dir("dist"), "/dist");
        assert_eq!(sanitize_dir("/dist"), "/dist");
        assert_eq!(sanitize_dir("/dist/"), "/dist");
        assert_eq!(sanitize_dir("dist/"), "/dist");
        assert_eq!(sanitize_dir("/"), "");
        assert_eq!(sanitize_dir(""), "");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ResolverConfig::default();
        assert_eq!(config.out_dir, "/dist");
        assert_eq!(config.root_dir, "/src");
        assert_eq!(config.dev_server, "http://localhost:3000");
        assert_eq!(config.entry, "index.js");
        assert_eq!(config.manifest, "manifest.json");
        assert!(config.module);
        assert!(!config.legacy);
        assert!(config.dev.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn discover_returns_normalized_defaults_without_artifact() {
        let temp = tempdir().unwrap();
        let config = ResolverConfig::discover(temp.path());

        assert_eq!(config.root, temp.path());
        assert_eq!(config.out_dir, "/dist");
        assert_eq!(
            config.manifest_path(),
            temp.path().join("dist/manifest.json")
        );
    }

    #[test]
    fn discover_overlays_generated_artifact() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(GENERATED_CONFIG_FILE),
            r#"{"outDir": "build", "rootDir": "frontend", "legacy": true}"#,
        )
        .unwrap();

        let config = ResolverConfig::discover(temp.path());
        assert_eq!(config.out_dir, "/build");
        assert_eq!(config.root_dir, "/frontend");
        assert!(config.legacy);
        assert_eq!(config.manifest, "manifest.json");
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let temp = tempdir().unwrap();
        let artifact = GeneratedConfig {
            out_dir: Some("dist".into()),
            legacy: Some(false),
            ..GeneratedConfig::default()
        };

        assert!(artifact.write_if_changed(temp.path()).unwrap());
        assert!(!artifact.write_if_changed(temp.path()).unwrap());

        let changed = GeneratedConfig {
            out_dir: Some("build".into()),
            ..artifact
        };
        assert!(changed.write_if_changed(temp.path()).unwrap());

        let loaded = GeneratedConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.out_dir.as_deref(), Some("build"));
    }
}
