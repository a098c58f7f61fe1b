//! The manifest-backed asset resolver.
//!
//! One [`ViteResolver`] serves one page render. It decides between development
//! and production mode, then maps logical entry names to dev-server URLs or
//! manifest-hashed production paths, wrapped in script/link tags where the
//! call surface asks for them.

mod urls;

pub use urls::{dev_url, prod_url};

use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};

use crate::config::ResolverConfig;
use crate::devmode::{self, MarkerState};
use crate::error::ResolverError;
use crate::html::{self, Attrs};
use crate::manifest::{LEGACY_POLYFILLS_MARKER, Manifest};

/// Well-known dev-server path of the client injection script.
const CLIENT_PATH: &str = "@vite/client";

/// Suffix inserted before the extension to address an entry's legacy twin.
const LEGACY_SUFFIX: &str = "-legacy";

/// Extensions the dev server serves as plain stylesheets. Anything else is
/// assumed to be a script entry whose styles the dev server injects itself.
const STYLE_EXTENSIONS: [&str; 8] = [
  "css", "scss", "sass", "less", "styl", "stylus", "pcss", "postcss",
];

/// Result of a render-time call: the rendered fragment, `None` when the asset
/// is intentionally absent (wrong mode, or a lenient lookup failure).
pub type RenderResult = Result<Option<String>, ResolverError>;

/// Cached outcome of mode detection.
#[derive(Debug, Clone)]
struct DevState {
  active: bool,
  /// Origin advertised by the marker file, when one supplied it.
  origin: Option<String>,
}

/// Per-render asset resolver.
///
/// Mode and manifest are computed lazily on first access and frozen for the
/// instance's lifetime; the instance is deliberately single-threaded, matching
/// its request scope.
pub struct ViteResolver {
  config: ResolverConfig,
  mode: OnceCell<DevState>,
  manifest: OnceCell<Manifest>,
  first_script_emitted: Cell<bool>,
}

impl ViteResolver {
  /// Create a resolver from an explicit configuration.
  pub fn new(config: ResolverConfig) -> Self {
    Self {
      config: config.normalized(),
      mode: OnceCell::new(),
      manifest: OnceCell::new(),
      first_script_emitted: Cell::new(false),
    }
  }

  /// Create a resolver for a site root, picking up the generated config
  /// artifact when the bundler hook has written one.
  pub fn discover(root: impl Into<PathBuf>) -> Self {
    Self::new(ResolverConfig::discover(root))
  }

  /// The effective configuration this resolver was constructed with.
  pub fn config(&self) -> &ResolverConfig {
    &self.config
  }

  /// Whether the resolver is serving dev-server URLs.
  ///
  /// Errors only in strict mode, and only when the marker file is malformed.
  pub fn is_dev(&self) -> Result<bool, ResolverError> {
    Ok(self.dev_state()?.active)
  }

  /// The loaded manifest. Lenient configurations substitute an empty manifest
  /// when the file is missing or unreadable.
  pub fn manifest(&self) -> Result<&Manifest, ResolverError> {
    if let Some(manifest) = self.manifest.get() {
      return Ok(manifest);
    }
    match Manifest::load(&self.config.manifest_path()) {
      Ok(manifest) => Ok(self.manifest.get_or_init(|| manifest)),
      Err(err) if self.config.debug => Err(err),
      Err(_) => Ok(self.manifest.get_or_init(Manifest::default)),
    }
  }

  /// Script reference to the dev server's client injection endpoint.
  ///
  /// Emitted at most once per instance; production renders nothing.
  pub fn client(&self, attrs: &Attrs) -> RenderResult {
    let result = self.client_once(attrs);
    self.soften(result)
  }

  /// Script tag(s) for a JS entry, defaulting to the configured entry.
  ///
  /// Development: the client tag (once per instance) plus a module script tag
  /// for the dev-server URL. Production: a script tag for the hashed output,
  /// plus the polyfill block and a `nomodule` legacy tag when a legacy build
  /// is configured.
  pub fn js(&self, entry: Option<&str>, attrs: &Attrs) -> RenderResult {
    let result = self.js_tags(entry, attrs);
    self.soften(result)
  }

  /// Stylesheet link tag(s) for an entry, defaulting to the configured entry.
  ///
  /// Development returns nothing for script entries, the dev server injects
  /// their styles live. Style entries link straight to the dev-server URL.
  /// Production renders one link per unique CSS path the entry pulls in,
  /// directly or through its import chain.
  pub fn css(&self, entry: Option<&str>, attrs: &Attrs) -> RenderResult {
    let result = self.css_tags(entry, attrs);
    self.soften(result)
  }

  /// `nomodule` script tag for the legacy polyfills chunk.
  ///
  /// Shares the once-per-page guard with [`ViteResolver::client`]; renders
  /// nothing in development.
  pub fn legacy_polyfills(&self, attrs: &Attrs) -> RenderResult {
    let result = self.legacy_polyfills_once(attrs);
    self.soften(result)
  }

  /// Bare URL for a generic asset (fonts, images).
  ///
  /// Development resolves against the dev server; production treats `path` as
  /// a manifest key. Always a URL, never a tag.
  pub fn file(&self, path: &str) -> RenderResult {
    let result = self.file_url(path);
    self.soften(result)
  }

  fn dev_state(&self) -> Result<&DevState, ResolverError> {
    if let Some(state) = self.mode.get() {
      return Ok(state);
    }

    let state = match self.config.dev {
      Some(active) => DevState {
        active,
        origin: None,
      },
      None => match devmode::probe(&self.config.root) {
        Ok(MarkerState::Present { origin }) => DevState {
          active: true,
          origin: Some(origin),
        },
        Ok(MarkerState::Absent) => DevState {
          active: false,
          origin: None,
        },
        Err(err) if self.config.debug => return Err(err),
        // A broken marker must not take production pages down.
        Err(_) => DevState {
          active: false,
          origin: None,
        },
      },
    };
    Ok(self.mode.get_or_init(|| state))
  }

  fn dev_origin<'a>(&'a self, state: &'a DevState) -> &'a str {
    state.origin.as_deref().unwrap_or(&self.config.dev_server)
  }

  fn soften(&self, result: RenderResult) -> RenderResult {
    if self.config.debug {
      result
    } else {
      result.or(Ok(None))
    }
  }

  fn client_once(&self, attrs: &Attrs) -> RenderResult {
    let state = self.dev_state()?;
    if !state.active || self.first_script_emitted.replace(true) {
      return Ok(None);
    }

    let url = format!(
      "{}/{CLIENT_PATH}",
      self.dev_origin(state).trim_end_matches('/')
    );
    Ok(Some(html::script(&url, &module_defaults(), attrs)))
  }

  fn js_tags(&self, entry: Option<&str>, attrs: &Attrs) -> RenderResult {
    let entry = entry.unwrap_or(&self.config.entry);
    let state = self.dev_state()?;

    if state.active {
      let url = urls::dev_url(self.dev_origin(state), &self.config.root_dir, entry);
      let tag = html::script(&url, &module_defaults(), attrs);
      let tags = match self.client_once(&Attrs::new())? {
        Some(client) => format!("{client}\n{tag}"),
        None => tag,
      };
      return Ok(Some(tags));
    }

    let manifest = self.manifest()?;
    let defaults = if self.config.module {
      module_defaults()
    } else {
      Attrs::new()
    };
    let mut parts = vec![html::script(
      &self.prod_url(manifest.file(entry)?),
      &defaults,
      attrs,
    )];

    if self.config.legacy {
      if let Some(polyfills) = self.legacy_polyfills_once(&Attrs::new())? {
        parts.push(polyfills);
      }
      let legacy_file = manifest.file(&legacy_entry_key(entry))?;
      parts.push(html::script(
        &self.prod_url(legacy_file),
        &Attrs::new().set("nomodule", true),
        attrs,
      ));
    }

    Ok(Some(parts.join("\n")))
  }

  fn css_tags(&self, entry: Option<&str>, attrs: &Attrs) -> RenderResult {
    let entry = entry.unwrap_or(&self.config.entry);
    let state = self.dev_state()?;

    if state.active {
      if !is_style_entry(entry) {
        return Ok(None);
      }
      let url = urls::dev_url(self.dev_origin(state), &self.config.root_dir, entry);
      return Ok(Some(html::link(&url, &Attrs::new(), attrs)));
    }

    let manifest = self.manifest()?;
    if is_style_entry(entry) {
      let url = self.prod_url(manifest.file(entry)?);
      return Ok(Some(html::link(&url, &Attrs::new(), attrs)));
    }

    let chain = manifest.css_chain(entry)?;
    if chain.is_empty() {
      return Ok(None);
    }
    let tags: Vec<String> = chain
      .iter()
      .map(|path| html::link(&self.prod_url(path), &Attrs::new(), attrs))
      .collect();
    Ok(Some(tags.join("\n")))
  }

  fn legacy_polyfills_once(&self, attrs: &Attrs) -> RenderResult {
    if self.dev_state()?.active {
      return Ok(None);
    }

    let manifest = self.manifest()?;
    let Some(polyfills) = manifest.legacy_polyfills() else {
      return Err(ResolverError::ManifestEntryMissing {
        entry: LEGACY_POLYFILLS_MARKER.into(),
      });
    };
    if polyfills.file.is_empty() {
      return Err(ResolverError::ManifestPropertyMissing {
        entry: LEGACY_POLYFILLS_MARKER.into(),
        property: "file",
      });
    }
    if self.first_script_emitted.replace(true) {
      return Ok(None);
    }

    Ok(Some(html::script(
      &self.prod_url(&polyfills.file),
      &Attrs::new().set("nomodule", true),
      attrs,
    )))
  }

  fn file_url(&self, path: &str) -> RenderResult {
    let state = self.dev_state()?;
    if state.active {
      return Ok(Some(urls::dev_url(
        self.dev_origin(state),
        &self.config.root_dir,
        path,
      )));
    }

    let file = self.manifest()?.file(path)?;
    Ok(Some(self.prod_url(file)))
  }

  fn prod_url(&self, hashed: &str) -> String {
    urls::prod_url(&self.config.base_url, &self.config.out_dir, hashed)
  }
}

/// Manifest key of an entry's legacy twin, derived by inserting `-legacy`
/// before the final extension: `main.js` → `main-legacy.js`.
pub fn legacy_entry_key(entry: &str) -> String {
  match entry.rfind('.') {
    Some(dot) if !entry[dot..].contains('/') => {
      format!("{}{LEGACY_SUFFIX}{}", &entry[..dot], &entry[dot..])
    }
    _ => format!("{entry}{LEGACY_SUFFIX}"),
  }
}

fn module_defaults() -> Attrs {
  Attrs::new().set("type", "module")
}

fn is_style_entry(entry: &str) -> bool {
  Path::new(entry)
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| STYLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
