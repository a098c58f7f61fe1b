//! Minimal HTML builders for the script and link tags the resolver emits.
//!
//! Attributes render in alphabetical order so output is deterministic and
//! directly comparable in tests. Boolean attributes render bare (`defer`,
//! `nomodule`) and are dropped entirely when false.

use std::collections::BTreeMap;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
  /// Presence-only attribute such as `async` or `nomodule`.
  Flag(bool),
  /// Regular `key="value"` attribute.
  Text(String),
}

impl From<bool> for AttrValue {
  fn from(value: bool) -> Self {
    Self::Flag(value)
  }
}

impl From<&str> for AttrValue {
  fn from(value: &str) -> Self {
    Self::Text(value.to_string())
  }
}

impl From<String> for AttrValue {
  fn from(value: String) -> Self {
    Self::Text(value)
  }
}

/// Attribute bag accepted by every render-time call.
///
/// Values set here override the defaults the resolver computes, so callers can
/// e.g. replace `type="module"` or add `defer` per tag.
#[derive(Debug, Clone, Default)]
pub struct Attrs {
  values: BTreeMap<String, AttrValue>,
}

impl Attrs {
  /// An empty attribute bag.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set an attribute, replacing any previous value. Builder-style.
  pub fn set(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
    self.values.insert(name.into(), value.into());
    self
  }

  /// Overlay `other` on top of `self`; `other` wins on conflicts.
  pub(crate) fn merged(&self, other: &Attrs) -> Attrs {
    let mut values = self.values.clone();
    values.extend(other.values.clone());
    Attrs { values }
  }

  fn render(&self) -> String {
    let mut out = String::new();
    for (name, value) in &self.values {
      match value {
        AttrValue::Flag(false) => {}
        AttrValue::Flag(true) => {
          out.push(' ');
          out.push_str(name);
        }
        AttrValue::Text(text) => {
          out.push(' ');
          out.push_str(name);
          out.push_str("=\"");
          out.push_str(&escape_attr(text));
          out.push('"');
        }
      }
    }
    out
  }
}

fn escape_attr(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

/// Render a script tag for `src`, with `attrs` overriding `defaults`.
pub fn script(src: &str, defaults: &Attrs, attrs: &Attrs) -> String {
  let merged = defaults.merged(attrs).set("src", src);
  format!("<script{}></script>", merged.render())
}

/// Render a stylesheet link tag for `href`, with `attrs` overriding `defaults`.
pub fn link(href: &str, defaults: &Attrs, attrs: &Attrs) -> String {
  let merged = Attrs::new()
    .set("rel", "stylesheet")
    .merged(defaults)
    .merged(attrs)
    .set("href", href);
  format!("<link{}>", merged.render())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_attributes_alphabetically() {
    let attrs = Attrs::new().set("defer", true).set("data-test", "test");
    let tag = script("/dist/main.1234.js", &Attrs::new().set("type", "module"), &attrs);

    assert_eq!(
      tag,
      "<script data-test=\"test\" defer src=\"/dist/main.1234.js\" type=\"module\"></script>"
    );
  }

  #[test]
  fn false_flags_are_omitted() {
    let tag = script("/a.js", &Attrs::new(), &Attrs::new().set("async", false));
    assert_eq!(tag, "<script src=\"/a.js\"></script>");
  }

  #[test]
  fn caller_attributes_override_defaults() {
    let defaults = Attrs::new().set("type", "module");
    let tag = script("/a.js", &defaults, &Attrs::new().set("type", "text/javascript"));
    assert_eq!(tag, "<script src=\"/a.js\" type=\"text/javascript\"></script>");
  }

  #[test]
  fn link_defaults_to_stylesheet() {
    let tag = link("/dist/main.1234.css", &Attrs::new(), &Attrs::new().set("media", "print"));
    assert_eq!(
      tag,
      "<link href=\"/dist/main.1234.css\" media=\"print\" rel=\"stylesheet\">"
    );
  }

  #[test]
  fn escapes_attribute_values() {
    let tag = link("/a.css", &Attrs::new(), &Attrs::new().set("title", "a\"b & <c>"));
    assert_eq!(
      tag,
      "<link href=\"/a.css\" rel=\"stylesheet\" title=\"a&quot;b &amp; &lt;c&gt;\">"
    );
  }
}
