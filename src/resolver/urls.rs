//! Pure URL computations for dev-server and production assets.

/// Dev-server URL for a source-relative path.
///
/// The dev server serves source files directly, so no manifest lookup or
/// hashing is involved.
pub fn dev_url(origin: &str, root_dir: &str, path: &str) -> String {
  format!(
    "{}{}/{}",
    origin.trim_end_matches('/'),
    root_dir,
    path.trim_start_matches('/')
  )
}

/// Production URL for a hashed output path under the configured output
/// directory. A bare `/` base is suppressed to avoid double slashes.
pub fn prod_url(base_url: &str, out_dir: &str, hashed: &str) -> String {
  let base = if base_url == "/" {
    ""
  } else {
    base_url.trim_end_matches('/')
  };
  format!("{}{}/{}", base, out_dir, hashed.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dev_url_joins_origin_root_and_path() {
    assert_eq!(
      dev_url("http://localhost:3000", "/src", "index.js"),
      "http://localhost:3000/src/index.js"
    );
    assert_eq!(
      dev_url("http://localhost:5173/", "", "/main.js"),
      "http://localhost:5173/main.js"
    );
  }

  #[test]
  fn prod_url_suppresses_bare_root() {
    assert_eq!(
      prod_url("/", "/dist", "assets/main.1234.js"),
      "/dist/assets/main.1234.js"
    );
  }

  #[test]
  fn prod_url_keeps_absolute_bases() {
    assert_eq!(
      prod_url("https://example.com/", "/dist", "main.1234.js"),
      "https://example.com/dist/main.1234.js"
    );
    assert_eq!(
      prod_url("https://example.com/site", "/dist", "main.1234.js"),
      "https://example.com/site/dist/main.1234.js"
    );
  }
}
