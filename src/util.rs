//! Small utility helpers used across modules.

/// Join a base URL and an endpoint path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
  let base = base.trim_end_matches('/');
  let path = path.trim_start_matches('/');
  if path.is_empty() { base.to_string() } else { format!("{}/{}", base, path) }
}

/// Log-safe truncation for large strings.
/// Cuts on a char boundary so multi-byte text never panics.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Replace every ASCII-case-insensitive occurrence of `needle` in `haystack`.
pub fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
  if needle.is_empty() {
    return haystack.to_string();
  }
  let hay = haystack.as_bytes();
  let pat = needle.as_bytes();
  let mut out = String::with_capacity(haystack.len());
  let mut last = 0;
  let mut i = 0;
  while i + pat.len() <= hay.len() {
    if hay[i..i + pat.len()].eq_ignore_ascii_case(pat)
      && haystack.is_char_boundary(i)
      && haystack.is_char_boundary(i + pat.len())
    {
      out.push_str(&haystack[last..i]);
      out.push_str(replacement);
      i += pat.len();
      last = i;
    } else {
      i += 1;
    }
  }
  out.push_str(&haystack[last..]);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_url_normalizes_slashes() {
    assert_eq!(join_url("http://h:1/", "/task/start"), "http://h:1/task/start");
    assert_eq!(join_url("http://h:1", "task/start"), "http://h:1/task/start");
    assert_eq!(join_url("http://h:1/", ""), "http://h:1");
  }

  #[test]
  fn trunc_for_log_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("我去上学。", 4);
    assert!(out.starts_with("我"));
    assert!(out.ends_with("(15 bytes total)"));
  }

  #[test]
  fn replace_ignores_ascii_case() {
    let s = "The [a] cat and the [A] dog near [b].";
    assert_eq!(
      replace_ignore_ascii_case(s, "[a]", "(A)big"),
      "The (A)big cat and the (A)big dog near [b]."
    );
    assert_eq!(replace_ignore_ascii_case("abc", "", "x"), "abc");
  }
}
