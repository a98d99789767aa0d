//! Generated `config.lua` package descriptor

use crate::core::config::PackageConfig;
use crate::version::Version;
use chrono::{DateTime, Utc};

/// Render the descriptor for `version`, dated `at` (UTC, day resolution)
pub fn render(package: &PackageConfig, version: &Version, at: DateTime<Utc>) -> String {
  let date = at.format("%Y-%m-%d").to_string();
  let description = package.description.trim_end();
  let level = long_bracket_level(description);
  let eq = "=".repeat(level);

  format!(
    "mpackage = {name}\nauthor = {author}\ntitle = {title}\ndescription = [{eq}[\n{description}\n]{eq}]\nversion = {version}\ncreated = {date}\nmodified = {date}\ndependencies = {{}}\n",
    name = quote(&package.name()),
    author = quote(&package.author),
    title = quote(&package.title()),
    eq = eq,
    description = description,
    version = quote(&version.to_string()),
    date = quote(&date),
  )
}

/// Lua double-quoted string literal
fn quote(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  for c in value.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

/// Smallest long-bracket level whose closing bracket does not occur in `text`
fn long_bracket_level(text: &str) -> usize {
  (0..)
    .find(|n| !text.contains(&format!("]{}]", "=".repeat(*n))))
    .unwrap_or(0)
}
