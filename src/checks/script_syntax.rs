//! Embedded script syntax check
//!
//! Each `<script>` body is written to its own temp file and compiled with
//! `luac -p`. Without a Lua compiler on PATH the check is skipped.

use super::document;
use super::trait_def::{Check, CheckInput, CheckOutcome};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub struct ScriptSyntaxCheck;

impl ScriptSyntaxCheck {
  /// First candidate found on PATH
  fn find_luac(candidates: &[String]) -> Option<PathBuf> {
    candidates.iter().find_map(|c| which::which(c).ok())
  }
}

impl Check for ScriptSyntaxCheck {
  fn name(&self) -> &str {
    "script-syntax"
  }

  fn description(&self) -> &str {
    "Embedded Lua scripts compile with luac -p"
  }

  fn run(&self, input: &CheckInput) -> CheckOutcome {
    let Some(luac) = Self::find_luac(&input.config.validation.luac_candidates) else {
      return CheckOutcome::skipped(self.name(), "no Lua compiler (luac) on PATH, script syntax not checked");
    };
    let luac = luac.to_string_lossy().into_owned();

    let mut outcome = CheckOutcome::new(self.name());
    let xml = match fs::read_to_string(&input.document) {
      Ok(xml) => xml,
      Err(e) => {
        outcome.error(format!("cannot read {}: {}", input.document.display(), e));
        return outcome;
      }
    };
    let outline = match document::outline(&xml) {
      Ok(outline) => outline,
      // Reported by document-structure
      Err(_) => return CheckOutcome::skipped(self.name(), "document is not well-formed, scripts not checked"),
    };

    let mut checked = 0usize;
    for script in outline.scripts.iter().filter(|s| !s.code.trim().is_empty()) {
      if input.cancelled() {
        outcome.warning("cancelled before all scripts were checked");
        break;
      }

      let mut file = match tempfile::Builder::new().prefix("mpkg-script-").suffix(".lua").tempfile() {
        Ok(file) => file,
        Err(e) => {
          outcome.error(format!("{}: cannot create temp file: {}", script.owner, e));
          continue;
        }
      };
      if let Err(e) = file.write_all(script.code.as_bytes()).and_then(|_| file.flush()) {
        outcome.error(format!("{}: cannot write temp file: {}", script.owner, e));
        continue;
      }

      let path = file.path().to_string_lossy().into_owned();
      let output = input.runner.run(&[&luac, "-p", &path], None);
      checked += 1;
      if !output.success() {
        let detail = output.diagnostic().replace(&path, &script.owner);
        outcome.error(format!("{}: {}", script.owner, detail.lines().next().unwrap_or("syntax error")));
      }
    }

    outcome.info(format!("{} script(s) compiled", checked));
    outcome
  }
}
