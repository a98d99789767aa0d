//! Document structure check
//!
//! Well-formedness, expected root element and a couple of hand-edit heuristics.

use super::document;
use super::trait_def::{Check, CheckInput, CheckOutcome};
use std::fs;

pub struct DocumentStructureCheck;

impl Check for DocumentStructureCheck {
  fn name(&self) -> &str {
    "document-structure"
  }

  fn description(&self) -> &str {
    "Package document is well-formed XML with the expected root element"
  }

  fn run(&self, input: &CheckInput) -> CheckOutcome {
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
      Err(e) => {
        outcome.error(format!("{} is not well-formed: {}", input.document.display(), e));
        return outcome;
      }
    };

    let expected = &input.config.package.root_element;
    match outline.root.as_deref() {
      Some(root) if root == expected => {}
      Some(root) => outcome.error(format!("root element is <{}>, expected <{}>", root, expected)),
      None => outcome.error("document has no root element"),
    }

    if outline.root_version.is_none() {
      outcome.warning(format!("<{}> has no version attribute", expected));
    }

    for script in &outline.scripts {
      // CDATA sections legitimately contain raw markup
      if script.raw.contains("<![CDATA[") {
        continue;
      }
      if script.raw.contains('>') {
        outcome.warning(format!("{}: unescaped '>' in script body", script.owner));
      }
    }

    outcome.info(format!("{} script(s) found", outline.scripts.len()));
    outcome
  }
}
