//! Package document reading shared by the checks
//!
//! Walks the XML once with quick-xml and pulls out the root element and every
//! `<script>` body together with the name of the item that owns it.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;

/// A `<script>` element's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBody {
  /// Nearest preceding `<name>` text, or `script #N`
  pub owner: String,
  /// Text as it appears in the document (still escaped)
  pub raw: String,
  /// Unescaped Lua source
  pub code: String,
}

/// Structural facts about a package document
#[derive(Debug, Clone, Default)]
pub struct DocumentOutline {
  pub root: Option<String>,
  pub root_version: Option<String>,
  pub scripts: Vec<ScriptBody>,
}

/// Parse the document; any well-formedness problem is an `Err` message
pub fn outline(xml: &str) -> Result<DocumentOutline, String> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut outline = DocumentOutline::default();
  let mut depth = 0usize;
  let mut current_name: Option<String> = None;

  loop {
    let event = reader.read_event().map_err(|e| e.to_string())?;
    match event {
      Event::Empty(e) => {
        if outline.root.is_none() {
          record_root(&mut outline, &e)?;
        }
      }
      Event::Start(e) => {
        if outline.root.is_none() {
          record_root(&mut outline, &e)?;
          depth += 1;
          continue;
        }
        let tag = e.name().as_ref().to_vec();
        match tag.as_slice() {
          b"name" | b"script" => {
            let raw = reader.read_text(QName(&tag)).map_err(|e| e.to_string())?.into_owned();
            let code = quick_xml::escape::unescape(&raw)
              .map_err(|e| e.to_string())?
              .into_owned();
            if tag == b"name" {
              current_name = Some(code.trim().to_string());
            } else {
              let owner = current_name
                .clone()
                .unwrap_or_else(|| format!("script #{}", outline.scripts.len() + 1));
              outline.scripts.push(ScriptBody { owner, raw, code });
            }
          }
          _ => depth += 1,
        }
      }
      Event::End(_) => {
        depth = depth.saturating_sub(1);
        current_name = None;
      }
      Event::Eof => break,
      _ => {}
    }
  }

  if outline.root.is_none() {
    return Err("document has no root element".to_string());
  }
  if depth > 0 {
    return Err("unexpected end of document (unclosed elements)".to_string());
  }
  Ok(outline)
}

fn record_root(outline: &mut DocumentOutline, e: &BytesStart<'_>) -> Result<(), String> {
  outline.root = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
  outline.root_version = e
    .try_get_attribute("version")
    .map_err(|e| e.to_string())?
    .map(|a| String::from_utf8_lossy(&a.value).into_owned());
  Ok(())
}
