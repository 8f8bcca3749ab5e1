//! Minimal INI reader.
//!
//! Supports the subset of the format asset configs actually use:
//!   - `[section]` headers
//!   - `key = value` and `key: value` pairs (first delimiter wins)
//!   - `;` and `#` comment lines, blank lines
//!   - explicitly empty values (`4 =`)
//!   - a `[DEFAULT]` section whose entries every other section inherits;
//!     a section can cancel an inherited entry with an empty value
//!
//! Keys are lowercased on read; section names keep their case.  A repeated
//! key within one section is last-wins; a repeated section name is an error.
//! Inline comments and multi-line values are not part of the subset.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Name of the section whose entries are inherited by every other section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A parsed INI document: the `[DEFAULT]` entries plus the remaining
/// sections in file order.
#[derive(Debug, Default)]
pub struct IniDocument {
    defaults: BTreeMap<String, String>,
    sections: Vec<(String, BTreeMap<String, String>)>,
}

impl IniDocument {
    /// Parse an INI document from its full text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = IniDocument::default();
        // Index into `doc.sections` of the section being filled; `None` while
        // inside `[DEFAULT]` or before any header.
        let mut current: Option<usize> = None;
        let mut in_default = false;

        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                if name == DEFAULT_SECTION {
                    in_default = true;
                    current = None;
                } else {
                    if doc.sections.iter().any(|(n, _)| n == name) {
                        return Err(Error::DuplicateSection(name.to_string()));
                    }
                    doc.sections.push((name.to_string(), BTreeMap::new()));
                    current = Some(doc.sections.len() - 1);
                    in_default = false;
                }
                continue;
            }

            let (key, value) = split_entry(line).ok_or_else(|| Error::MalformedLine {
                line: i + 1,
                text: raw.to_string(),
            })?;

            let entries = if in_default {
                &mut doc.defaults
            } else {
                match current {
                    Some(idx) => &mut doc.sections[idx].1,
                    // An entry before the first section header.
                    None => {
                        return Err(Error::MalformedLine {
                            line: i + 1,
                            text: raw.to_string(),
                        })
                    }
                }
            };
            entries.insert(key, value);
        }

        Ok(doc)
    }

    /// Entries of the `[DEFAULT]` section alone.
    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    /// Iterate over sections in file order, each with the `[DEFAULT]`
    /// entries merged in (the section's own entries win).
    pub fn sections(&self) -> impl Iterator<Item = (&str, BTreeMap<String, String>)> {
        self.sections.iter().map(move |(name, own)| {
            let mut merged = self.defaults.clone();
            merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
            (name.as_str(), merged)
        })
    }

    /// Number of non-default sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Split one `key = value` / `key: value` line.  Returns `None` when the
/// line has no delimiter.  The key is lowercased, both halves trimmed.
fn split_entry(line: &str) -> Option<(String, String)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    let value = line[pos + 1..].trim().to_string();
    Some((key, value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
