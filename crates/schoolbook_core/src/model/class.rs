//! Class records and display-name composition.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stable class identifier. Survives renames.
pub type ClassId = String;

static SECTION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.*?)-\((?P<section>[^)]*)\)$").expect("section suffix regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: ClassId,
    /// Display name, optionally carrying a `-(Section)` suffix.
    pub name: String,
}

impl SchoolClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::new_prefixed_id("C"),
            name: name.into(),
        }
    }

    /// Class rebuilt from a student's cached class name during repair.
    ///
    /// The id is derived from the name instead of generated.
    pub fn recovered(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("C-legacy-{name}"),
            name,
        }
    }
}

/// Composes the display name used as the class key.
///
/// A blank `section` yields the bare name; otherwise `name-(section)`.
pub fn compose_display_name(name: &str, section: Option<&str>) -> String {
    let name = name.trim();
    match section.map(str::trim).filter(|value| !value.is_empty()) {
        Some(section) => format!("{name}-({section})"),
        None => name.to_string(),
    }
}

/// Splits a display name back into `(name, section)` for editing.
pub fn split_display_name(display: &str) -> (String, Option<String>) {
    match SECTION_SUFFIX.captures(display) {
        Some(caps) => (
            caps["name"].to_string(),
            Some(caps["section"].to_string()),
        ),
        None => (display.to_string(), None),
    }
}
