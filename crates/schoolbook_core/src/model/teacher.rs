//! Teacher records.

use serde::{Deserialize, Serialize};

pub type TeacherId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// External identity card number; doubles as the login id.
    pub id_card: String,
    /// Class display names, free text as entered by the principal.
    pub classes_taught: Vec<String>,
    pub subjects: Vec<String>,
    /// Free-text period schedule, e.g. `Math:1-2,English:3-4`.
    pub periods: String,
    pub photo: String,
}

impl Teacher {
    pub fn new(name: impl Into<String>, id_card: impl Into<String>) -> Self {
        Self {
            id: super::new_prefixed_id("T"),
            name: name.into(),
            id_card: id_card.into(),
            classes_taught: Vec::new(),
            subjects: Vec::new(),
            periods: String::new(),
            photo: String::new(),
        }
    }
}

/// Splits comma-separated form input into trimmed entries.
///
/// Blank input yields an empty list. Empty segments between commas are
/// dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::split_list;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" 1, 2-(A) ,,3 "), vec!["1", "2-(A)", "3"]);
        assert!(split_list("   ").is_empty());
    }
}
