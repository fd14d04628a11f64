//! The flat code table and change summaries.

use crate::description::Description;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// Numeric code, 4 to 10 digits.
    pub code: String,
    /// Breadcrumb of the code's position in the nomenclature.
    pub description: Description,
}

impl CodeRecord {
    /// Creates a new record.
    pub fn new(code: impl Into<String>, description: Description) -> Self {
        Self {
            code: code.into(),
            description,
        }
    }
}

/// An immutable snapshot mapping codes to descriptions.
///
/// Codes of different lengths coexist: a 4-digit heading and the 10-digit
/// codes below it are all separate entries. Entries are kept in ascending
/// code order, so every code sharing a prefix forms one contiguous range.
///
/// Serialized as a flat JSON object `{ "code": "A → B → C", ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTable {
    entries: BTreeMap<String, Description>,
}

impl CodeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the description of `code`.
    pub fn get(&self, code: &str) -> Option<&Description> {
        self.entries.get(code)
    }

    /// Returns true if `code` is a key of the table.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Returns the number of codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Description)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over every code that starts with `prefix`, including `prefix`
    /// itself, in ascending order.
    pub fn codes_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Description)> + 'a {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the longest table code that is a proper prefix of `code`.
    pub fn longest_prefix_of<'a>(&'a self, code: &str) -> Option<(&'a str, &'a Description)> {
        (1..code.len())
            .rev()
            .filter(|&len| code.is_char_boundary(len))
            .find_map(|len| self.entries.get_key_value(&code[..len]))
            .map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Description)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (String, Description)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<CodeRecord> for CodeTable {
    fn from_iter<I: IntoIterator<Item = CodeRecord>>(iter: I) -> Self {
        iter.into_iter()
            .map(|record| (record.code, record.description))
            .collect()
    }
}

impl Extend<CodeRecord> for CodeTable {
    fn extend<I: IntoIterator<Item = CodeRecord>>(&mut self, iter: I) {
        self.entries.extend(
            iter.into_iter()
                .map(|record| (record.code, record.description)),
        );
    }
}

/// Counts of how a new table differs from the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Codes present only in the new table.
    pub added: u64,
    /// Codes present in both with a different description.
    pub updated: u64,
    /// Codes present only in the old table.
    pub removed: u64,
    /// Codes present in both with the same description.
    pub unchanged: u64,
}

impl ChangeSummary {
    /// Returns `added + updated + removed`.
    pub fn total_changes(&self) -> u64 {
        self.added + self.updated + self.removed
    }

    /// Returns true if the new table is identical to the old one.
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }

    /// A summary describing an unchanged table of `len` codes.
    pub fn unchanged(len: usize) -> Self {
        Self {
            unchanged: len as u64,
            ..Self::default()
        }
    }
}
