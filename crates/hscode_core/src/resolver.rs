//! Prefix-based classification of user-supplied codes.
//!
//! A query is cleaned down to its digits and matched against the table in a
//! fixed order of branches; the first branch that applies decides the
//! [`MatchKind`]. The restriction overlay is computed from the cleaned query
//! independently of the branch taken.

use crate::description::Description;
use crate::error::QueryError;
use crate::status::{RestrictionOverlay, StatusRegistry};
use crate::table::CodeTable;

/// Fewest digits accepted in a query.
pub const MIN_CODE_DIGITS: usize = 4;

/// Most digits accepted in a query.
pub const MAX_CODE_DIGITS: usize = 10;

/// Length that auto-completed codes are padded to.
pub const FULL_CODE_DIGITS: usize = 10;

/// Number of subcodes listed for a general code.
pub const SUBCODE_PREVIEW_LIMIT: usize = 10;

/// How a query matched the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// Nothing in the table covers the query.
    NotFound,
    /// The query is a table code with no longer codes below it.
    ExactFinal,
    /// The query is a heading with several completions.
    General {
        /// Whether the query itself is a table code.
        exact_match: bool,
        /// Total number of longer codes starting with the query.
        subcode_count: usize,
        /// The first [`SUBCODE_PREVIEW_LIMIT`] subcodes, ascending.
        preview: Vec<String>,
    },
    /// The query has exactly one completion, which was padded to full length.
    SingleSubcode,
    /// The query extends a shorter table code and was padded to full length.
    PrefixExtension {
        /// The table code the query extends.
        matched_prefix: String,
    },
}

/// Outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The query after cleaning.
    pub query: String,
    /// The resolved code. Equal to `query` unless the query was completed.
    pub code: String,
    /// Description of the matched entry.
    pub description: Option<Description>,
    /// Which branch matched.
    pub kind: MatchKind,
    /// Restriction flags for the cleaned query.
    pub overlay: RestrictionOverlay,
}

impl MatchResult {
    /// The cleaned query, when it differs from the resolved code.
    pub fn original_code(&self) -> Option<&str> {
        (self.query != self.code).then_some(self.query.as_str())
    }

    /// True for a determinate leaf or completion with no restriction.
    pub fn is_valid(&self) -> bool {
        self.is_determinate() && !self.overlay.is_restricted()
    }

    /// True when the result names a single code.
    pub fn is_determinate(&self) -> bool {
        matches!(
            self.kind,
            MatchKind::ExactFinal | MatchKind::SingleSubcode | MatchKind::PrefixExtension { .. }
        )
    }

    /// True for a heading with several completions.
    pub fn is_general(&self) -> bool {
        matches!(self.kind, MatchKind::General { .. })
    }

    /// True unless nothing matched.
    pub fn is_found(&self) -> bool {
        self.kind != MatchKind::NotFound
    }
}

/// Strips separators from a human-entered code and checks its shape.
///
/// # Errors
///
/// [`QueryError::InvalidLength`] if fewer than 4 or more than 10 digits
/// remain, [`QueryError::InvalidChars`] if anything but digits remains.
pub fn normalize(raw: &str) -> Result<String, QueryError> {
    let cleaned: String = raw.chars().filter(char::is_ascii_digit).collect();

    if !(MIN_CODE_DIGITS..=MAX_CODE_DIGITS).contains(&cleaned.len()) {
        return Err(QueryError::InvalidLength {
            len: cleaned.len(),
            min: MIN_CODE_DIGITS,
            max: MAX_CODE_DIGITS,
        });
    }
    if !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::InvalidChars);
    }
    Ok(cleaned)
}

/// Right-pads `code` with zeros to [`FULL_CODE_DIGITS`].
pub fn pad_to_full(code: &str) -> String {
    format!("{code:0<width$}", width = FULL_CODE_DIGITS)
}

/// Resolves a raw query against a table and the restriction lists.
///
/// # Errors
///
/// Returns a [`QueryError`] when the query has the wrong shape. A query
/// that matches nothing is `Ok` with [`MatchKind::NotFound`].
pub fn resolve(
    raw: &str,
    table: &CodeTable,
    registry: &StatusRegistry,
) -> Result<MatchResult, QueryError> {
    let query = normalize(raw)?;
    let overlay = registry.overlay(&query);

    let exact = table.get(&query);
    let (first, second) = {
        let mut subcodes = table
            .codes_with_prefix(&query)
            .filter(|(code, _)| *code != query);
        (subcodes.next(), subcodes.next())
    };

    let (code, description, kind) = match (exact, first, second) {
        (None, None, _) => match general_prefix(table, &query) {
            Some((prefix, desc)) => (
                pad_to_full(&query),
                Some(desc.clone()),
                MatchKind::PrefixExtension {
                    matched_prefix: prefix.to_string(),
                },
            ),
            None => (query.clone(), None, MatchKind::NotFound),
        },
        (Some(desc), None, _) => (query.clone(), Some(desc.clone()), MatchKind::ExactFinal),
        (None, Some((only, desc)), None) => {
            (pad_to_full(only), Some(desc.clone()), MatchKind::SingleSubcode)
        }
        (exact, Some(_), _) => {
            let all: Vec<&str> = table
                .codes_with_prefix(&query)
                .map(|(code, _)| code)
                .filter(|code| *code != query)
                .collect();
            let description = exact.cloned().unwrap_or_else(|| {
                Description::single(format!("General code with {} subcodes", all.len()))
            });
            (
                query.clone(),
                Some(description),
                MatchKind::General {
                    exact_match: exact.is_some(),
                    subcode_count: all.len(),
                    preview: all
                        .iter()
                        .take(SUBCODE_PREVIEW_LIMIT)
                        .map(|c| c.to_string())
                        .collect(),
                },
            )
        }
    };

    Ok(MatchResult {
        query,
        code,
        description,
        kind,
        overlay,
    })
}

/// Finds the table code the query extends, if it is unambiguous: the
/// longest table code that is a proper prefix of the query, provided no
/// other table code starts with it.
fn general_prefix<'a>(table: &'a CodeTable, query: &str) -> Option<(&'a str, &'a Description)> {
    let (prefix, desc) = table.longest_prefix_of(query)?;
    (table.codes_with_prefix(prefix).count() == 1).then_some((prefix, desc))
}
