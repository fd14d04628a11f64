//! Restriction lists and the overlay they put on resolved codes.

use crate::error::CoreResult;
use crate::repository;
use hscode_storage::KvStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::warn;

/// Number of digits in a restriction prefix.
pub const STATUS_PREFIX_LEN: usize = 4;

/// The two independent restriction lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Embargo-type restriction.
    #[serde(rename = "sanctions")]
    Sanctioned,
    /// Sanitary-inspection-type restriction.
    #[serde(rename = "sanepid")]
    Controlled,
}

impl StatusKind {
    /// Both kinds, in precedence order.
    pub const ALL: [StatusKind; 2] = [StatusKind::Sanctioned, StatusKind::Controlled];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Sanctioned => "sanctions",
            StatusKind::Controlled => "sanepid",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sanctions" | "sanction" | "sanctioned" => Ok(StatusKind::Sanctioned),
            "sanepid" | "controlled" => Ok(StatusKind::Controlled),
            other => Err(format!(
                "unknown list type {other:?}, expected \"sanctions\" or \"sanepid\""
            )),
        }
    }
}

/// Returns true if `code` is a well-formed restriction prefix.
pub fn is_valid_prefix(code: &str) -> bool {
    code.len() == STATUS_PREFIX_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// A set of restriction prefixes.
///
/// Lists are replaced wholesale by [`StatusList::replace`]; they are never
/// merged or diffed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusList {
    /// The prefixes, in ascending order.
    pub codes: BTreeSet<String>,
    /// When the list was last replaced.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
}

/// Outcome of a list replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdateOutcome {
    /// Distinct well-formed prefixes kept.
    pub accepted: usize,
    /// Codes in the request, before validation.
    pub submitted: usize,
}

impl StatusList {
    /// Builds a replacement list from raw codes.
    ///
    /// Codes are trimmed; anything that is not exactly four digits is
    /// dropped without error. Duplicates collapse.
    pub fn replace<I, S>(codes: I, now: OffsetDateTime) -> (Self, ListUpdateOutcome)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut submitted = 0;
        let codes: BTreeSet<String> = codes
            .into_iter()
            .inspect(|_| submitted += 1)
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| is_valid_prefix(c))
            .collect();

        let outcome = ListUpdateOutcome {
            accepted: codes.len(),
            submitted,
        };
        let list = Self {
            codes,
            last_updated: Some(now),
        };
        (list, outcome)
    }

    /// Returns the number of prefixes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Returns true if any prefix in the list starts `code`.
    pub fn matches(&self, code: &str) -> bool {
        self.codes.iter().any(|prefix| code.starts_with(prefix.as_str()))
    }
}

/// The restriction surfaced to the user for a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Restriction {
    /// The code falls under a sanctioned prefix.
    Sanction,
    /// The code falls under a sanitary-controlled prefix.
    Sanepid,
}

impl Restriction {
    /// User-facing warning for the restriction.
    pub fn message(&self) -> &'static str {
        match self {
            Restriction::Sanction => {
                "Goods under this code are subject to sanctions. Import or export may be prohibited."
            }
            Restriction::Sanepid => {
                "Goods under this code are subject to sanitary inspection before release."
            }
        }
    }
}

/// Which lists matched a code. Both flags are kept; [`status`](Self::status)
/// picks the one that is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestrictionOverlay {
    /// A sanctioned prefix matched.
    pub sanctioned: bool,
    /// A controlled prefix matched.
    pub controlled: bool,
}

impl RestrictionOverlay {
    /// No restriction.
    pub const NONE: Self = Self {
        sanctioned: false,
        controlled: false,
    };

    /// The surfaced restriction. Sanction wins when both apply.
    pub fn status(&self) -> Option<Restriction> {
        if self.sanctioned {
            Some(Restriction::Sanction)
        } else if self.controlled {
            Some(Restriction::Sanepid)
        } else {
            None
        }
    }

    /// Returns true if any list matched.
    pub fn is_restricted(&self) -> bool {
        self.sanctioned || self.controlled
    }

    /// Message of the surfaced restriction.
    pub fn message(&self) -> Option<&'static str> {
        self.status().map(|r| r.message())
    }
}

/// Both restriction lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRegistry {
    /// Sanctioned prefixes.
    pub sanctioned: StatusList,
    /// Sanitary-controlled prefixes.
    pub controlled: StatusList,
}

impl StatusRegistry {
    /// Creates a registry from two lists.
    pub fn new(sanctioned: StatusList, controlled: StatusList) -> Self {
        Self {
            sanctioned,
            controlled,
        }
    }

    /// Loads both lists from the store.
    ///
    /// Restriction flags are advisory: a list that cannot be read or parsed
    /// is treated as empty.
    pub fn load<S: KvStore + ?Sized>(store: &S) -> Self {
        Self {
            sanctioned: load_or_empty(store, StatusKind::Sanctioned),
            controlled: load_or_empty(store, StatusKind::Controlled),
        }
    }

    /// Returns the list of the given kind.
    pub fn list(&self, kind: StatusKind) -> &StatusList {
        match kind {
            StatusKind::Sanctioned => &self.sanctioned,
            StatusKind::Controlled => &self.controlled,
        }
    }

    /// Computes the overlay for a cleaned code.
    pub fn overlay(&self, code: &str) -> RestrictionOverlay {
        RestrictionOverlay {
            sanctioned: self.sanctioned.matches(code),
            controlled: self.controlled.matches(code),
        }
    }
}

fn load_or_empty<S: KvStore + ?Sized>(store: &S, kind: StatusKind) -> StatusList {
    let loaded: CoreResult<Option<StatusList>> = repository::load_status_list(store, kind);
    match loaded {
        Ok(list) => list.unwrap_or_default(),
        Err(e) => {
            warn!(list = %kind, error = %e, "restriction list unavailable, treating as empty");
            StatusList::default()
        }
    }
}
