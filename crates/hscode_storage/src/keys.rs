//! Well-known storage keys.
//!
//! The names match the slots used by the deployed key-value namespace so an
//! existing namespace can be read without migration.

/// Current code table snapshot.
pub const CURRENT_TABLE_KEY: &str = "HS_CURRENT_DATABASE";

/// Previous code table, written before the current slot is overwritten.
pub const BACKUP_TABLE_KEY: &str = "HS_PREVIOUS_DATABASE";

/// Metadata of the last sync attempt.
pub const METADATA_KEY: &str = "HS_METADATA";

/// Sanctioned goods prefixes.
pub const SANCTIONED_LIST_KEY: &str = "HS_SANCTIONS";

/// Sanitary-controlled goods prefixes.
pub const CONTROLLED_LIST_KEY: &str = "HS_SANEPID";
