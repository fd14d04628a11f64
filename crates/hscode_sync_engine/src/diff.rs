//! Comparison of two code tables.

use hscode_core::{ChangeSummary, CodeTable};

/// Counts added, updated, removed and unchanged codes over the union of
/// both tables' keys.
///
/// Descriptions are compared in their joined, persisted form.
pub fn diff(old: &CodeTable, new: &CodeTable) -> ChangeSummary {
    let mut summary = ChangeSummary::default();

    for (code, old_description) in old.iter() {
        match new.get(code) {
            None => summary.removed += 1,
            Some(description) if description.joined() == old_description.joined() => {
                summary.unchanged += 1;
            }
            Some(_) => summary.updated += 1,
        }
    }
    summary.added = new.iter().filter(|(code, _)| !old.contains(code)).count() as u64;

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use hscode_core::Description;
    use proptest::prelude::*;

    fn table(entries: &[(&str, &str)]) -> CodeTable {
        entries
            .iter()
            .map(|(code, desc)| (code.to_string(), Description::from_joined(desc)))
            .collect()
    }

    #[test]
    fn classifies_every_key() {
        let old = table(&[("0101", "Horses"), ("0102", "Bovine"), ("0103", "Swine")]);
        let new = table(&[("0101", "Horses"), ("0102", "Cattle"), ("0104", "Sheep")]);

        let summary = diff(&old, &new);
        assert_eq!(
            summary,
            ChangeSummary {
                added: 1,
                updated: 1,
                removed: 1,
                unchanged: 1,
            }
        );
    }

    #[test]
    fn first_sync_is_all_additions() {
        let new = table(&[("0101", "Horses"), ("0102", "Bovine")]);
        let summary = diff(&CodeTable::new(), &new);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.total_changes(), 2);
    }

    #[test]
    fn identical_tables_are_noop() {
        let old = table(&[("0101", "Horses")]);
        assert!(diff(&old, &old.clone()).is_noop());
    }

    #[test]
    fn separator_inside_label_is_unchanged_after_reload() {
        let fetched: CodeTable = [(
            "0101".to_string(),
            Description::new(["Animals", "Horses → ponies"]),
        )]
        .into_iter()
        .collect();
        let reloaded: CodeTable =
            serde_json::from_slice(&serde_json::to_vec(&fetched).unwrap()).unwrap();

        assert_ne!(reloaded.get("0101"), fetched.get("0101"));
        assert!(diff(&reloaded, &fetched).is_noop());
    }

    proptest! {
        #[test]
        fn counts_cover_the_union(
            old in prop::collection::btree_map("[0-9]{4}", "[a-c]", 0..20),
            new in prop::collection::btree_map("[0-9]{4}", "[a-c]", 0..20),
        ) {
            let old_table: CodeTable = old
                .iter()
                .map(|(c, d)| (c.clone(), Description::single(d.clone())))
                .collect();
            let new_table: CodeTable = new
                .iter()
                .map(|(c, d)| (c.clone(), Description::single(d.clone())))
                .collect();

            let summary = diff(&old_table, &new_table);
            let union = old.keys().chain(new.keys()).collect::<std::collections::BTreeSet<_>>();

            prop_assert_eq!(
                summary.added + summary.updated + summary.removed + summary.unchanged,
                union.len() as u64
            );
            prop_assert_eq!(summary.added + summary.updated + summary.unchanged, new.len() as u64);
            prop_assert_eq!(summary.removed + summary.updated + summary.unchanged, old.len() as u64);
        }
    }
}
