//! Flattening of the nomenclature tree into code records.

use crate::upstream::TreeNode;
use hscode_core::{CodeRecord, Description};

/// Flattens a tree into `(code, breadcrumb)` records.
///
/// Each node with a non-empty description extends the breadcrumb of its
/// ancestors. Each node with a code emits a record, whether or not it has
/// children. Records appear in depth-first order.
pub fn flatten(root: &TreeNode) -> Vec<CodeRecord> {
    let mut records = Vec::new();
    walk(root, &Description::default(), &mut records);
    records
}

fn walk(node: &TreeNode, parent: &Description, records: &mut Vec<CodeRecord>) {
    let label = node
        .description
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty());
    let path = match label {
        Some(label) => parent.child(label),
        None => parent.clone(),
    };

    let code = node
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    if let Some(code) = code {
        records.push(CodeRecord::new(code, path.clone()));
    }

    for child in node.subgroup.iter().flatten() {
        walk(child, &path, records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::group("Section I")
            .with_child(
                TreeNode::leaf("01", "Live animals").with_child(
                    TreeNode::leaf("0101", "Horses")
                        .with_child(TreeNode::leaf("010121", "Pure-bred breeding")),
                ),
            )
            .with_child(TreeNode::leaf("0102", "  Bovine  "))
    }

    #[test]
    fn emits_codes_with_breadcrumbs() {
        let records = flatten(&sample_tree());
        let codes: Vec<_> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["01", "0101", "010121", "0102"]);

        assert_eq!(
            records[2].description.labels(),
            ["Section I", "Live animals", "Horses", "Pure-bred breeding"]
        );
        assert_eq!(records[3].description.labels(), ["Section I", "Bovine"]);
    }

    #[test]
    fn blank_descriptions_do_not_add_levels() {
        let tree = TreeNode::group("Root").with_child(TreeNode {
            description: Some("   ".into()),
            code: None,
            subgroup: Some(vec![TreeNode {
                description: None,
                code: Some("0201".into()),
                subgroup: None,
            }]),
        });

        let records = flatten(&tree);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "0201");
        assert_eq!(records[0].description.labels(), ["Root"]);
    }

    #[test]
    fn empty_tree_yields_nothing() {
        assert!(flatten(&TreeNode::default()).is_empty());
        assert!(flatten(&TreeNode::group("Only a heading")).is_empty());
    }
}
