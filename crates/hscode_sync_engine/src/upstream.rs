//! Upstream source abstraction for sync runs.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of the upstream nomenclature tree.
///
/// Every field is optional: grouping nodes carry only a description,
/// leaves carry a code, and most nodes carry both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Label of this level.
    #[serde(default)]
    pub description: Option<String>,
    /// Code attached to this node.
    #[serde(default)]
    pub code: Option<String>,
    /// Child nodes.
    #[serde(default)]
    pub subgroup: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Creates a grouping node with a description and no code.
    pub fn group(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Creates a node with both a code and a description.
    pub fn leaf(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            code: Some(code.into()),
            subgroup: None,
        }
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.subgroup.get_or_insert_with(Vec::new).push(child);
        self
    }
}

/// A paginated source of the nomenclature tree.
///
/// The page count is fixed and known before a run starts.
pub trait UpstreamSource: Send + Sync {
    /// Number of pages, numbered `1..=total_pages()`.
    fn total_pages(&self) -> u32;

    /// Fetches and decodes one page.
    fn fetch_page(&self, page: u32) -> SyncResult<TreeNode>;
}

/// A scripted upstream for testing.
#[derive(Debug, Default)]
pub struct MockUpstream {
    total_pages: u32,
    pages: Mutex<BTreeMap<u32, Result<TreeNode, String>>>,
    requests: Mutex<Vec<u32>>,
}

impl MockUpstream {
    /// Creates a mock with `total_pages` pages, all failing until scripted.
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            pages: Mutex::new(BTreeMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the tree returned for a page.
    pub fn set_page(&self, page: u32, node: TreeNode) {
        self.pages.lock().insert(page, Ok(node));
    }

    /// Makes a page fail with the given message.
    pub fn fail_page(&self, page: u32, message: impl Into<String>) {
        self.pages.lock().insert(page, Err(message.into()));
    }

    /// Pages requested so far, in order.
    pub fn requests(&self) -> Vec<u32> {
        self.requests.lock().clone()
    }
}

impl UpstreamSource for MockUpstream {
    fn total_pages(&self) -> u32 {
        self.total_pages
    }

    fn fetch_page(&self, page: u32) -> SyncResult<TreeNode> {
        self.requests.lock().push(page);
        match self.pages.lock().get(&page) {
            Some(Ok(node)) => Ok(node.clone()),
            Some(Err(message)) => Err(SyncError::Fetch {
                page,
                message: message.clone(),
            }),
            None => Err(SyncError::Fetch {
                page,
                message: "page not scripted".into(),
            }),
        }
    }
}

impl<T: UpstreamSource + ?Sized> UpstreamSource for std::sync::Arc<T> {
    fn total_pages(&self) -> u32 {
        (**self).total_pages()
    }

    fn fetch_page(&self, page: u32) -> SyncResult<TreeNode> {
        (**self).fetch_page(page)
    }
}
