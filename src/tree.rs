//! Data trees: a set of paths merged into one tree, used to prune documents.
//!
//! Building `/a/b`, `/a/c?` and `/items/[0]` gives
//!
//! ```text
//! (root)
//! ├── a
//! │   ├── b
//! │   └── c?
//! └── items
//!     └── [0]
//! ```
//!
//! Pruning a document keeps exactly the parts the tree names. A node whose
//! only child is a wildcard keeps every child of its container.

mod builder;
mod prune;

use std::fmt;

use crate::error::PruneError;
use crate::options::Options;
use crate::path::Selector;
use crate::value::Value;

pub use builder::DataTreeBuilder;
pub use prune::{provenance_indices, provenance_indices_with};

/// One node of a data tree. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTreeNode {
    selector: Option<Selector>,
    required: bool,
    children: Vec<DataTreeNode>,
}

impl DataTreeNode {
    /// The selector that reaches this node; `None` for the root.
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn children(&self) -> &[DataTreeNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The wildcard child, when this node keeps every child of its container.
    pub fn selects_all(&self) -> Option<&DataTreeNode> {
        match self.children.as_slice() {
            [only] if only.selector.as_ref().is_some_and(Selector::is_wildcard) => Some(only),
            _ => None,
        }
    }

    /// Copy of `document` holding only what this tree names.
    pub fn prune(&self, document: &Value) -> Result<Value, PruneError> {
        self.prune_with(document, &Options::default())
    }

    pub fn prune_with(&self, document: &Value, options: &Options) -> Result<Value, PruneError> {
        prune::Pruner::new(&options.provenance_prefix).prune(self, document)
    }

    /// Check that `document` has everything this tree requires.
    pub fn validate(&self, document: &Value) -> Result<(), PruneError> {
        self.prune(document).map(|_| ())
    }

    pub(crate) fn describe(&self) -> String {
        match &self.selector {
            Some(selector) => selector.to_string(),
            None => "root".to_string(),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{}{}{}",
            "  ".repeat(depth),
            self.describe(),
            if self.required { "" } else { "?" }
        )?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for DataTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
