use super::DataTreeNode;
use crate::error::TreeError;
use crate::path::{PathSegment, Selector};

/// Accumulates paths, then freezes them into a [`DataTreeNode`].
///
/// Paths sharing a prefix share nodes; a node reached by several paths is
/// required if any of them requires it. A wildcard absorbs every sibling of
/// its own family (property or item) together with their subtrees.
///
/// ```
/// use trellis::{DataTreeBuilder, parse_path};
///
/// let mut builder = DataTreeBuilder::new();
/// builder.add_path(&parse_path("/a/b").unwrap());
/// builder.add_path(&parse_path("/a/c?").unwrap());
/// let tree = builder.build().unwrap();
/// assert_eq!(tree.children()[0].children().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DataTreeBuilder {
    nodes: Vec<Draft>,
}

#[derive(Debug, Clone)]
struct Draft {
    selector: Option<Selector>,
    required: bool,
    children: Vec<usize>,
}

const ROOT: usize = 0;

impl Default for DataTreeBuilder {
    fn default() -> Self {
        DataTreeBuilder::new()
    }
}

impl DataTreeBuilder {
    pub fn new() -> Self {
        DataTreeBuilder {
            nodes: vec![Draft {
                selector: None,
                required: true,
                children: Vec::new(),
            }],
        }
    }

    pub fn add_path(&mut self, path: &PathSegment) -> &mut Self {
        let mut parent = ROOT;
        for segment in path.iter() {
            parent = self.attach(parent, &segment.selector, segment.required);
        }
        self
    }

    pub fn build(&self) -> Result<DataTreeNode, TreeError> {
        self.freeze(ROOT)
    }

    /// Find or create the child of `parent` for `selector`, returning its index.
    fn attach(&mut self, parent: usize, selector: &Selector, required: bool) -> usize {
        let family = selector.is_property();
        let wildcard = self.nodes[parent].children.iter().copied().find(|&child| {
            self.nodes[child]
                .selector
                .as_ref()
                .is_some_and(|s| s.is_wildcard() && s.is_property() == family)
        });
        if let Some(wildcard) = wildcard {
            self.nodes[wildcard].required |= required;
            return wildcard;
        }

        if selector.is_wildcard() {
            let (absorbed, kept): (Vec<usize>, Vec<usize>) = self.nodes[parent]
                .children
                .iter()
                .partition(|&&child| {
                    self.nodes[child]
                        .selector
                        .as_ref()
                        .is_some_and(|s| s.is_property() == family)
                });
            let wildcard = self.push(selector.clone(), required);
            self.nodes[parent].children = kept;
            self.nodes[parent].children.push(wildcard);
            for sibling in absorbed {
                log::debug!("wildcard {selector} absorbs sibling {:?}", self.nodes[sibling].selector);
                let sibling_required = self.nodes[sibling].required;
                self.nodes[wildcard].required |= sibling_required;
                self.absorb(wildcard, sibling);
            }
            return wildcard;
        }

        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].selector.as_ref() == Some(selector));
        match existing {
            Some(child) => {
                self.nodes[child].required |= required;
                child
            }
            None => {
                let child = self.push(selector.clone(), required);
                self.nodes[parent].children.push(child);
                child
            }
        }
    }

    /// Merge the subtree under `source` into `target`.
    fn absorb(&mut self, target: usize, source: usize) {
        for child in self.nodes[source].children.clone() {
            let Some(selector) = self.nodes[child].selector.clone() else {
                continue;
            };
            let required = self.nodes[child].required;
            let merged = self.attach(target, &selector, required);
            self.absorb(merged, child);
        }
    }

    fn push(&mut self, selector: Selector, required: bool) -> usize {
        self.nodes.push(Draft {
            selector: Some(selector),
            required,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn freeze(&self, index: usize) -> Result<DataTreeNode, TreeError> {
        let draft = &self.nodes[index];
        let children = draft
            .children
            .iter()
            .map(|&child| self.freeze(child))
            .collect::<Result<Vec<_>, _>>()?;
        let properties = children
            .iter()
            .filter(|child| child.selector.as_ref().is_some_and(Selector::is_property))
            .count();
        let node = DataTreeNode {
            selector: draft.selector.clone(),
            required: draft.required,
            children,
        };
        if properties != 0 && properties != node.children.len() {
            return Err(TreeError::NonHomogeneousChildren {
                node: node.describe(),
            });
        }
        Ok(node)
    }
}
