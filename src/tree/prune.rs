use super::DataTreeNode;
use crate::error::PruneError;
use crate::options::DEFAULT_PROVENANCE_PREFIX;
use crate::path::Selector;
use crate::value::{Data, Value};

pub(super) struct Pruner<'p> {
    provenance_prefix: &'p str,
}

impl<'p> Pruner<'p> {
    pub(super) fn new(provenance_prefix: &'p str) -> Self {
        Pruner { provenance_prefix }
    }

    pub(super) fn prune(&self, node: &DataTreeNode, value: &Value) -> Result<Value, PruneError> {
        if node.is_leaf() {
            return Ok(value.clone());
        }
        if let Some(all) = node.selects_all() {
            return self.prune_all(node, all, value);
        }
        match value.data() {
            Data::Struct(fields) if node.children.iter().all(is_property_child) => {
                self.prune_struct(node, value, fields)
            }
            Data::List(items) | Data::Sexp(items) if !node.children.iter().any(is_property_child) => {
                self.prune_sequence(node, value, items)
            }
            Data::Null(_) => {
                if let Some(child) = node.children.iter().find(|child| child.required) {
                    log::debug!("null container {} has required child {}", node.describe(), child.describe());
                    return Err(PruneError::MissingRequiredContainer {
                        selector: node.describe(),
                    });
                }
                Ok(value.clone())
            }
            _ => Err(mismatch(node, value)),
        }
    }

    /// Keep every child of the container, pruning each with the wildcard's subtree.
    fn prune_all(
        &self,
        node: &DataTreeNode,
        all: &DataTreeNode,
        value: &Value,
    ) -> Result<Value, PruneError> {
        if value.is_null() {
            return Err(PruneError::MissingRequiredContainer {
                selector: node.describe(),
            });
        }
        let wants_properties = all.selector.as_ref().is_some_and(Selector::is_property);
        let data = match (value.data(), wants_properties) {
            (Data::Struct(fields), true) => {
                if fields.is_empty() && all.required {
                    return Err(empty(node));
                }
                Data::Struct(
                    fields
                        .iter()
                        .map(|(name, child)| self.prune(all, child).map(|kept| (name.clone(), kept)))
                        .collect::<Result<_, _>>()?,
                )
            }
            (Data::List(items), false) | (Data::Sexp(items), false) => {
                if items.is_empty() && all.required {
                    return Err(empty(node));
                }
                let pruned = items
                    .iter()
                    .map(|item| self.prune(all, item))
                    .collect::<Result<Vec<_>, _>>()?;
                match value.data() {
                    Data::Sexp(_) => Data::Sexp(pruned),
                    _ => Data::List(pruned),
                }
            }
            _ => return Err(mismatch(node, value)),
        };
        Ok(Value::new(data).with_annotations(value.annotations().to_vec()))
    }

    fn prune_struct(
        &self,
        node: &DataTreeNode,
        value: &Value,
        fields: &[(String, Value)],
    ) -> Result<Value, PruneError> {
        let mut kept = Vec::new();
        for child in &node.children {
            let Some(Selector::Property(Some(name))) = &child.selector else {
                return Err(mismatch(node, value));
            };
            match fields.iter().position(|(field, _)| field == name) {
                Some(position) => {
                    kept.push((position, name.clone(), self.prune(child, &fields[position].1)?));
                }
                None if child.required => {
                    return Err(PruneError::MissingRequiredProperty(name.clone()));
                }
                None => log::trace!("optional property {name} absent"),
            }
        }
        kept.sort_by_key(|(position, _, _)| *position);
        Ok(Value::structure(kept.into_iter().map(|(_, name, value)| (name, value)))
            .with_annotations(value.annotations().to_vec()))
    }

    /// Keep the selected items in ascending index order and record their
    /// source indices in a provenance annotation.
    ///
    /// A sequence that already carries provenance was pruned before: its
    /// items sit at compacted slots, so indices resolve through the recorded
    /// ones and the recorded ones are emitted again.
    fn prune_sequence(
        &self,
        node: &DataTreeNode,
        value: &Value,
        items: &[Value],
    ) -> Result<Value, PruneError> {
        let recorded = provenance_indices_with(value, self.provenance_prefix)
            .filter(|recorded| recorded.len() == items.len());
        let mut kept = Vec::new();
        for child in &node.children {
            let Some(Selector::Item(Some(index))) = child.selector else {
                return Err(mismatch(node, value));
            };
            let slot = match &recorded {
                Some(recorded) => recorded.iter().position(|source| *source == index),
                None => Some(index),
            };
            match slot.and_then(|slot| items.get(slot)) {
                Some(item) => kept.push((index, self.prune(child, item)?)),
                None if child.required => return Err(PruneError::MissingRequiredIndex(index)),
                None => log::trace!("optional index {index} absent"),
            }
        }
        kept.sort_by_key(|(index, _)| *index);

        let indices: Vec<String> = kept.iter().map(|(index, _)| index.to_string()).collect();
        let mut annotations: Vec<String> = value
            .annotations()
            .iter()
            .filter(|a| !a.starts_with(self.provenance_prefix))
            .cloned()
            .collect();
        annotations.push(format!("{}{}", self.provenance_prefix, indices.join(",")));

        let items = kept.into_iter().map(|(_, item)| item).collect();
        let data = match value.data() {
            Data::Sexp(_) => Data::Sexp(items),
            _ => Data::List(items),
        };
        Ok(Value::new(data).with_annotations(annotations))
    }
}

fn is_property_child(child: &DataTreeNode) -> bool {
    child.selector.as_ref().is_some_and(Selector::is_property)
}

fn empty(node: &DataTreeNode) -> PruneError {
    PruneError::EmptyRequiredContainer {
        selector: node.describe(),
    }
}

fn mismatch(node: &DataTreeNode, value: &Value) -> PruneError {
    let expected = if node.children.iter().any(is_property_child) {
        "struct"
    } else {
        "list or sexp"
    };
    PruneError::StructureMismatch {
        selector: node.describe(),
        expected,
        found: value.kind(),
    }
}

/// Source indices recorded on a pruned list or sexp, using the default prefix.
///
/// ```
/// use trellis::{DataTreeBuilder, Value, parse_path, provenance_indices};
///
/// let mut builder = DataTreeBuilder::new();
/// builder.add_path(&parse_path("/[2]").unwrap());
/// let pruned = builder
///     .build()
///     .unwrap()
///     .prune(&Value::list([Value::int(7), Value::int(8), Value::int(9)]))
///     .unwrap();
/// assert_eq!(pruned, Value::list([Value::int(9)]).with_annotations(["$indices:2"]));
/// assert_eq!(provenance_indices(&pruned), Some(vec![2]));
/// ```
pub fn provenance_indices(value: &Value) -> Option<Vec<usize>> {
    provenance_indices_with(value, DEFAULT_PROVENANCE_PREFIX)
}

pub fn provenance_indices_with(value: &Value, prefix: &str) -> Option<Vec<usize>> {
    let recorded = value
        .annotations()
        .iter()
        .find_map(|annotation| annotation.strip_prefix(prefix))?;
    if recorded.is_empty() {
        return Some(Vec::new());
    }
    recorded.split(',').map(|index| index.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_paths;
    use crate::value::{Kind, parse_value};

    fn prune(paths: &str, document: &str) -> Result<Value, PruneError> {
        parse_paths(paths).unwrap().prune(&parse_value(document).unwrap())
    }

    #[test]
    fn keeps_document_order() {
        let pruned = prune("/c, /a", "{a: 1, b: 2, c: 3}").unwrap();
        assert_eq!(pruned, parse_value("{a: 1, c: 3}").unwrap());
    }

    #[test]
    fn optional_properties_may_be_absent() {
        assert_eq!(
            prune("/a, /z?", "{a: 1}").unwrap(),
            parse_value("{a: 1}").unwrap()
        );
        assert_eq!(
            prune("/a, /z", "{a: 1}"),
            Err(PruneError::MissingRequiredProperty("z".to_string()))
        );
    }

    #[test]
    fn sequences_record_provenance() {
        let pruned = prune("/[2], /[0]", "tag::(a b c)").unwrap();
        assert_eq!(pruned.to_string(), "tag::'$indices:0,2'::(a c)");
        assert_eq!(provenance_indices(&pruned), Some(vec![0, 2]));
    }

    #[test]
    fn repruning_resolves_recorded_indices() {
        let tree = parse_paths("/items/[2], /items/[0]/id").unwrap();
        let once = tree
            .prune(&parse_value("{items: [{id: 1, x: 2}, b, c, d]}").unwrap())
            .unwrap();
        assert_eq!(once.to_string(), "{items:'$indices:0,2'::[{id:1},c]}");
        assert_eq!(tree.prune(&once).unwrap(), once);

        let narrower = parse_paths("/items/[2]").unwrap().prune(&once).unwrap();
        assert_eq!(narrower.to_string(), "{items:'$indices:2'::[c]}");
        assert_eq!(
            parse_paths("/items/[1]").unwrap().prune(&once),
            Err(PruneError::MissingRequiredIndex(1))
        );
    }

    #[test]
    fn custom_provenance_prefix() {
        let tree = parse_paths("/[1]").unwrap();
        let options = crate::options::Options::default().with_provenance_prefix("from:");
        let pruned = tree
            .prune_with(&parse_value("[x, y]").unwrap(), &options)
            .unwrap();
        assert_eq!(provenance_indices_with(&pruned, "from:"), Some(vec![1]));
        assert_eq!(provenance_indices(&pruned), None);
    }

    #[test]
    fn wildcards_keep_every_child() {
        let pruned = prune("/items/[*]/id", "{items: [{id: 1, x: 2}, {id: 3}]}").unwrap();
        assert_eq!(pruned, parse_value("{items: [{id: 1}, {id: 3}]}").unwrap());
        assert_eq!(
            prune("/items/[*]", "{items: []}"),
            Err(PruneError::EmptyRequiredContainer {
                selector: "items".to_string()
            })
        );
        assert_eq!(
            prune("/items/[*]?", "{items: []}").unwrap(),
            parse_value("{items: []}").unwrap()
        );
    }

    #[test]
    fn null_containers() {
        assert_eq!(
            prune("/a/b", "{a: null.struct}"),
            Err(PruneError::MissingRequiredContainer {
                selector: "a".to_string()
            })
        );
        assert_eq!(
            prune("/a/b?", "{a: null}").unwrap(),
            parse_value("{a: null}").unwrap()
        );
    }

    #[test]
    fn shape_mismatches() {
        assert_eq!(
            prune("/a/[0]", "{a: {b: 1}}"),
            Err(PruneError::StructureMismatch {
                selector: "a".to_string(),
                expected: "list or sexp",
                found: Kind::Struct,
            })
        );
    }
}
