//! Folder nodes and the pure algorithms over them.
//!
//! A project's hierarchy is a forest: an ordered list of root nodes, each
//! with an ordered list of children. Node ids are unique across the whole
//! forest. Every function here takes a forest by reference and returns a
//! new one; none of them fail. An operation naming an id that is not in
//! the forest returns the forest unchanged.

use folio_types::NodeId;
use serde::{Deserialize, Deserializer, Serialize};

/// One named entry of the folder hierarchy.
///
/// A node without children is a leaf and stands for one file; every node,
/// leaf or not, owns a file blob addressed by its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<FolderNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// Documents written by older clients carry `"children": null` on leaves.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FolderNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FolderNode>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Find a node anywhere in the forest.
pub fn find<'a>(forest: &'a [FolderNode], id: &NodeId) -> Option<&'a FolderNode> {
    for node in forest {
        if &node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn contains(forest: &[FolderNode], id: &NodeId) -> bool {
    find(forest, id).is_some()
}

/// Every id in the forest, in pre-order.
pub fn all_ids(forest: &[FolderNode]) -> Vec<NodeId> {
    let mut ids = Vec::new();
    for node in forest {
        ids.push(node.id);
        ids.extend(all_ids(&node.children));
    }
    ids
}

/// Ids of `node`'s subtree in depth-first post-order: each child's subtree
/// fully before the child itself, and `node` last.
pub fn post_order(node: &FolderNode) -> Vec<NodeId> {
    let mut ids = Vec::new();
    collect_post_order(node, &mut ids);
    ids
}

fn collect_post_order(node: &FolderNode, out: &mut Vec<NodeId>) {
    for child in &node.children {
        collect_post_order(child, out);
    }
    out.push(node.id);
}

/// Ids strictly below `node`.
pub fn descendants(node: &FolderNode) -> Vec<NodeId> {
    let mut ids = post_order(node);
    ids.pop();
    ids
}

/// Append `node` under `parent`, or at the root when `parent` is `None`.
///
/// Unknown parents leave the forest unchanged, as does a node whose id (or
/// any id in its subtree) is already present.
pub fn insert(forest: &[FolderNode], parent: Option<&NodeId>, node: FolderNode) -> Vec<FolderNode> {
    if post_order(&node).iter().any(|id| contains(forest, id)) {
        return forest.to_vec();
    }
    match parent {
        None => {
            let mut out = forest.to_vec();
            out.push(node);
            out
        }
        Some(parent) => insert_under(forest, parent, &node),
    }
}

fn insert_under(forest: &[FolderNode], parent: &NodeId, node: &FolderNode) -> Vec<FolderNode> {
    forest
        .iter()
        .map(|n| {
            let mut children = insert_under(&n.children, parent, node);
            if &n.id == parent {
                children.push(node.clone());
            }
            FolderNode {
                id: n.id,
                name: n.name.clone(),
                children,
            }
        })
        .collect()
}

/// Replace the name of the node with `id`, wherever it is.
pub fn rename(forest: &[FolderNode], id: &NodeId, name: &str) -> Vec<FolderNode> {
    forest
        .iter()
        .map(|n| FolderNode {
            id: n.id,
            name: if &n.id == id { name.to_string() } else { n.name.clone() },
            children: rename(&n.children, id, name),
        })
        .collect()
}

/// Remove the node with `id` together with its subtree.
pub fn delete(forest: &[FolderNode], id: &NodeId) -> Vec<FolderNode> {
    forest
        .iter()
        .filter(|n| &n.id != id)
        .map(|n| FolderNode {
            id: n.id,
            name: n.name.clone(),
            children: delete(&n.children, id),
        })
        .collect()
}
