use crate::flatten::FlatNode;
use crate::flatten::flatten;
use crate::node::Node;
use crate::node::NodePath;
use std::collections::HashMap;
use std::collections::HashSet;

/// Children fetched for a set of paths, applied to the cache in one step.
#[derive(Clone, Debug, Default)]
pub struct BatchUpdate {
    pub children: Vec<(NodePath, Vec<Node>)>,
    /// Paths whose children were already cached and only need re-expanding.
    pub reexpand: Vec<NodePath>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.reexpand.is_empty()
    }
}

/// Client-side record of what has been fetched and what is open.
///
/// A key in `children` (even with an empty list) means the path has been
/// fetched; a missing key means it has not. Every expanded path has a
/// `children` entry.
#[derive(Clone, Debug, Default)]
pub struct ExpansionCache {
    expanded: HashSet<NodePath>,
    children: HashMap<NodePath, Vec<Node>>,
    cursor: usize,
    expanding_lock: Option<NodePath>,
    is_expanding: bool,
    initial_expansion_done: bool,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flatten(&self, roots: &[Node]) -> Vec<FlatNode> {
        flatten(roots, &self.expanded, &self.children)
    }

    pub fn expanded(&self) -> &HashSet<NodePath> {
        &self.expanded
    }

    pub fn children(&self) -> &HashMap<NodePath, Vec<Node>> {
        &self.children
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.expanded.contains(path)
    }

    pub fn has_children(&self, path: &NodePath) -> bool {
        self.children.contains_key(path)
    }

    pub fn children_of(&self, path: &NodePath) -> Option<&[Node]> {
        self.children.get(path).map(Vec::as_slice)
    }

    pub fn insert_children(&mut self, path: NodePath, nodes: Vec<Node>) {
        self.children.insert(path, nodes);
    }

    /// Marks `path` expanded. Refused (returns `false`) when nothing has
    /// been fetched for it.
    pub fn expand(&mut self, path: &NodePath) -> bool {
        if !self.children.contains_key(path) {
            return false;
        }
        self.expanded.insert(path.clone());
        true
    }

    /// Stores freshly fetched children and opens the path.
    pub fn insert_expanded(&mut self, path: NodePath, nodes: Vec<Node>) {
        self.expanded.insert(path.clone());
        self.children.insert(path, nodes);
    }

    /// Closes `path`; its children stay cached.
    pub fn collapse(&mut self, path: &NodePath) -> bool {
        self.expanded.remove(path)
    }

    /// Opens every path whose cached children are non-empty.
    pub fn expand_all(&mut self) {
        self.expanded = self
            .children
            .iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(path, _)| path.clone())
            .collect();
    }

    pub fn collapse_to_root(&mut self) {
        self.expanded.clear();
    }

    pub fn merge(&mut self, update: BatchUpdate) {
        for (path, nodes) in update.children {
            self.insert_expanded(path, nodes);
        }
        for path in update.reexpand {
            self.expand(&path);
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    pub fn expanding_lock(&self) -> Option<&NodePath> {
        self.expanding_lock.as_ref()
    }

    /// Takes the full-expansion lock for `path`. `false` if it is held.
    pub fn try_lock(&mut self, path: &NodePath) -> bool {
        if self.expanding_lock.is_some() {
            return false;
        }
        self.expanding_lock = Some(path.clone());
        true
    }

    pub fn release_lock(&mut self) {
        self.expanding_lock = None;
    }

    pub fn is_expanding(&self) -> bool {
        self.is_expanding
    }

    pub fn set_expanding(&mut self, value: bool) {
        self.is_expanding = value;
    }

    pub fn initial_expansion_done(&self) -> bool {
        self.initial_expansion_done
    }

    pub fn mark_initial_expansion_done(&mut self) {
        self.initial_expansion_done = true;
    }

    /// Drops everything at once.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
