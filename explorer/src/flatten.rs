use crate::node::Node;
use crate::node::NodePath;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// A visible row: the node, where it sits, and how deep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlatNode {
    pub node: Node,
    pub path: NodePath,
    pub depth: usize,
}

/// Depth-first, pre-order listing of every visible node.
///
/// A node's children are visited only when its path is both expanded and
/// present in `children`. No path is emitted twice in one pass, so a backend
/// that hands out cyclic structures still terminates.
pub fn flatten(
    roots: &[Node],
    expanded: &HashSet<NodePath>,
    children: &HashMap<NodePath, Vec<Node>>,
) -> Vec<FlatNode> {
    let mut out = Vec::new();
    let mut visited: HashSet<NodePath> = HashSet::new();
    let mut stack: Vec<(&Node, NodePath, usize)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(index, node)| (node, NodePath::root(node, index), 0))
        .collect();

    while let Some((node, path, depth)) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }
        if expanded.contains(&path)
            && let Some(kids) = children.get(&path)
        {
            for (index, child) in kids.iter().enumerate().rev() {
                stack.push((child, path.child(child, index), depth + 1));
            }
        }
        out.push(FlatNode {
            node: node.clone(),
            path,
            depth,
        });
    }
    out
}
