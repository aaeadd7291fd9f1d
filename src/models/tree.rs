//! Arena of tree nodes linked by parent ids.
//!
//! Parent links are plain ids and the database does not enforce
//! acyclicity, so every upward walk is bounded by a visited set and a
//! maximum depth.
use std::collections::{HashMap, HashSet};

/// Node that knows its own id and the id of its parent
pub trait TreeNode {
    fn node_id(&self) -> i32;
    fn parent_id(&self) -> Option<i32>;
}

#[derive(Debug, Clone)]
pub struct TreeArena<N: TreeNode> {
    nodes: HashMap<i32, N>,
}

impl<N: TreeNode> TreeArena<N> {
    pub fn new(nodes: Vec<N>) -> Self {
        let nodes = nodes.into_iter().map(|node| (node.node_id(), node)).collect();
        Self { nodes }
    }

    pub fn get(&self, id: i32) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes from `id` up to its root, starting node first.
    /// Returns `None` when `id` is not in the arena.
    pub fn lineage(&self, id: i32, max_depth: usize) -> Option<Vec<&N>> {
        let mut current = self.nodes.get(&id)?;
        let mut visited = HashSet::new();
        let mut lineage = vec![];

        loop {
            visited.insert(current.node_id());
            lineage.push(current);

            let parent_id = match current.parent_id() {
                Some(parent_id) => parent_id,
                None => break,
            };
            if visited.contains(&parent_id) {
                warn!("Cycle detected in tree at node {} (parent {})", current.node_id(), parent_id);
                break;
            }
            if lineage.len() >= max_depth {
                warn!("Tree walk from node {} stopped at max depth {}", id, max_depth);
                break;
            }
            current = match self.nodes.get(&parent_id) {
                Some(parent) => parent,
                None => {
                    warn!("Node {} references missing parent {}", current.node_id(), parent_id);
                    break;
                }
            };
        }

        Some(lineage)
    }

    /// Ids of `id` and all of its ancestors, starting node first
    pub fn lineage_ids(&self, id: i32, max_depth: usize) -> Option<Vec<i32>> {
        self.lineage(id, max_depth)
            .map(|nodes| nodes.into_iter().map(TreeNode::node_id).collect())
    }
}
