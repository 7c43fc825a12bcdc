//! Version graphs and lowest-common-ancestor search.
//!
//! Versions form a DAG: a merge version has several parents. Nodes live in an
//! arena and refer to their parents by [`NodeId`], and a parent must exist
//! before any of its children, so the graph is acyclic by construction.

use std::collections::HashMap;

pub use crate::error::GraphError;

/// Index of a node in a [`VersionGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNode {
    id: String,
    message: String,
    parents: Vec<NodeId>,
}

impl VersionNode {
    /// The version identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The version message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The direct parents of this version.
    #[must_use]
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }
}

/// An arena of versions connected by parent edges.
#[derive(Debug, Clone, Default)]
pub struct VersionGraph {
    nodes: Vec<VersionNode>,
    ids: HashMap<String, NodeId>,
}

impl VersionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version with the given parents and returns its index.
    ///
    /// # Errors
    ///
    /// Fails if the identifier is already taken or a parent index is unknown.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        message: impl Into<String>,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let id = id.into();
        if self.ids.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        if let Some(unknown) = parents.iter().find(|p| p.0 >= self.nodes.len()) {
            return Err(GraphError::UnknownNode(unknown.0));
        }

        let node = NodeId(self.nodes.len());
        self.ids.insert(id.clone(), node);
        self.nodes.push(VersionNode {
            id,
            message: message.into(),
            parents: parents.to_vec(),
        });
        Ok(node)
    }

    /// Looks up a version by identifier.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Returns the node at `id`.
    ///
    /// # Errors
    ///
    /// Fails if the index does not belong to this graph.
    pub fn node(&self, id: NodeId) -> Result<&VersionNode, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id.0))
    }

    /// Returns the number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph has no versions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Maps every ancestor of `node` (including itself, at distance 0) to the
    /// length of the shortest parent path reaching it.
    ///
    /// A node is only expanded again when a strictly shorter path to it is
    /// found, which keeps diamond-shaped histories linear instead of
    /// exponential.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not belong to this graph.
    pub fn ancestors(&self, node: NodeId) -> Result<HashMap<NodeId, usize>, GraphError> {
        self.node(node)?;

        let mut distances = HashMap::new();
        let mut pending = vec![(node, 0_usize)];
        while let Some((current, distance)) = pending.pop() {
            match distances.get(&current) {
                Some(&known) if known <= distance => continue,
                _ => {
                    distances.insert(current, distance);
                }
            }
            for parent in &self.nodes[current.0].parents {
                pending.push((*parent, distance + 1));
            }
        }
        Ok(distances)
    }

    /// Finds the lowest common ancestor of two versions.
    ///
    /// Among all shared ancestors, the one with the smallest combined distance
    /// from both versions wins. When several ancestors tie, the one added to
    /// the graph first is returned; this choice is implementation-defined and
    /// callers should not rely on it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unrelated`] when the versions share no ancestor.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Result<NodeId, GraphError> {
        let left = self.node(a)?;
        let right = self.node(b)?;
        if a == b || left.id == right.id {
            return Ok(a);
        }

        let from_a = self.ancestors(a)?;
        let from_b = self.ancestors(b)?;

        from_a
            .iter()
            .filter_map(|(node, da)| from_b.get(node).map(|db| (da + db, *node)))
            .min()
            .map(|(_, node)| node)
            .ok_or_else(|| GraphError::Unrelated {
                left: left.id.clone(),
                right: right.id.clone(),
            })
    }
}
