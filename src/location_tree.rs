//! Location Tree
//!
//! Registry of the UI locations currently mounted by a tracker. Each node points
//! at its parent by [`InstanceId`]; the synthetic root lives at index 0 with
//! [`InstanceId::ROOT`]. The tree exists to detect collisions: two distinct nodes
//! whose root-to-node `type:id` paths are identical, which would make events from
//! them indistinguishable.
//!
//! Collisions are diagnostics only. Adding and removing nodes always succeeds,
//! except that an instance already in the tree is not mounted a second time.

use crate::diagnostics::SharedSink;
use crate::event::{InstanceId, LocationContext, TaxonomyContext};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

const ROOT_TYPE: &str = "__root__";

/// A mounted location. `parent` is `None` only for the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    pub context_type: String,
    pub id: String,
    pub instance_id: InstanceId,
    pub parent: Option<InstanceId>,
}

impl LocationNode {
    fn root() -> Self {
        Self {
            context_type: ROOT_TYPE.to_string(),
            id: ROOT_TYPE.to_string(),
            instance_id: InstanceId::ROOT,
            parent: None,
        }
    }

    fn from_context(context: &LocationContext, parent: InstanceId) -> Self {
        Self {
            context_type: context.context_type.clone(),
            id: context.id.clone(),
            instance_id: context.instance_id,
            parent: Some(parent),
        }
    }

    fn path_segment(&self) -> String {
        format!("{}:{}", self.context_type, self.id)
    }
}

pub struct LocationTree {
    nodes: Vec<LocationNode>,
    /// Nodes already reported as colliding. Cleared with the tree.
    errors: HashSet<InstanceId>,
    sink: SharedSink,
}

impl LocationTree {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            nodes: vec![LocationNode::root()],
            errors: HashSet::new(),
            sink,
        }
    }

    /// Number of nodes, not counting the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, instance_id: InstanceId) -> bool {
        self.position(instance_id).is_some()
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<&LocationNode> {
        self.position(instance_id).map(|index| &self.nodes[index])
    }

    /// All nodes in insertion order, synthetic root excluded.
    pub fn nodes(&self) -> impl Iterator<Item = &LocationNode> {
        self.nodes.iter().skip(1)
    }

    /// Adds `node` under `parent` (or under the root) and re-validates the tree.
    /// Returns the nodes that collide after the addition.
    ///
    /// An instance that is already mounted is reported and left where it is.
    pub fn add(
        &mut self,
        node: &LocationContext,
        parent: Option<&LocationContext>,
    ) -> Vec<InstanceId> {
        let parent_id = parent
            .map(|p| p.instance_id())
            .unwrap_or(InstanceId::ROOT);
        if self.contains(node.instance_id()) || node.instance_id() == parent_id {
            self.sink.error(&format!(
                "Location already mounted: {} ({})",
                node.path_segment(),
                node.instance_id()
            ));
            return self.validate();
        }
        if !self.contains(parent_id) {
            debug!(
                node = %node.path_segment(),
                parent = %parent_id,
                "Location added under a parent that is not in the tree"
            );
        }
        self.nodes.push(LocationNode::from_context(node, parent_id));
        self.validate()
    }

    /// Depth-first collision check from the root.
    ///
    /// The set of seen paths is shared by the whole traversal. A colliding node's
    /// subtree is not visited, so its descendants never report on their own.
    /// Each colliding node is reported to the sink once until the tree is cleared.
    pub fn validate(&mut self) -> Vec<InstanceId> {
        let children = self.child_index();
        let mut seen: HashSet<String> = HashSet::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut collisions = Vec::new();

        let mut stack: Vec<(usize, String)> = Vec::new();
        push_children(&mut stack, &children, &self.nodes, InstanceId::ROOT, "");

        while let Some((index, path)) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let node = &self.nodes[index];
            if !seen.insert(path.clone()) {
                collisions.push(node.instance_id);
                if self.errors.insert(node.instance_id) {
                    self.sink
                        .error(&format!("Location collision detected: {}", path));
                }
                continue;
            }
            push_children(&mut stack, &children, &self.nodes, node.instance_id, &path);
        }

        collisions
    }

    /// Removes `node`, then prunes every node whose parent chain no longer
    /// reaches the root. Returns the number of nodes removed.
    pub fn remove(&mut self, node: &LocationContext) -> usize {
        self.remove_instance(node.instance_id())
    }

    pub fn remove_instance(&mut self, instance_id: InstanceId) -> usize {
        if instance_id == InstanceId::ROOT {
            return 0;
        }
        let Some(index) = self.position(instance_id) else {
            return 0;
        };

        self.nodes.remove(index);
        self.errors.remove(&instance_id);
        let removed = 1 + self.prune_orphans();

        debug!(instance_id = %instance_id, removed, "Removed location subtree");
        removed
    }

    /// Direct children of `node`.
    pub fn children(&self, node: &LocationContext) -> Vec<&LocationNode> {
        self.children_of(node.instance_id())
    }

    pub fn children_of(&self, parent: InstanceId) -> Vec<&LocationNode> {
        self.nodes
            .iter()
            .filter(|n| n.parent == Some(parent))
            .collect()
    }

    /// Drops every node and forgets reported collisions.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.errors.clear();
    }

    /// Drops nodes not reachable from the root: children of missing parents,
    /// their descendants, and detached cycles.
    fn prune_orphans(&mut self) -> usize {
        let children = self.child_index();
        let mut reachable: HashSet<usize> = HashSet::from([0]);
        let mut pending = VecDeque::from([InstanceId::ROOT]);
        while let Some(parent) = pending.pop_front() {
            for &child in children.get(&parent).into_iter().flatten() {
                if reachable.insert(child) {
                    pending.push_back(self.nodes[child].instance_id);
                }
            }
        }

        let before = self.nodes.len();
        let errors = &mut self.errors;
        let mut position = 0;
        self.nodes.retain(|node| {
            let keep = reachable.contains(&position);
            position += 1;
            if !keep {
                errors.remove(&node.instance_id);
            }
            keep
        });
        before - self.nodes.len()
    }

    fn position(&self, instance_id: InstanceId) -> Option<usize> {
        self.nodes.iter().position(|n| n.instance_id == instance_id)
    }

    fn child_index(&self) -> HashMap<InstanceId, Vec<usize>> {
        let mut index: HashMap<InstanceId, Vec<usize>> = HashMap::new();
        for (position, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                index.entry(parent).or_default().push(position);
            }
        }
        index
    }
}

/// Pushes children in reverse so they pop in insertion order.
fn push_children(
    stack: &mut Vec<(usize, String)>,
    children: &HashMap<InstanceId, Vec<usize>>,
    nodes: &[LocationNode],
    parent: InstanceId,
    parent_path: &str,
) {
    let Some(child_indices) = children.get(&parent) else {
        return;
    };
    for &child in child_indices.iter().rev() {
        let segment = nodes[child].path_segment();
        let path = if parent_path.is_empty() {
            segment
        } else {
            format!("{} / {}", parent_path, segment)
        };
        stack.push((child, path));
    }
}
