use std::collections::{BTreeMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{Node, NodeId, NodeType};
use crate::domain::store::NodeStore;

/// Data payload for tree nodes representing registry nodes.
#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    /// Level as recorded on the node, which may be stale.
    pub recorded_level: u32,
    /// Depth in this tree, 0 for the root.
    pub depth: u32,
}

impl NodeData {
    fn from_node(node: &Node, depth: u32) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            node_type: node.node_type,
            recorded_level: node.hierarchy_level,
            depth,
        }
    }

    /// The recorded level no longer matches the node's position.
    pub fn is_stale(&self) -> bool {
        self.recorded_level != self.depth
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, level {})",
            self.id, self.name, self.node_type, self.recorded_level
        )?;
        if self.is_stale() {
            write!(f, " stale: actual depth {}", self.depth)?;
        }
        Ok(())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of the supplier in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of the clients in the arena
    pub children: Vec<Index>,
}

/// One supply chain: a root (normally a factory) and everybody buying below it.
///
/// Uses a generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug)]
pub struct SupplyTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for SupplyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SupplyTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Arrange the whole store into one tree per root.
    ///
    /// Roots are nodes without a supplier. Nodes whose supplier chain never
    /// reaches a root (only possible after low-level edits) become roots of
    /// their own trees so that every node shows up exactly once.
    #[instrument(level = "debug", skip(store))]
    pub fn build_forest(store: &NodeStore) -> Vec<SupplyTree> {
        let mut clients: BTreeMap<NodeId, Vec<&Node>> = BTreeMap::new();
        for node in store.nodes() {
            if let Some(s) = node.supplier {
                clients.entry(s).or_default().push(node);
            }
        }
        for list in clients.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        }

        let mut roots: Vec<&Node> = store.nodes().filter(|n| n.supplier.is_none()).collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut visited = HashSet::new();
        let mut trees = Vec::new();
        for root in roots {
            trees.push(Self::grow(root, &clients, &mut visited));
        }
        // orphans: the first unvisited node of each detached chain
        for node in store.nodes() {
            if !visited.contains(&node.id) {
                trees.push(Self::grow(node, &clients, &mut visited));
            }
        }
        trees
    }

    fn grow(
        root: &Node,
        clients: &BTreeMap<NodeId, Vec<&Node>>,
        visited: &mut HashSet<NodeId>,
    ) -> SupplyTree {
        let mut tree = SupplyTree::new();
        let mut stack = vec![(root, None, 0_u32)];
        while let Some((node, parent, depth)) = stack.pop() {
            if !visited.insert(node.id) {
                continue;
            }
            let idx = tree.insert_node(NodeData::from_node(node, depth), parent);
            if let Some(children) = clients.get(&node.id) {
                for &child in children.iter().rev() {
                    stack.push((child, Some(idx), depth + 1));
                }
            }
        }
        tree
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, clients in name order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of levels in this tree, 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter()
            .map(|(_, node)| node.data.depth as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Nodes at the end of the chain: nobody buys from them.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<&NodeData> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| &node.data)
            .collect()
    }

    /// Render for the terminal.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build(tree: &SupplyTree, idx: Index) -> Tree<String> {
            match tree.get_node(idx) {
                Some(node) => Tree::new(node.data.to_string())
                    .with_leaves(node.children.iter().map(|&c| build(tree, c))),
                None => Tree::new(String::new()),
            }
        }
        match self.root {
            Some(root) => build(self, root),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a SupplyTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a SupplyTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::zero_debt;
    use chrono::Utc;

    fn node(id: u64, name: &str, supplier: Option<u64>, level: u32) -> Node {
        let now = Utc::now();
        Node {
            id: NodeId(id),
            name: name.into(),
            node_type: if supplier.is_some() {
                NodeType::RetailNetwork
            } else {
                NodeType::Factory
            },
            email: "a@b.c".into(),
            country: "C".into(),
            city: "C".into(),
            street: "S".into(),
            house_number: "1".into(),
            supplier: supplier.map(NodeId),
            hierarchy_level: level,
            debt: zero_debt(),
            created_at: now,
            updated_at: now,
        }
    }

    fn store(nodes: Vec<Node>) -> NodeStore {
        let mut store = NodeStore::new();
        for n in nodes {
            store.insert_node(n).unwrap();
        }
        store
    }

    #[test]
    fn given_two_factories_when_building_forest_then_one_tree_each() {
        let store = store(vec![
            node(1, "Samsung", None, 0),
            node(2, "Apple", None, 0),
            node(3, "DNS", Some(2), 1),
            node(4, "Mvideo", Some(1), 1),
            node(5, "Ivanov", Some(4), 2),
        ]);

        let forest = SupplyTree::build_forest(&store);

        assert_eq!(forest.len(), 2);
        let apple = &forest[0];
        assert_eq!(apple.len(), 2);
        let samsung = &forest[1];
        assert_eq!(samsung.depth(), 3);
        let leaves: Vec<_> = samsung.leaf_nodes().iter().map(|d| d.id).collect();
        assert_eq!(leaves, vec![NodeId(5)]);
    }

    #[test]
    fn given_stale_level_when_rendered_then_flags_it() {
        // level 3 recorded, but the node sits right below a factory
        let store = store(vec![node(1, "F", None, 0), node(2, "R", Some(1), 3)]);
        let forest = SupplyTree::build_forest(&store);
        let rendered = forest[0].to_tree_string().to_string();
        assert!(rendered.contains("stale: actual depth 1"), "{rendered}");
    }
}
