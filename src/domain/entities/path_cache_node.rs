//! Persistent path -> record-number cache tree.
//!
//! One tree is kept per drive letter, rooted at record 5 (the volume
//! root directory). Lookup is case-insensitive and returns the longest
//! matching prefix so a resolver can continue from wherever the cache
//! runs out. Grounded in the `__find_last_known_path`/cache-tree
//! handling of the original tool this system is modeled on; the
//! storage format itself is defined in `infrastructure::persistence`.

use crate::domain::services::naming;
use std::collections::BTreeMap;

/// A node in the path cache tree. Children are keyed by lowercased name
/// so lookups are case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCacheNode {
    name: String,
    record_number: u64,
    children: BTreeMap<String, PathCacheNode>,
}

impl PathCacheNode {
    /// An empty root node, matching the "absence of a saved cache"
    /// behavior: record number 5, no children.
    pub fn new_root() -> Self {
        Self {
            name: String::new(),
            record_number: 5,
            children: BTreeMap::new(),
        }
    }

    pub fn with_record(name: String, record_number: u64) -> Self {
        Self {
            name,
            record_number,
            children: BTreeMap::new(),
        }
    }

    /// Reconstructs a node with a fully-formed set of children, used by
    /// [`crate::infrastructure::persistence::LocalPathCacheStore`] when
    /// decoding a saved tree bottom-up.
    pub fn from_parts(name: String, record_number: u64, children: Vec<PathCacheNode>) -> Self {
        let children = children
            .into_iter()
            .map(|child| (child.name.to_lowercase(), child))
            .collect();
        Self {
            name,
            record_number,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_number(&self) -> u64 {
        self.record_number
    }

    pub fn children(&self) -> impl Iterator<Item = &PathCacheNode> {
        self.children.values()
    }

    /// Inserts (or updates) a child by name. Idempotent: if a child with
    /// the same lowercased name already exists, it is kept unless
    /// `name` is a "better" name for the same record under
    /// [`naming::prefer`], in which case the node's display name is
    /// replaced while the record number and children are preserved.
    pub fn insert(&mut self, name: &str, record_number: u64) -> &mut PathCacheNode {
        let key = name.to_lowercase();
        let entry = self
            .children
            .entry(key)
            .or_insert_with(|| PathCacheNode::with_record(name.to_string(), record_number));

        if entry.record_number != record_number {
            // The cache learned this record moved or was reused; trust
            // the fresh resolution and drop any stale children.
            entry.record_number = record_number;
            entry.children.clear();
            entry.name = name.to_string();
        } else if naming::prefer(name, &entry.name) {
            entry.name = name.to_string();
        }

        entry
    }

    /// Looks up `components` case-insensitively, returning the deepest
    /// node reached and the suffix of components that were not found.
    pub fn longest_prefix<'a>(&self, components: &'a [String]) -> (&PathCacheNode, &'a [String]) {
        let mut node = self;
        for (index, component) in components.iter().enumerate() {
            let key = component.to_lowercase();
            match node.children.get(&key) {
                Some(child) => node = child,
                None => return (node, &components[index..]),
            }
        }
        (node, &[])
    }

    pub fn child(&self, name: &str) -> Option<&PathCacheNode> {
        self.children.get(&name.to_lowercase())
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut PathCacheNode> {
        self.children.get_mut(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_root_is_record_five_with_no_children() {
        let root = PathCacheNode::new_root();
        assert_eq!(root.record_number(), 5);
        assert_eq!(root.children().count(), 0);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut root = PathCacheNode::new_root();
        root.insert("Windows", 100);

        let components = vec!["WINDOWS".to_string()];
        let (node, remaining) = root.longest_prefix(&components);
        assert_eq!(node.record_number(), 100);
        assert!(remaining.is_empty());
    }

    #[test]
    fn longest_prefix_stops_at_first_miss() {
        let mut root = PathCacheNode::new_root();
        root.insert("windows", 100);

        let components = vec!["windows".to_string(), "system32".to_string()];
        let (node, remaining) = root.longest_prefix(&components);
        assert_eq!(node.record_number(), 100);
        assert_eq!(remaining, ["system32".to_string()]);
    }

    #[test]
    fn insert_is_idempotent_for_same_record() {
        let mut root = PathCacheNode::new_root();
        root.insert("windows", 100);
        root.insert("windows", 100);
        assert_eq!(root.children().count(), 1);
    }

    #[test]
    fn insert_prefers_long_name_over_short_name_for_same_record() {
        let mut root = PathCacheNode::new_root();
        root.insert("PROGRA~1", 200);
        root.insert("Program Files", 200);
        let child = root.child("program files").unwrap();
        assert_eq!(child.name(), "Program Files");
    }

    #[test]
    fn insert_replaces_children_when_record_changes() {
        let mut root = PathCacheNode::new_root();
        let node = root.insert("windows", 100);
        node.insert("system32", 101);
        assert_eq!(root.child("windows").unwrap().children().count(), 1);

        root.insert("windows", 999);
        assert_eq!(root.child("windows").unwrap().record_number(), 999);
        assert_eq!(root.child("windows").unwrap().children().count(), 0);
    }
}
