//! Character trie with per-node document sets.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to their children by handle.
//! Each node records the ids of every document that has a token passing
//! through it, so any node doubles as the match set for the prefix it
//! represents. A second map from document id to node handles makes removal
//! proportional to what the document touched rather than to the trie size.
//!
//! Nodes are never freed: removing a document only strips its id from the
//! nodes it reached. Branches left without documents stay in the arena until
//! the whole trie is cleared.

use crate::document::DocId;
use crate::persist::NodeGraph;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Position of a node in the arena.
pub type NodeHandle = usize;

const ROOT: NodeHandle = 0;

#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Creation counter value; unique within one counter lineage only.
    pub index: u64,
    children: HashMap<char, NodeHandle>,
    doc_ids: HashSet<DocId>,
}

impl Node {
    fn new(index: u64) -> Self { Self { index, ..Self::default() } }

    pub fn doc_ids(&self) -> &HashSet<DocId> { &self.doc_ids }

    pub fn child(&self, c: char) -> Option<NodeHandle> { self.children.get(&c).copied() }
}

#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
    node_refs: HashMap<DocId, HashSet<NodeHandle>>,
    next_index: u64,
}

impl Default for Trie {
    fn default() -> Self { Self::new() }
}

impl Trie {
    pub fn new() -> Self {
        let mut trie = Self { nodes: Vec::new(), node_refs: HashMap::new(), next_index: 0 };
        trie.make_node();
        trie
    }

    fn make_node(&mut self) -> NodeHandle {
        let handle = self.nodes.len();
        self.nodes.push(Node::new(self.next_index));
        self.next_index += 1;
        handle
    }

    fn store_reference(&mut self, doc_id: &str, handle: NodeHandle) {
        match self.node_refs.get_mut(doc_id) {
            Some(handles) => {
                handles.insert(handle);
            }
            None => {
                self.node_refs.insert(doc_id.to_string(), HashSet::from([handle]));
            }
        }
    }

    /// Threads `token` through the trie, creating missing nodes and recording
    /// `doc_id` on every node along the path.
    pub fn add_token(&mut self, token: &str, doc_id: &str) {
        let mut current = ROOT;
        for c in token.chars() {
            let child = match self.nodes[current].child(c) {
                Some(child) => child,
                None => {
                    let child = self.make_node();
                    self.nodes[current].children.insert(c, child);
                    child
                }
            };
            if !self.nodes[child].doc_ids.contains(doc_id) {
                self.nodes[child].doc_ids.insert(doc_id.to_string());
            }
            self.store_reference(doc_id, child);
            current = child;
        }
    }

    /// Strips `doc_id` from every node it reached. Unknown ids are a no-op.
    /// Returns the number of nodes touched.
    pub fn remove_document(&mut self, doc_id: &str) -> usize {
        let Some(handles) = self.node_refs.remove(doc_id) else {
            return 0;
        };
        for &handle in &handles {
            self.nodes[handle].doc_ids.remove(doc_id);
        }
        handles.len()
    }

    /// Documents on the node reached by walking `token`, or `None` when the
    /// walk falls off the trie. A token that is a prefix of indexed tokens
    /// matches too.
    pub fn search_token(&self, token: &str) -> Option<&HashSet<DocId>> {
        let mut current = ROOT;
        for c in token.chars() {
            current = self.nodes[current].child(c)?;
        }
        Some(&self.nodes[current].doc_ids)
    }

    pub fn clear(&mut self) { *self = Self::new(); }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> { self.nodes.get(handle) }

    /// Handles of the nodes that currently hold `doc_id`.
    pub fn nodes_for_document(&self, doc_id: &str) -> Option<&HashSet<NodeHandle>> {
        self.node_refs.get(doc_id)
    }

    /// Deep copy of the node graph, built bottom-up without recursion.
    pub fn to_graph(&self) -> NodeGraph {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(handle) = stack.pop() {
            order.push(handle);
            stack.extend(self.nodes[handle].children.values().copied());
        }

        // children come after their parent in `order`, so walking it backwards
        // always finds them already built
        let mut built: HashMap<NodeHandle, NodeGraph> = HashMap::with_capacity(order.len());
        for &handle in order.iter().rev() {
            let node = &self.nodes[handle];
            let children: BTreeMap<char, NodeGraph> = node
                .children
                .iter()
                .filter_map(|(&c, child)| built.remove(child).map(|graph| (c, graph)))
                .collect();
            let document_ids = node.doc_ids.iter().map(|id| (id.clone(), true)).collect();
            built.insert(handle, NodeGraph { index: node.index, children, document_ids });
        }
        built.remove(&ROOT).unwrap_or_default()
    }

    /// Rebuilds a trie from a node graph, restoring the document-to-node map
    /// from the document sets it finds. The node counter restarts at zero.
    pub fn from_graph(root: NodeGraph) -> Self {
        let mut trie = Self { nodes: Vec::new(), node_refs: HashMap::new(), next_index: 0 };
        let mut stack: Vec<(NodeGraph, Option<(NodeHandle, char)>)> = vec![(root, None)];
        while let Some((mut graph, parent)) = stack.pop() {
            let children = std::mem::take(&mut graph.children);
            let document_ids = std::mem::take(&mut graph.document_ids);
            let index = graph.index;
            let handle = trie.nodes.len();
            let mut node = Node::new(index);
            for (doc_id, present) in document_ids {
                if present {
                    trie.store_reference(&doc_id, handle);
                    node.doc_ids.insert(doc_id);
                }
            }
            trie.nodes.push(node);
            if let Some((parent, c)) = parent {
                trie.nodes[parent].children.insert(c, handle);
            }
            stack.extend(children.into_iter().map(|(c, child)| (child, Some((handle, c)))));
        }
        trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: Option<&HashSet<DocId>>) -> Vec<String> {
        let mut v: Vec<String> = set.map(|s| s.iter().cloned().collect()).unwrap_or_default();
        v.sort();
        v
    }

    #[test]
    fn add_creates_one_node_per_char() {
        let mut trie = Trie::new();
        trie.add_token("cat", "d1");
        assert_eq!(trie.node_count(), 4);
        trie.add_token("car", "d2");
        assert_eq!(trie.node_count(), 5);
        trie.add_token("cow", "d3");
        assert_eq!(trie.node_count(), 7);
    }

    #[test]
    fn node_indices_increase() {
        let mut trie = Trie::new();
        trie.add_token("ab", "d1");
        let a = trie.node(ROOT).and_then(|n| n.child('a')).unwrap();
        let b = trie.node(a).and_then(|n| n.child('b')).unwrap();
        assert_eq!(trie.node(ROOT).unwrap().index, 0);
        assert_eq!(trie.node(a).unwrap().index, 1);
        assert_eq!(trie.node(b).unwrap().index, 2);
    }

    #[test]
    fn prefixes_match() {
        let mut trie = Trie::new();
        trie.add_token("cat", "d1");
        trie.add_token("catheter", "d2");
        trie.add_token("car", "d3");
        assert_eq!(ids(trie.search_token("ca")), vec!["d1", "d2", "d3"]);
        assert_eq!(ids(trie.search_token("cat")), vec!["d1", "d2"]);
        assert_eq!(ids(trie.search_token("cath")), vec!["d2"]);
        assert!(trie.search_token("dog").is_none());
        assert!(trie.search_token("cats").is_none());
    }

    #[test]
    fn root_holds_no_documents() {
        let mut trie = Trie::new();
        trie.add_token("a", "d1");
        assert_eq!(ids(trie.search_token("")), Vec::<String>::new());
    }

    #[test]
    fn remove_touches_only_referenced_nodes() {
        let mut trie = Trie::new();
        trie.add_token("cat", "d1");
        trie.add_token("car", "d2");
        assert_eq!(trie.nodes_for_document("d1").map(|s| s.len()), Some(3));
        assert_eq!(trie.remove_document("d1"), 3);
        assert_eq!(ids(trie.search_token("ca")), vec!["d2"]);
        assert_eq!(ids(trie.search_token("cat")), Vec::<String>::new());
        assert!(trie.nodes_for_document("d1").is_none());
        // nodes are kept
        assert_eq!(trie.node_count(), 5);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut trie = Trie::new();
        trie.add_token("cat", "d1");
        assert_eq!(trie.remove_document("nope"), 0);
        assert_eq!(ids(trie.search_token("cat")), vec!["d1"]);
    }

    #[test]
    fn graph_round_trip_rebuilds_references() {
        let mut trie = Trie::new();
        trie.add_token("cat", "d1");
        trie.add_token("cow", "d2");
        let graph = trie.to_graph();
        assert_eq!(graph.index, 0);
        assert_eq!(graph.children.len(), 1);

        let mut restored = Trie::from_graph(graph);
        assert_eq!(restored.node_count(), trie.node_count());
        assert_eq!(ids(restored.search_token("c")), vec!["d1", "d2"]);
        assert_eq!(restored.nodes_for_document("d2").map(|s| s.len()), Some(3));

        restored.remove_document("d2");
        assert_eq!(ids(restored.search_token("c")), vec!["d1"]);
    }

    #[test]
    fn long_tokens_do_not_recurse() {
        let mut trie = Trie::new();
        let token: String = std::iter::repeat('x').take(10_000).collect();
        trie.add_token(&token, "d1");
        let restored = Trie::from_graph(trie.to_graph());
        assert_eq!(ids(restored.search_token(&token)), vec!["d1"]);

        // an unconsumed graph must drop without recursing either
        let graph = trie.to_graph();
        assert_eq!(graph.children.len(), 1);
        drop(graph);
    }
}
