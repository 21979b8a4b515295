//! Snapshot types. A snapshot carries the stored documents and the trie's node
//! graph, enough to rebuild an index without tokenizing anything again. The
//! document-to-node map and the node counter are not part of it.
//!
//! The graph nests one level per token character, so nothing here may recurse
//! on the host stack: dropping and comparing walk a heap stack, and JSON goes
//! through `serde_stacker` with serde_json's recursion limit lifted.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};

/// One trie node and, by value, everything below it.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGraph {
    pub index: u64,
    #[serde(default)]
    pub children: BTreeMap<char, NodeGraph>,
    #[serde(default)]
    pub document_ids: BTreeMap<String, bool>,
}

impl Drop for NodeGraph {
    fn drop(&mut self) {
        let mut stack: Vec<NodeGraph> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl PartialEq for NodeGraph {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.index != b.index
                || a.document_ids != b.document_ids
                || a.children.len() != b.children.len()
            {
                return false;
            }
            for ((ca, na), (cb, nb)) in a.children.iter().zip(b.children.iter()) {
                if ca != cb {
                    return false;
                }
                stack.push((na, nb));
            }
        }
        true
    }
}

impl fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGraph")
            .field("index", &self.index)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("document_ids", &self.document_ids.len())
            .finish()
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedIndex {
    /// Stored documents in document-list order.
    pub list: Vec<Value>,
    pub root: NodeGraph,
}

impl SerializedIndex {
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        write_json(&mut buf, self)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(s: &str) -> Result<Self> { read_json(s.as_bytes()) }
}

/// Writes `value` as JSON, growing the stack on demand for deep graphs.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let mut ser = serde_json::Serializer::new(writer);
    value.serialize(serde_stacker::Serializer::new(&mut ser))?;
    Ok(())
}

/// Reads JSON of any nesting depth.
pub fn read_json<R: Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain(depth: usize) -> NodeGraph {
        let mut node = NodeGraph::default();
        node.index = depth as u64;
        node.document_ids.insert("d1".into(), true);
        for i in (0..depth).rev() {
            let mut parent = NodeGraph::default();
            parent.index = i as u64;
            parent.children.insert('x', node);
            node = parent;
        }
        node
    }

    #[test]
    fn wire_format_field_names() {
        let mut root = NodeGraph::default();
        let mut child = NodeGraph::default();
        child.index = 1;
        child.document_ids.insert("d1".into(), true);
        root.children.insert('a', child);
        let snapshot = SerializedIndex { list: vec![json!({"id": "d1"})], root };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["root"]["children"]["a"]["documentIds"]["d1"], json!(true));
        assert_eq!(value["root"]["children"]["a"]["index"], json!(1));

        let back = SerializedIndex::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn multi_char_keys_are_rejected() {
        let bad = r#"{"list": [], "root": {"index": 0, "children": {"ab": {"index": 1}}}}"#;
        assert!(SerializedIndex::from_json(bad).is_err());
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(SerializedIndex::from_json(r#"{"list": [], "root": {"index": 0}} x"#).is_err());
    }

    #[test]
    fn deep_graph_round_trips_and_drops() {
        let snapshot = SerializedIndex { list: vec![json!({"id": "d1"})], root: chain(10_000) };
        let json = snapshot.to_json().unwrap();
        let back = SerializedIndex::from_json(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_ne!(back.root, chain(9_999));
        drop(back);
        drop(snapshot);
    }
}
