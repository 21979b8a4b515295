use crate::document::{field_text, indexable_values, strip_exclusions, DocId};
use crate::error::{Error, Result};
use crate::options::IndexOptions;
use crate::persist::SerializedIndex;
use crate::sort::ordered_insert;
use crate::trie::Trie;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Value,
    /// Number of distinct query tokens that reached this document.
    pub score: u32,
}

/// Initial contents of a new [`Index`].
#[derive(Debug, Default)]
pub enum Source {
    #[default]
    Empty,
    Documents(Vec<Value>),
    /// A previous [`Index::serialize`] result; nothing is tokenized.
    Snapshot(SerializedIndex),
}

#[derive(Debug, Clone)]
struct StoredDocument {
    /// Insertion sequence, used to break ranking ties.
    seq: u64,
    document: Value,
}

#[derive(Debug, Clone)]
struct ListEntry {
    id: DocId,
    result: SearchResult,
}

/// A document that passed validation and is ready to be committed.
struct Staged {
    id: DocId,
    stored: Value,
    tokens: Vec<String>,
}

#[derive(Debug)]
pub struct Index {
    options: IndexOptions,
    trie: Trie,
    documents: HashMap<DocId, StoredDocument>,
    list: Vec<ListEntry>,
    next_seq: u64,
}

impl Index {
    pub fn new(options: IndexOptions, source: Source) -> Result<Self> {
        options.validate()?;
        let mut index = Self {
            options,
            trie: Trie::new(),
            documents: HashMap::new(),
            list: Vec::new(),
            next_seq: 0,
        };
        match source {
            Source::Empty => {}
            Source::Documents(docs) => index.add_all(docs)?,
            Source::Snapshot(snapshot) => index.deserialize(snapshot)?,
        }
        Ok(index)
    }

    pub fn options(&self) -> &IndexOptions { &self.options }

    fn extract_id(&self, doc: &Value) -> Result<DocId> {
        (self.options.id_function)(doc)
            .ok_or_else(|| Error::InvalidDocument("no usable id could be derived from the document".into()))
    }

    fn stage(&self, doc: &Value) -> Result<Staged> {
        let id = self.extract_id(doc)?;
        let stored = strip_exclusions(doc, &self.options.exclusions);
        let mut tokens = Vec::new();
        for value in indexable_values(doc, self.options.fields.as_deref()) {
            if let Some(text) = field_text(value) {
                tokens.extend(
                    self.options
                        .tokenizer
                        .tokenize(&text)
                        .into_iter()
                        .map(|t| self.options.fold_case(t)),
                );
            }
        }
        Ok(Staged { id, stored, tokens })
    }

    fn commit(&mut self, staged: Staged) {
        let Staged { id, stored, tokens } = staged;
        let seq = self.next_seq;
        self.next_seq += 1;

        let sorter = &self.options.sorter;
        let entry = ListEntry { id: id.clone(), result: SearchResult { document: stored.clone(), score: 1 } };
        ordered_insert(&mut self.list, entry, |a, b| sorter.compare(&a.result, &b.result));

        for token in &tokens {
            trace!(doc_id = %id, token = %token, "add token");
            self.trie.add_token(token, &id);
        }
        debug!(doc_id = %id, tokens = tokens.len(), "indexed document");
        self.documents.insert(id, StoredDocument { seq, document: stored });
    }

    /// Adds a document, or every document of an array. All documents are
    /// validated before any of them is indexed, so a failure leaves the index
    /// untouched.
    pub fn add(&mut self, doc: &Value) -> Result<()> {
        match doc {
            Value::Array(docs) => self.add_all(docs.iter().cloned()),
            single => {
                let staged = self.stage(single)?;
                self.commit(staged);
                Ok(())
            }
        }
    }

    pub fn add_all<I>(&mut self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let staged = docs
            .into_iter()
            .map(|doc| self.stage(&doc))
            .collect::<Result<Vec<_>>>()?;
        for s in staged {
            self.commit(s);
        }
        Ok(())
    }

    /// Removes the document with the same id as `doc`. Unknown documents are
    /// ignored.
    pub fn remove(&mut self, doc: &Value) -> Result<()> {
        let id = self.extract_id(doc)?;
        self.remove_by_id(&id);
        Ok(())
    }

    /// Returns whether a stored document was removed.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let nodes = self.trie.remove_document(id);
        if let Some(pos) = self.list.iter().position(|e| e.id == id) {
            self.list.remove(pos);
        }
        let removed = self.documents.remove(id).is_some();
        debug!(doc_id = %id, nodes, removed, "removed document");
        removed
    }

    /// Removes and re-adds `doc`. The new version is validated first, so a
    /// failure keeps the old one in place. Not atomic for concurrent readers
    /// outside a [`SharedIndex`](crate::SharedIndex).
    pub fn reindex(&mut self, doc: &Value) -> Result<()> {
        let staged = self.stage(doc)?;
        self.remove_by_id(&staged.id);
        self.commit(staged);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.list.clear();
        self.trie.clear();
        self.next_seq = 0;
        debug!("cleared index");
    }

    /// Documents ranked by how many distinct query tokens hit them, truncated
    /// to the configured limit. Ties keep insertion order.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let mut scores: HashMap<&str, u32> = HashMap::new();
        for token in self.options.search_tokenizer.tokenize(query) {
            let token = self.options.fold_case(token);
            if !seen.insert(token.clone()) {
                continue;
            }
            if let Some(ids) = self.trie.search_token(&token) {
                for id in ids {
                    *scores.entry(id.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut hits: Vec<(u64, SearchResult)> = scores
            .into_iter()
            .filter_map(|(id, score)| {
                self.documents
                    .get(id)
                    .map(|stored| (stored.seq, SearchResult { document: stored.document.clone(), score }))
            })
            .collect();
        let sorter = &self.options.sorter;
        hits.sort_by(|(seq_a, a), (seq_b, b)| sorter.compare(a, b).then(seq_a.cmp(seq_b)));
        hits.truncate(self.options.limit);
        debug!(query, hits = hits.len(), "search");
        hits.into_iter().map(|(_, result)| result).collect()
    }

    pub fn document_count(&self) -> usize { self.list.len() }

    /// Every stored document with a constant score of 1, in sorter order.
    pub fn document_list(&self) -> impl Iterator<Item = &SearchResult> + '_ {
        self.list.iter().map(|e| &e.result)
    }

    pub fn document(&self, id: &str) -> Option<&Value> { self.documents.get(id).map(|s| &s.document) }

    pub fn node_count(&self) -> usize { self.trie.node_count() }

    pub fn serialize(&self) -> SerializedIndex {
        SerializedIndex {
            list: self.list.iter().map(|e| e.result.document.clone()).collect(),
            root: self.trie.to_graph(),
        }
    }

    /// Replaces the whole index with `snapshot`. Ids are recomputed from the
    /// stored documents; if any of them has no usable id nothing changes.
    pub fn deserialize(&mut self, snapshot: SerializedIndex) -> Result<()> {
        let SerializedIndex { list, root } = snapshot;
        let ids = list
            .iter()
            .map(|doc| self.extract_id(doc))
            .collect::<Result<Vec<_>>>()?;

        self.documents.clear();
        self.list.clear();
        for (seq, (id, document)) in ids.into_iter().zip(list).enumerate() {
            let seq = seq as u64;
            self.documents.insert(id.clone(), StoredDocument { seq, document: document.clone() });
            self.list.push(ListEntry { id, result: SearchResult { document, score: 1 } });
        }
        self.next_seq = self.list.len() as u64;
        self.trie = Trie::from_graph(root);
        debug!(documents = self.list.len(), nodes = self.trie.node_count(), "loaded snapshot");
        Ok(())
    }
}
