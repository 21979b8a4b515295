//! In-memory reverse text index backed by a character trie.
//!
//! Documents are JSON objects. Selected fields (or every field except `id`) are
//! tokenized and each token is threaded through the trie one character per
//! level; every node on the path records the ids of the documents that passed
//! through it. A query is tokenized the same way and each token walks the trie,
//! so a token matches every indexed token it is a prefix of. Documents are
//! ranked by the number of distinct query tokens that hit them.
//!
//! ```
//! use serde_json::json;
//! use trie_index::{Index, IndexOptions, Source};
//!
//! let docs = vec![
//!     json!({"id": "1", "title": "the quick brown fox"}),
//!     json!({"id": "2", "title": "jumps over the lazy dog"}),
//! ];
//! let index = Index::new(IndexOptions::default(), Source::Documents(docs)).unwrap();
//! let hits = index.search("laz");
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].document["id"], "2");
//! ```

pub mod document;
pub mod error;
pub mod index;
pub mod options;
pub mod persist;
pub mod shared;
pub mod sort;
pub mod tokenizer;
pub mod trie;

pub use document::{default_id_function, DocId, IdFunction};
pub use error::{Error, Result};
pub use index::{Index, SearchResult, Source};
pub use options::{IndexOptions, IndexSettings};
pub use persist::{NodeGraph, SerializedIndex};
pub use shared::SharedIndex;
pub use sort::{ordered_insert, ByScoreSorter, Sorter};
pub use tokenizer::{
    PhraseTokenizer, StemmingTokenizer, Tokenizer, TokenizerKind, TrimTokenizer,
    WhitespaceReplacingTokenizer, WhitespaceTokenizer,
};
