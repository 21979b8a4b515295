use crate::document::{default_id_function, DocId, IdFunction};
use crate::error::{Error, Result};
use crate::sort::{ByScoreSorter, Sorter};
use crate::tokenizer::{Tokenizer, TokenizerKind, WhitespaceReplacingTokenizer, WhitespaceTokenizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_LIMIT: usize = 10;

/// How an [`Index`](crate::Index) tokenizes, ranks and stores documents.
#[derive(Clone)]
pub struct IndexOptions {
    /// Fields to index. `None` indexes every field except `id`.
    pub fields: Option<Vec<String>>,
    /// Fields dropped from the stored copy of each document.
    pub exclusions: Vec<String>,
    pub limit: usize,
    pub case_sensitive: bool,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub search_tokenizer: Arc<dyn Tokenizer>,
    pub sorter: Arc<dyn Sorter>,
    pub id_function: IdFunction,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            fields: None,
            exclusions: Vec::new(),
            limit: DEFAULT_LIMIT,
            case_sensitive: false,
            tokenizer: Arc::new(WhitespaceTokenizer),
            search_tokenizer: Arc::new(WhitespaceReplacingTokenizer),
            sorter: Arc::new(ByScoreSorter),
            id_function: Arc::new(default_id_function),
        }
    }
}

impl fmt::Debug for IndexOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexOptions")
            .field("fields", &self.fields)
            .field("exclusions", &self.exclusions)
            .field("limit", &self.limit)
            .field("case_sensitive", &self.case_sensitive)
            .finish_non_exhaustive()
    }
}

impl IndexOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }

    pub fn with_search_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.search_tokenizer = Arc::new(tokenizer);
        self
    }

    pub fn with_sorter(mut self, sorter: impl Sorter + 'static) -> Self {
        self.sorter = Arc::new(sorter);
        self
    }

    pub fn with_id_function<F>(mut self, id_function: F) -> Self
    where
        F: Fn(&Value) -> Option<DocId> + Send + Sync + 'static,
    {
        self.id_function = Arc::new(id_function);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::InvalidConfig("limit must be positive".into()));
        }
        Ok(())
    }

    /// Lowercases unless the index is case sensitive.
    pub(crate) fn fold_case(&self, token: String) -> String {
        if self.case_sensitive { token } else { token.to_lowercase() }
    }
}

/// The serializable subset of [`IndexOptions`], as read from a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexSettings {
    pub fields: Option<Vec<String>>,
    pub exclusions: Vec<String>,
    pub limit: usize,
    pub case_sensitive: bool,
    pub tokenizer: TokenizerKind,
    pub search_tokenizer: TokenizerKind,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            fields: None,
            exclusions: Vec::new(),
            limit: DEFAULT_LIMIT,
            case_sensitive: false,
            tokenizer: TokenizerKind::Whitespace,
            search_tokenizer: TokenizerKind::WhitespaceReplacing,
        }
    }
}

impl From<IndexSettings> for IndexOptions {
    fn from(settings: IndexSettings) -> Self {
        IndexOptions {
            fields: settings.fields,
            exclusions: settings.exclusions,
            limit: settings.limit,
            case_sensitive: settings.case_sensitive,
            tokenizer: settings.tokenizer.build(),
            search_tokenizer: settings.search_tokenizer.build(),
            ..IndexOptions::default()
        }
    }
}
