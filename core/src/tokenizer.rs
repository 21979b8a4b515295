use crate::document::field_text;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

// English analyzer tables for `StemmingTokenizer`, plus the word cleaner.
lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref LEADING_NON_WORD: Regex = Regex::new(r"^[^\w]*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn replace_whitespace(value: &str) -> String {
    value.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect()
}

/// Whitespace-separated words with leading punctuation stripped.
fn clean_words(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(char::is_whitespace)
        .map(|part| match LEADING_NON_WORD.find(part) {
            Some(m) => part[m.end()..].trim(),
            None => part.trim(),
        })
        .filter(|s| !s.is_empty())
}

/// Turns a string into the tokens that are threaded through the trie.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, value: &str) -> Vec<String>;

    /// Tokenizes a JSON field value. Falsy values yield no tokens; `null` is
    /// rejected.
    fn tokenize_value(&self, value: &Value) -> Result<Vec<String>> {
        if value.is_null() {
            return Err(Error::InvalidInput("cannot tokenize a null value".into()));
        }
        Ok(field_text(value).map(|text| self.tokenize(&text)).unwrap_or_default())
    }
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, value: &str) -> Vec<String> { self(value) }
}

/// The whole value with whitespace replaced by `_`, followed by each word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, value: &str) -> Vec<String> {
        let mut out = vec![replace_whitespace(value)];
        out.extend(clean_words(value).map(str::to_string));
        out
    }
}

/// A single token: the trimmed value with whitespace replaced by `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceReplacingTokenizer;

impl Tokenizer for WhitespaceReplacingTokenizer {
    fn tokenize(&self, value: &str) -> Vec<String> { vec![replace_whitespace(value.trim())] }
}

/// A single token: the trimmed value, inner whitespace kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimTokenizer;

impl Tokenizer for TrimTokenizer {
    fn tokenize(&self, value: &str) -> Vec<String> { vec![value.trim().to_string()] }
}

/// Each word, plus every phrase of up to `max_words` consecutive words.
///
/// "the quick brown fox" with the default window of 3 yields
/// `the`, `quick`, `the quick`, `brown`, `the quick brown`, `fox`,
/// `quick brown fox`, `brown fox`.
#[derive(Debug, Clone, Copy)]
pub struct PhraseTokenizer {
    max_words: usize,
}

impl PhraseTokenizer {
    pub fn new(max_words: usize) -> Self { Self { max_words: max_words.max(1) } }

    pub fn max_words(&self) -> usize { self.max_words }
}

impl Default for PhraseTokenizer {
    fn default() -> Self { Self::new(3) }
}

fn join_window(window: &VecDeque<&str>) -> String {
    window.iter().copied().collect::<Vec<_>>().join(" ")
}

impl Tokenizer for PhraseTokenizer {
    fn tokenize(&self, value: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::with_capacity(self.max_words);
        for word in clean_words(value) {
            out.push(word.to_string());
            if window.len() == self.max_words {
                window.pop_front();
            }
            window.push_back(word);
            if window.len() > 1 {
                out.push(join_window(&window));
            }
        }
        // tail phrases: drop the oldest word until a single word remains
        window.pop_front();
        while window.len() > 1 {
            out.push(join_window(&window));
            window.pop_front();
        }
        out
    }
}

/// NFKC-normalized, lowercased, stop-word filtered, stemmed words.
#[derive(Debug, Clone, Copy, Default)]
pub struct StemmingTokenizer;

impl Tokenizer for StemmingTokenizer {
    fn tokenize(&self, value: &str) -> Vec<String> {
        let normalized = value.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|token| !is_stopword(token))
            .map(|token| STEMMER.stem(token).to_string())
            .collect()
    }
}

/// Named built-in tokenizers, for settings files and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    Whitespace,
    WhitespaceReplacing,
    Phrase,
    Trim,
    Stemming,
}

impl TokenizerKind {
    pub fn build(self) -> Arc<dyn Tokenizer> {
        match self {
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
            TokenizerKind::WhitespaceReplacing => Arc::new(WhitespaceReplacingTokenizer),
            TokenizerKind::Phrase => Arc::new(PhraseTokenizer::default()),
            TokenizerKind::Trim => Arc::new(TrimTokenizer),
            TokenizerKind::Stemming => Arc::new(StemmingTokenizer),
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "whitespace" => Ok(TokenizerKind::Whitespace),
            "whitespace_replacing" => Ok(TokenizerKind::WhitespaceReplacing),
            "phrase" => Ok(TokenizerKind::Phrase),
            "trim" => Ok(TokenizerKind::Trim),
            "stemming" => Ok(TokenizerKind::Stemming),
            other => Err(Error::InvalidConfig(format!("unknown tokenizer '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn whitespace_tokenizer_keeps_compound_and_words() {
        let t = WhitespaceTokenizer.tokenize("the quick, (brown) fox");
        assert_eq!(t, strings(&["the_quick,_(brown)_fox", "the", "quick,", "brown)", "fox"]));
    }

    #[test]
    fn whitespace_tokenizer_single_word() {
        assert_eq!(WhitespaceTokenizer.tokenize("A2"), strings(&["A2", "A2"]));
    }

    #[test]
    fn replacing_tokenizer_trims_first() {
        assert_eq!(WhitespaceReplacingTokenizer.tokenize("  new york "), strings(&["new_york"]));
    }

    #[test]
    fn phrase_tokenizer_windows() {
        let t = PhraseTokenizer::default().tokenize("the quick brown fox");
        assert_eq!(
            t,
            strings(&[
                "the",
                "quick",
                "the quick",
                "brown",
                "the quick brown",
                "fox",
                "quick brown fox",
                "brown fox",
            ])
        );
        assert!(!t.contains(&"the quick brown fox".to_string()));
    }

    #[test]
    fn phrase_tokenizer_short_input() {
        assert_eq!(PhraseTokenizer::default().tokenize("solo"), strings(&["solo"]));
        assert_eq!(PhraseTokenizer::new(1).tokenize("a b"), strings(&["a", "b"]));
    }

    #[test]
    fn stemming_tokenizer_normalizes_and_stems() {
        let words = StemmingTokenizer.tokenize("Running Runners RUN! The café's menu.");
        assert!(words.contains(&"run".to_string()));
        assert!(!words.contains(&"the".to_string()));
    }

    #[test]
    fn tokenize_value_rejects_null() {
        assert!(matches!(WhitespaceTokenizer.tokenize_value(&Value::Null), Err(Error::InvalidInput(_))));
        assert_eq!(TrimTokenizer.tokenize_value(&json!(7)).unwrap(), strings(&["7"]));
        assert!(TrimTokenizer.tokenize_value(&json!("")).unwrap().is_empty());
    }

    #[test]
    fn closures_are_tokenizers() {
        let upper = |s: &str| vec![s.to_uppercase()];
        assert_eq!(upper.tokenize("abc"), strings(&["ABC"]));
    }

    #[test]
    fn kind_parses() {
        assert_eq!("phrase".parse::<TokenizerKind>().unwrap(), TokenizerKind::Phrase);
        assert!("nope".parse::<TokenizerKind>().is_err());
    }
}
