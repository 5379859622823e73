//! TF-IDF vectorization of article summaries.
//!
//! Summaries are stripped of markup, lowercased and split into tokens of two or more
//! word characters. English stop words are dropped, and each remaining term is weighted
//! by its raw count times a smoothed inverse document frequency. Rows are L2-normalised.

use common::Article;
use ndarray::Array2;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// NLTK English stop-word list.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn",
    "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn",
    "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").unwrap());

/// The shared English stop-word set. Built on first use and never modified.
pub fn stop_words() -> &'static HashSet<&'static str> {
    &STOP_WORDS
}

/// Text content of a summary with any HTML markup removed.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<Vec<_>>().join(" ")
}

/// Document-term matrix: one row per article, one column per vocabulary term.
#[derive(Debug, Clone)]
pub struct TermMatrix {
    vocabulary: Vec<String>,
    weights: Array2<f64>,
}

impl TermMatrix {
    /// Vocabulary terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn n_documents(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.weights.ncols()
    }

    /// Weight of `term` in document `row`, if the term is in the vocabulary.
    pub fn weight(&self, row: usize, term: &str) -> Option<f64> {
        let col = self.vocabulary.binary_search_by(|t| t.as_str().cmp(term)).ok()?;
        self.weights.get((row, col)).copied()
    }
}

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    extra_stop_words: HashSet<String>,
    min_df: usize,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        Self {
            extra_stop_words: HashSet::new(),
            min_df: 1,
        }
    }

    pub fn from_config(config: &common::VectorizerConfig) -> Self {
        Self::new()
            .with_min_df(config.min_df())
            .with_extra_stop_words(config.extra_stop_words.iter().map(String::as_str))
    }

    /// Terms must occur in at least this many documents to be kept.
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    pub fn with_extra_stop_words<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.extra_stop_words
            .extend(words.into_iter().map(|w| w.to_lowercase()));
        self
    }

    fn is_stop_word(&self, token: &str) -> bool {
        stop_words().contains(token) || self.extra_stop_words.contains(token)
    }

    /// Lowercased, markup-free tokens of `text` with stop words removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let plain = strip_markup(text).to_lowercase();
        TOKEN_PATTERN
            .find_iter(&plain)
            .map(|m| m.as_str())
            .filter(|t| !self.is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    /// One row per article, built from the article summaries.
    pub fn vectorize(&self, articles: &[Article]) -> Result<TermMatrix> {
        let summaries: Vec<&str> = articles.iter().map(|a| a.summary.as_str()).collect();
        self.fit_transform(&summaries)
    }

    /// Build the vocabulary from `documents` and weight every document against it.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<TermMatrix> {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| self.tokenize(d.as_ref()))
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration keeps the vocabulary sorted
        let kept: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df)
            .collect();

        if kept.is_empty() {
            return Err(PipelineError::EmptyVocabulary);
        }

        let n_docs = documents.len() as f64;
        let vocabulary: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
        let index: HashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(col, (t, _))| (*t, col))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let mut weights = Array2::<f64>::zeros((documents.len(), vocabulary.len()));
        for (row, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = index.get(token.as_str()) {
                    weights[[row, col]] += 1.0;
                }
            }
            let mut row_view = weights.row_mut(row);
            for (col, w) in row_view.iter_mut().enumerate() {
                *w *= idf[col];
            }
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 0.0 {
                row_view /= norm;
            }
        }

        debug!(
            "vectorize: {} documents, {} terms",
            weights.nrows(),
            weights.ncols()
        );

        Ok(TermMatrix { vocabulary, weights })
    }
}

/// Vectorize article summaries with the default settings.
pub fn vectorize(articles: &[Article]) -> Result<TermMatrix> {
    TfIdfVectorizer::new().vectorize(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(summary: &str) -> Article {
        Article {
            title: "t".into(),
            link: "#".into(),
            summary: summary.into(),
        }
    }

    #[test]
    fn stop_words_are_removed() {
        let tokens = TfIdfVectorizer::new().tokenize("The markets and the Economy are RISING");
        assert_eq!(tokens, vec!["markets", "economy", "rising"]);
    }

    #[test]
    fn single_character_tokens_are_dropped() {
        let tokens = TfIdfVectorizer::new().tokenize("a b c rust x");
        assert_eq!(tokens, vec!["rust"]);
    }

    #[test]
    fn markup_is_stripped() {
        let tokens = TfIdfVectorizer::new()
            .tokenize("<p>Rocket <b>launch</b> delayed</p><a href=\"https://x.test\">link</a>");
        assert_eq!(tokens, vec!["rocket", "launch", "delayed", "link"]);
    }

    #[test]
    fn stop_word_set_is_shared() {
        assert!(std::ptr::eq(stop_words(), stop_words()));
        assert!(stop_words().contains("the"));
        assert!(!stop_words().contains("rust"));
    }

    #[test]
    fn rows_follow_article_order() {
        let articles = vec![
            article("rust compiler release"),
            article("football match tonight"),
            article("rust borrow checker"),
        ];
        let matrix = vectorize(&articles).expect("vectorize");

        assert_eq!(matrix.n_documents(), 3);
        assert!(matrix.weight(0, "compiler").unwrap() > 0.0);
        assert_eq!(matrix.weight(1, "compiler"), Some(0.0));
        assert!(matrix.weight(1, "football").unwrap() > 0.0);
        assert!(matrix.weight(2, "borrow").unwrap() > 0.0);
        assert_eq!(matrix.weight(2, "football"), Some(0.0));
    }

    #[test]
    fn vocabulary_is_sorted_and_rows_normalised() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&["zebra apple mango", "apple banana"])
            .expect("vectorize");

        assert_eq!(matrix.vocabulary(), ["apple", "banana", "mango", "zebra"]);
        for row in matrix.weights().rows() {
            let norm = row.dot(&row).sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn shared_terms_weigh_less() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&["apple mango", "apple banana"])
            .expect("vectorize");

        let apple = matrix.weight(0, "apple").unwrap();
        let mango = matrix.weight(0, "mango").unwrap();
        assert!(apple < mango);
    }

    #[test]
    fn idf_matches_smoothed_formula() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&["apple mango", "apple"])
            .expect("vectorize");

        // row 1 has only "apple" so it normalises to 1
        assert!((matrix.weight(1, "apple").unwrap() - 1.0).abs() < 1e-9);

        let idf_apple = (3.0f64 / 3.0).ln() + 1.0;
        let idf_mango = (3.0f64 / 2.0).ln() + 1.0;
        let norm = (idf_apple * idf_apple + idf_mango * idf_mango).sqrt();
        assert!((matrix.weight(0, "mango").unwrap() - idf_mango / norm).abs() < 1e-9);
    }

    #[test]
    fn stop_word_only_summaries_have_no_vocabulary() {
        let articles = vec![article("the"), article("and"), article("")];
        assert!(matches!(
            vectorize(&articles),
            Err(PipelineError::EmptyVocabulary)
        ));
    }

    #[test]
    fn min_df_drops_rare_terms() {
        let matrix = TfIdfVectorizer::new()
            .with_min_df(2)
            .fit_transform(&["rust tokio", "rust serde", "tokio axum"])
            .expect("vectorize");
        assert_eq!(matrix.vocabulary(), ["rust", "tokio"]);
    }

    #[test]
    fn extra_stop_words_are_honoured() {
        let vectorizer = TfIdfVectorizer::new().with_extra_stop_words(["Said"]);
        assert_eq!(vectorizer.tokenize("minister said hello"), vec!["minister", "hello"]);
    }

    #[test]
    fn document_without_terms_is_a_zero_row() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&["rust", "the"])
            .expect("vectorize");
        assert_eq!(matrix.weight(1, "rust"), Some(0.0));
    }
}
