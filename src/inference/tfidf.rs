//! TF-IDF text vectorizer.
//!
//! Tokens are runs of two or more word characters, lowercased, with English
//! stop words removed before unigrams and bigrams are formed. Vectors are
//! raw counts scaled by smoothed idf and L2-normalized.

use super::stop_words::is_stop_word;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid regex"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    pub max_features: usize,
    pub max_ngram: usize,
    /// Term to column index; indices follow alphabetical term order.
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize, max_ngram: usize) -> Self {
        Self {
            max_features,
            max_ngram: max_ngram.max(1),
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Unigrams through `max_ngram`-grams of the filtered tokens.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = token_pattern()
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !is_stop_word(token))
            .collect();

        let mut terms = Vec::with_capacity(tokens.len() * self.max_ngram);
        for n in 1..=self.max_ngram {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    fn term_counts(&self, text: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for term in self.analyze(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }

    /// Learn the vocabulary and idf weights from a corpus.
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) {
        let n_docs = texts.len();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut total_frequency: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let counts = self.term_counts(text.as_ref());
            for (term, count) in counts {
                *total_frequency.entry(term.clone()).or_insert(0) += count;
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // Most frequent terms win; ties resolve alphabetically.
        let mut ranked: Vec<(&String, &usize)> = total_frequency.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let kept: HashSet<&String> = ranked
            .into_iter()
            .take(self.max_features)
            .map(|(term, _)| term)
            .collect();

        let mut terms: Vec<&String> = kept.into_iter().collect();
        terms.sort();

        self.vocabulary = terms
            .iter()
            .enumerate()
            .map(|(index, term)| ((*term).clone(), index))
            .collect();
        self.idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(*term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Feature names in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.vocabulary.len()];
        for (term, &index) in &self.vocabulary {
            names[index] = term.as_str();
        }
        names
    }

    /// Dense, L2-normalized tf-idf vector for one text.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.n_features()];
        for (term, count) in self.term_counts(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                vector[index] = count as f64 * self.idf[index];
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_drops_stop_words_before_bigrams() {
        let vectorizer = TfidfVectorizer::new(100, 2);
        let terms = vectorizer.analyze("I moved to the Boston area");
        assert_eq!(
            terms,
            vec!["moved", "boston", "area", "moved boston", "boston area"]
        );
    }

    #[test]
    fn test_analyze_skips_single_characters() {
        let vectorizer = TfidfVectorizer::new(100, 1);
        assert_eq!(vectorizer.analyze("x y zz"), vec!["zz"]);
    }

    #[test]
    fn test_fit_orders_vocabulary_alphabetically() {
        let mut vectorizer = TfidfVectorizer::new(100, 1);
        vectorizer.fit(&["zebra apple", "apple mango"]);

        assert_eq!(vectorizer.feature_names(), vec!["apple", "mango", "zebra"]);
        // apple appears in both documents, so it gets the lowest idf
        assert!(vectorizer.idf[0] < vectorizer.idf[1]);
        assert!((vectorizer.idf[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut vectorizer = TfidfVectorizer::new(2, 1);
        vectorizer.fit(&["alpha alpha beta", "alpha gamma gamma"]);
        assert_eq!(vectorizer.feature_names(), vec!["alpha", "gamma"]);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let mut vectorizer = TfidfVectorizer::new(100, 2);
        vectorizer.fit(&["student at university", "software engineer at startup"]);

        let vector = vectorizer.transform("university student");
        let norm: f64 = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);

        let empty = vectorizer.transform("completely unrelated words");
        assert!(empty.iter().all(|v| *v == 0.0));
    }
}
