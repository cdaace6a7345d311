//! Maps model features back to human-readable supporting sentences.

use crate::models::{Document, SupportSentence};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

/// Split text into trimmed, non-empty sentences.
///
/// A sentence ends after `.`, `!` or `?` followed by whitespace, or at a
/// blank line.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let next = chars.peek().copied();

        let terminal = matches!(c, '.' | '!' | '?') && next.map_or(true, char::is_whitespace);
        let paragraph = c == '\n' && next == Some('\n');

        if terminal || paragraph {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Bounded least-recently-used map from doc id to its sentences.
#[derive(Debug)]
struct SentenceCache {
    capacity: usize,
    entries: HashMap<String, Vec<String>>,
    order: VecDeque<String>,
}

impl SentenceCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(position) {
                self.order.push_back(k);
            }
        }
    }

    fn get(&mut self, key: &str) -> Option<Vec<String>> {
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            self.touch(key);
        }
        hit
    }

    fn insert(&mut self, key: String, sentences: Vec<String>) {
        if self.entries.insert(key.clone(), sentences).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Finds sentences that mention a model's top features.
#[derive(Debug)]
pub struct ExplanationEngine {
    cache: Mutex<SentenceCache>,
}

impl Default for ExplanationEngine {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ExplanationEngine {
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: Mutex::new(SentenceCache::new(cache_size)),
        }
    }

    /// Sentences of a document, computed once and cached by doc id.
    pub fn sentences_for_document(&self, doc_id: &str, text: &str) -> Vec<String> {
        if let Some(sentences) = self.cache.lock().get(doc_id) {
            return sentences;
        }
        let sentences = split_sentences(text);
        self.cache
            .lock()
            .insert(doc_id.to_string(), sentences.clone());
        sentences
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.lock().len()
    }

    /// The first `limit` sentences containing any of the feature terms,
    /// scanning documents and sentences in order. Matching is a
    /// case-insensitive substring test; each sentence is reported once.
    pub fn collect_supporting_sentences<'a, I>(
        &self,
        documents: I,
        feature_terms: &[String],
        limit: usize,
    ) -> Vec<SupportSentence>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let terms: Vec<String> = feature_terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for doc in documents {
            for sentence in self.sentences_for_document(&doc.doc_id, &doc.raw_text) {
                let key = (doc.doc_id.clone(), sentence.clone());
                if seen.contains(&key) {
                    continue;
                }
                let lowered = sentence.to_lowercase();
                if terms.iter().any(|term| lowered.contains(term.as_str())) {
                    seen.insert(key);
                    hits.push(SupportSentence {
                        doc_id: doc.doc_id.clone(),
                        doc_type: doc.doc_type,
                        text: sentence,
                    });
                    if hits.len() >= limit {
                        return hits;
                    }
                }
            }
        }
        hits
    }
}
