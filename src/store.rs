//! In-memory document registry.
//!
//! Holds the documents of the latest ingestion run. The server wraps it in
//! a lock; the store itself is plain data.

use crate::models::{DocType, Document};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire store with a new set of documents.
    pub fn replace_all(&mut self, documents: Vec<Document>) {
        self.documents.clear();
        self.index.clear();
        for document in documents {
            self.add(document);
        }
    }

    /// Insert a document, replacing any previous one with the same id.
    pub fn add(&mut self, document: Document) {
        match self.index.get(&document.doc_id) {
            Some(&position) => self.documents[position] = document,
            None => {
                self.index
                    .insert(document.doc_id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }

    /// All documents, in ingestion order.
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, doc_id: &str) -> Option<&Document> {
        self.index.get(doc_id).map(|&position| &self.documents[position])
    }

    /// Documents of the given types, in ingestion order.
    pub fn filter_by_types(&self, doc_types: &[DocType]) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|doc| doc_types.contains(&doc.doc_type))
            .collect()
    }

    /// Document counts keyed by wire doc type; absent types are omitted.
    pub fn counts_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for doc in &self.documents {
            *counts.entry(doc.doc_type.to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
