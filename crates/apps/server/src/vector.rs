//! Document index behind `/api/vector/search` and the RAG route.
//!
//! There is no embedding store; the index holds whatever documents it was
//! built with and ranks them by shared query terms. The server starts with
//! an empty index, so searches return no results.

use std::collections::HashSet;

use serde::Serialize;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const RAG_CONTEXT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPayload {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub payload: DocumentPayload,
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    documents: Vec<(String, String)>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push((id.into(), content.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents sharing at least one term with `query`, best first.
    /// `score` is the fraction of query terms present.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let terms = terms(query);
        if terms.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter_map(|(id, content)| {
                let doc = terms_of(content);
                let shared = terms.iter().filter(|t| doc.contains(*t)).count();
                (shared > 0).then(|| SearchHit {
                    id: id.clone(),
                    score: shared as f64 / terms.len() as f64,
                    payload: DocumentPayload {
                        content: content.clone(),
                    },
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }
}

fn terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

fn terms_of(text: &str) -> HashSet<String> {
    terms(text).into_iter().collect()
}

/// Prompt for a RAG answer: retrieved passages, then the question.
pub fn rag_prompt(query: &str, hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|h| h.payload.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Context:\n{context}\n\nQuestion: {query}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::{rag_prompt, VectorIndex};

    fn index() -> VectorIndex {
        VectorIndex::empty()
            .with_document("cod", "Atlantic cod spawn on Georges Bank in late winter.")
            .with_document("whale", "North Atlantic right whales calve off Georgia.")
            .with_document("tuna", "Bluefin tuna cross the Atlantic to spawn.")
    }

    #[test]
    fn empty_index_finds_nothing() {
        assert!(VectorIndex::empty().search("right whale", 5).is_empty());
    }

    #[test]
    fn ranks_by_shared_terms() {
        let hits = index().search("Where do cod spawn?", 5);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["cod", "tuna"]);
        assert!(hits[0].score > hits[1].score);

        assert_eq!(index().search("Atlantic", 2).len(), 2);
        assert!(index().search("a b", 5).is_empty());
    }

    #[test]
    fn prompt_lists_context_before_question() {
        let hits = index().search("right whales", 1);
        let prompt = rag_prompt("Where do right whales calve?", &hits);
        assert_eq!(
            prompt,
            "Context:\nNorth Atlantic right whales calve off Georgia.\n\nQuestion: Where do right whales calve?\n\nAnswer:"
        );
    }
}
