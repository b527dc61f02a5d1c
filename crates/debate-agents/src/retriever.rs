//! Stance-partitioned evidence retrieval.
//!
//! Each side argues only from articles crawled for its own stance, so
//! retrieval filters by stance before ranking. The in-memory retriever
//! ranks with the same character n-gram cosine the core uses for
//! evidence matching — good enough for paraphrase-level recall over a
//! few hundred articles without an embedding model.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use debate_core::{SimilarityIndex, Stance};

/// One article in the evidence corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub title: String,
    pub source: String,
    pub stance: Stance,
    /// Evidence paragraphs merged into one text block.
    pub text: String,
}

/// One ranked retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub title: String,
    pub source: String,
    pub stance: Stance,
    pub score: f64,
}

/// Evidence lookup seam, mockable in tests.
pub trait Retriever {
    /// Top-`top_k` passages for `query`, restricted to `stance`.
    fn search(&self, query: &str, stance: Stance, top_k: usize) -> Vec<RetrievedPassage>;
}

/// N-gram-cosine retriever over an in-memory corpus.
pub struct InMemoryRetriever {
    documents: Vec<CorpusDocument>,
    similarity: SimilarityIndex,
}

impl InMemoryRetriever {
    pub fn new(documents: Vec<CorpusDocument>) -> Self {
        Self {
            documents,
            similarity: SimilarityIndex::new(),
        }
    }

    /// Load a corpus from a JSON array of documents.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading corpus file {}", path.display()))?;
        let documents: Vec<CorpusDocument> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing corpus file {}", path.display()))?;
        debug!(count = documents.len(), "corpus loaded");
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Retriever for InMemoryRetriever {
    fn search(&self, query: &str, stance: Stance, top_k: usize) -> Vec<RetrievedPassage> {
        let mut hits: Vec<RetrievedPassage> = self
            .documents
            .iter()
            .filter(|doc| doc.stance == stance)
            .map(|doc| RetrievedPassage {
                score: self.similarity.similarity(query, &doc.text),
                text: doc.text.clone(),
                title: doc.title.clone(),
                source: doc.source.clone(),
                stance: doc.stance,
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> Vec<CorpusDocument> {
        vec![
            CorpusDocument {
                title: "최저임금 인상과 소득 효과".to_string(),
                source: "한겨레".to_string(),
                stance: Stance::Progressive,
                text: "최저임금 인상이 저소득층 소득을 끌어올렸다는 분석".to_string(),
            },
            CorpusDocument {
                title: "최저임금 인상의 고용 충격".to_string(),
                source: "조선일보".to_string(),
                stance: Stance::Conservative,
                text: "최저임금 인상 이후 소상공인 고용이 감소했다는 조사".to_string(),
            },
            CorpusDocument {
                title: "부동산 시장 동향".to_string(),
                source: "연합뉴스".to_string(),
                stance: Stance::Progressive,
                text: "수도권 아파트 가격이 상승세를 이어갔다".to_string(),
            },
        ]
    }

    #[test]
    fn test_search_filters_by_stance() {
        let retriever = InMemoryRetriever::new(corpus());
        let hits = retriever.search("최저임금 인상", Stance::Progressive, 5);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.stance == Stance::Progressive));
    }

    #[test]
    fn test_search_ranks_by_relevance() {
        let retriever = InMemoryRetriever::new(corpus());
        let hits = retriever.search("최저임금 인상", Stance::Progressive, 5);
        // The minimum-wage article outranks the real-estate one.
        assert!(hits[0].title.contains("최저임금"));
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_search_respects_top_k() {
        let retriever = InMemoryRetriever::new(corpus());
        assert!(retriever.search("최저임금", Stance::Progressive, 1).len() <= 1);
    }

    #[test]
    fn test_unrelated_query_returns_nothing() {
        let retriever = InMemoryRetriever::new(corpus());
        let hits = retriever.search("xyz", Stance::Progressive, 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&corpus()).unwrap()).unwrap();
        let retriever = InMemoryRetriever::from_json_file(file.path()).unwrap();
        assert_eq!(retriever.len(), 3);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        assert!(InMemoryRetriever::from_json_file(bad.path()).is_err());
    }
}
