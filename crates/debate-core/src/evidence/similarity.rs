//! Character n-gram similarity for short Korean evidence snippets.
//!
//! Token overlap under-detects paraphrase in morphologically rich text;
//! character n-grams (length 3–5) are robust to particle and ending
//! variation, so that is the representation used for both intra-ledger
//! dedup and cross-stance conflict detection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Caller-side decision thresholds over cosine similarity.
///
/// `merge` decides that two keys within the same stance+category are the
/// same evidence; `conflict` decides that a candidate matches evidence
/// already used by the opposing stance. Both comparisons are inclusive
/// (≥) and independently tunable; both sit below exact match because
/// paraphrase is the dominant duplication mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    pub merge: f64,
    pub conflict: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            merge: 0.80,
            conflict: 0.78,
        }
    }
}

/// Cosine similarity over character n-gram frequency vectors.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityIndex {
    min_ngram: usize,
    max_ngram: usize,
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self {
            min_ngram: 3,
            max_ngram: 5,
        }
    }
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Similarity in [0, 1]. Equal strings score 1.0; inputs too short
    /// to produce any n-gram fall back to exact equality.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let pa = self.profile(a);
        let pb = self.profile(b);
        if pa.is_empty() || pb.is_empty() {
            return 0.0;
        }
        cosine(&pa, &pb)
    }

    /// Best match for `candidate` over a corpus of keys.
    ///
    /// An empty corpus is "no match", not an error. A single-item corpus
    /// always returns that item regardless of score — callers apply their
    /// threshold before trusting the match.
    pub fn most_similar<'a, I>(&self, candidate: &str, corpus: I) -> Option<(String, f64)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(String, f64)> = None;
        for key in corpus {
            let score = self.similarity(candidate, key);
            match &best {
                Some((_, s)) if *s >= score => {}
                _ => best = Some((key.to_string(), score)),
            }
        }
        best
    }

    fn profile(&self, text: &str) -> HashMap<String, f64> {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let mut counts: HashMap<String, f64> = HashMap::new();
        for n in self.min_ngram..=self.max_ngram {
            if chars.len() < n {
                break;
            }
            for window in chars.windows(n) {
                *counts.entry(window.iter().collect()).or_insert(0.0) += 1.0;
            }
        }
        counts
    }
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, va)| b.get(k).map(|vb| va * vb))
        .sum();
    if dot == 0.0 {
        return 0.0;
    }
    let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        let index = SimilarityIndex::new();
        assert_eq!(index.similarity("최저임금 인상", "최저임금 인상"), 1.0);
    }

    #[test]
    fn test_disjoint_strings() {
        let index = SimilarityIndex::new();
        let score = index.similarity("국가부채 비율", "청년 일자리");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_paraphrase_scores_high() {
        let index = SimilarityIndex::new();
        let a = "gdp 대비 국가부채 비율 50%";
        let b = "gdp 대비 국가부채가 50%";
        let score = index.similarity(a, b);
        assert!(score > 0.6, "paraphrase score too low: {}", score);
    }

    #[test]
    fn test_unrelated_scores_low() {
        let index = SimilarityIndex::new();
        let score = index.similarity("최저임금 1만원 인상", "독일 노동시장 개혁 사례");
        assert!(score < 0.3, "unrelated score too high: {}", score);
    }

    #[test]
    fn test_short_input_falls_back_to_equality() {
        let index = SimilarityIndex::new();
        assert_eq!(index.similarity("ab", "ab"), 1.0);
        assert_eq!(index.similarity("ab", "cd"), 0.0);
        assert_eq!(index.similarity("", ""), 1.0);
        assert_eq!(index.similarity("", "국가부채"), 0.0);
    }

    #[test]
    fn test_most_similar_empty_corpus() {
        let index = SimilarityIndex::new();
        assert!(index.most_similar("국가부채", std::iter::empty()).is_none());
    }

    #[test]
    fn test_most_similar_single_item_always_returned() {
        let index = SimilarityIndex::new();
        let (key, score) = index
            .most_similar("국가부채 50%", ["청년 일자리 감소"].into_iter())
            .unwrap();
        assert_eq!(key, "청년 일자리 감소");
        assert!(score < 0.3); // caller applies the threshold
    }

    #[test]
    fn test_most_similar_picks_best() {
        let index = SimilarityIndex::new();
        let corpus = ["국가부채 비율 50%", "고용률 61%", "독일 사례"];
        let (key, score) = index
            .most_similar("gdp 대비 국가부채 50%", corpus.into_iter())
            .unwrap();
        assert_eq!(key, "국가부채 비율 50%");
        assert!(score > 0.4);
    }

    #[test]
    fn test_similarity_symmetric() {
        let index = SimilarityIndex::new();
        let a = "최저임금 인상이 고용에 미치는 영향";
        let b = "고용에 대한 최저임금 인상 영향";
        let d = (index.similarity(a, b) - index.similarity(b, a)).abs();
        assert!(d < 1e-12);
    }

    #[test]
    fn test_default_thresholds() {
        let t = SimilarityThresholds::default();
        assert_eq!(t.merge, 0.80);
        assert_eq!(t.conflict, 0.78);
        assert!(t.conflict < t.merge);
    }
}
