//! Narrow language-capability interface over the generator.
//!
//! The memory manager and consistency checker never see raw prompts:
//! they consume this trait, so the core logic is unit-testable with
//! deterministic stubs instead of a real model.

use tracing::debug;

use crate::generator::{GenerationError, GenerationRequest, Generator};

/// The three LLM judgments the core delegates.
pub trait LanguageOps {
    /// Whether two statements contradict each other.
    fn judge(&self, a: &str, b: &str) -> Result<bool, GenerationError>;

    /// One-to-two sentence digest of a statement.
    fn summarize(&self, text: &str) -> Result<String, GenerationError>;

    /// Up to a handful of key topics across a statement history.
    fn extract_topics(&self, texts: &[String]) -> Result<Vec<String>, GenerationError>;
}

/// `LanguageOps` backed by any [`Generator`].
///
/// Owns the Korean prompt templates and the response parsing. The
/// contradiction judgment looks for the token "YES" case-insensitively;
/// anything else — including 아니오 or an empty reply — is read as "no
/// contradiction".
pub struct GeneratorOps<G: Generator> {
    generator: G,
    judge_max_tokens: u32,
    summary_max_tokens: u32,
    topics_max_tokens: u32,
}

impl<G: Generator> GeneratorOps<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            judge_max_tokens: 16,
            summary_max_tokens: 120,
            topics_max_tokens: 60,
        }
    }
}

impl<G: Generator> LanguageOps for GeneratorOps<G> {
    fn judge(&self, a: &str, b: &str) -> Result<bool, GenerationError> {
        let prompt = format!(
            "다음 두 발언이 서로 모순됩니까? YES 또는 NO로만 답하세요.\n\n\
             발언 1: {}\n\n발언 2: {}\n\n답변:",
            a, b
        );
        let response = self
            .generator
            .generate(&GenerationRequest::new(&prompt, self.judge_max_tokens))?;
        debug!(response = %response.trim(), "contradiction judgment");
        Ok(response.to_uppercase().contains("YES"))
    }

    fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        let prompt = format!(
            "다음 발언의 핵심 주장을 한두 문장으로 요약하세요.\n\n발언: {}\n\n요약:",
            text
        );
        let response = self
            .generator
            .generate(&GenerationRequest::new(&prompt, self.summary_max_tokens))?;
        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::failed("empty summary"));
        }
        Ok(trimmed.to_string())
    }

    fn extract_topics(&self, texts: &[String]) -> Result<Vec<String>, GenerationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let listed = texts
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "다음 발언들을 관통하는 핵심 주제를 최대 3개, 쉼표로 구분해 짧은 \
             명사구로만 나열하세요.\n\n{}\n\n핵심 주제:",
            listed
        );
        let response = self
            .generator
            .generate(&GenerationRequest::new(&prompt, self.topics_max_tokens))?;
        Ok(parse_topic_list(&response))
    }
}

/// Parse a comma/newline-separated topic list, stripping list markers.
fn parse_topic_list(response: &str) -> Vec<String> {
    let mut topics = Vec::new();
    for piece in response.split(|c| c == ',' || c == '\n' || c == '·') {
        let topic = piece
            .trim()
            .trim_start_matches(|c: char| {
                c.is_ascii_digit() || c == '-' || c == '.' || c == ')' || c == ' '
            })
            .trim();
        if !topic.is_empty() && !topics.contains(&topic.to_string()) {
            topics.push(topic.to_string());
        }
    }
    topics
}

/// Character-safe truncation (statements are Korean; byte slicing would
/// split a code point).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Deterministic `LanguageOps` stub for tests.
pub struct MockOps {
    contradictory: bool,
    topics: Vec<String>,
    should_fail: bool,
}

impl MockOps {
    /// Never sees a contradiction, extracts no topics.
    pub fn new() -> Self {
        Self {
            contradictory: false,
            topics: Vec::new(),
            should_fail: false,
        }
    }

    /// Judge every pair as contradictory.
    pub fn contradictory() -> Self {
        Self {
            contradictory: true,
            topics: Vec::new(),
            should_fail: false,
        }
    }

    /// Fixed topic list for memory-compaction tests.
    pub fn with_topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contradictory: false,
            topics: topics.into_iter().map(Into::into).collect(),
            should_fail: false,
        }
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self {
            contradictory: false,
            topics: Vec::new(),
            should_fail: true,
        }
    }
}

impl Default for MockOps {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageOps for MockOps {
    fn judge(&self, _a: &str, _b: &str) -> Result<bool, GenerationError> {
        if self.should_fail {
            return Err(GenerationError::failed("simulated judge failure"));
        }
        Ok(self.contradictory)
    }

    fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        if self.should_fail {
            return Err(GenerationError::failed("simulated summary failure"));
        }
        Ok(format!("요약: {}", truncate_chars(text, 40)))
    }

    fn extract_topics(&self, _texts: &[String]) -> Result<Vec<String>, GenerationError> {
        if self.should_fail {
            return Err(GenerationError::failed("simulated topic failure"));
        }
        Ok(self.topics.clone())
    }
}
