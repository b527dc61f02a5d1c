//! Generator capability — the single blocking external dependency.
//!
//! The core treats text generation as an injected, synchronous call that
//! may be slow and may fail. No cancellation: once issued, the caller
//! waits for completion or failure. A timeout surfaces as a failure with
//! `timed_out` set.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Parameters for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Optional stop sequences.
    pub stop: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: &str, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.to_string(),
            max_tokens,
            stop: Vec::new(),
        }
    }
}

/// Generation failure — empty output, backend error, or timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationError {
    /// What went wrong.
    pub reason: String,
    /// Whether the call was killed by a deadline.
    pub timed_out: bool,
}

impl GenerationError {
    pub fn failed(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
            timed_out: false,
        }
    }

    pub fn timed_out(after_secs: u64) -> Self {
        Self {
            reason: format!("no completion after {}s", after_secs),
            timed_out: true,
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.timed_out {
            write!(f, "generation timed out: {}", self.reason)
        } else {
            write!(f, "generation failed: {}", self.reason)
        }
    }
}

impl std::error::Error for GenerationError {}

/// Synchronous text generator.
pub trait Generator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Deterministic generator for tests and model-free dry runs.
///
/// Serves scripted responses first, then falls back to a fixed response
/// if one is configured.
pub struct MockGenerator {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    should_fail: bool,
}

impl MockGenerator {
    /// Always returns the same response.
    pub fn fixed(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
            should_fail: false,
        }
    }

    /// Returns the scripted responses in order, then fails.
    pub fn sequence<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fallback: None,
            should_fail: false,
        }
    }

    /// Returns the scripted responses in order, then the fallback.
    pub fn sequence_then<I, S>(responses: I, fallback: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fallback: Some(fallback.to_string()),
            should_fail: false,
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            should_fail: true,
        }
    }
}

impl Generator for MockGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        if self.should_fail {
            return Err(GenerationError::failed("simulated failure"));
        }
        let mut script = self
            .script
            .lock()
            .map_err(|_| GenerationError::failed("mock script poisoned"))?;
        if let Some(next) = script.pop_front() {
            return Ok(next);
        }
        match &self.fallback {
            Some(fallback) => Ok(fallback.clone()),
            None => Err(GenerationError::failed("mock script exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_mock() {
        let gen = MockGenerator::fixed("응답");
        let req = GenerationRequest::new("prompt", 64);
        assert_eq!(gen.generate(&req).unwrap(), "응답");
        assert_eq!(gen.generate(&req).unwrap(), "응답");
    }

    #[test]
    fn test_sequence_mock_exhausts() {
        let gen = MockGenerator::sequence(["하나", "둘"]);
        let req = GenerationRequest::new("prompt", 64);
        assert_eq!(gen.generate(&req).unwrap(), "하나");
        assert_eq!(gen.generate(&req).unwrap(), "둘");
        assert!(gen.generate(&req).is_err());
    }

    #[test]
    fn test_sequence_then_fallback() {
        let gen = MockGenerator::sequence_then(["하나"], "기본");
        let req = GenerationRequest::new("prompt", 64);
        assert_eq!(gen.generate(&req).unwrap(), "하나");
        assert_eq!(gen.generate(&req).unwrap(), "기본");
    }

    #[test]
    fn test_failing_mock() {
        let gen = MockGenerator::failing();
        let err = gen.generate(&GenerationRequest::new("p", 8)).unwrap_err();
        assert!(!err.timed_out);
        assert!(err.to_string().contains("generation failed"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = GenerationError::timed_out(600);
        assert!(err.timed_out);
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("600s"));
    }

    #[test]
    fn test_error_serde() {
        let err = GenerationError::timed_out(30);
        let json = serde_json::to_string(&err).unwrap();
        let parsed: GenerationError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }
}
