//! Blocking `llama-cli` subprocess backend.
//!
//! The prompt is wrapped in a plain chat template, written to a temp
//! file, and passed with `-f`; stdout is drained on a separate thread
//! while the parent polls for exit against a deadline. llama-cli logs
//! verbosely on stderr, which is discarded — piping it without a reader
//! would deadlock once the pipe buffer fills.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use debate_core::{GenerationError, GenerationRequest, Generator};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum LlamaCliError {
    #[error("llama-cli io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("llama-cli did not finish within {secs}s")]
    Timeout { secs: u64 },
    #[error("llama-cli exited with status {status}")]
    NonZeroExit { status: i32 },
    #[error("llama-cli produced no output")]
    EmptyOutput,
}

impl From<LlamaCliError> for GenerationError {
    fn from(e: LlamaCliError) -> Self {
        match e {
            LlamaCliError::Timeout { secs } => GenerationError::timed_out(secs),
            other => GenerationError::failed(&other.to_string()),
        }
    }
}

/// Invocation parameters, matching a CPU-friendly llama-cli setup.
#[derive(Debug, Clone)]
pub struct LlamaCliConfig {
    pub llama_cli_path: PathBuf,
    pub model_path: PathBuf,
    pub context_size: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub seed: u64,
    pub threads: u32,
    /// Wall-clock deadline for one generation.
    pub timeout: Duration,
}

impl LlamaCliConfig {
    pub fn new(llama_cli_path: PathBuf, model_path: PathBuf, timeout: Duration) -> Self {
        Self {
            llama_cli_path,
            model_path,
            context_size: 2048,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
            seed: 42,
            threads: 4,
            timeout,
        }
    }
}

/// [`Generator`] backed by a local llama-cli binary.
pub struct LlamaCliGenerator {
    config: LlamaCliConfig,
}

impl LlamaCliGenerator {
    pub fn new(config: LlamaCliConfig) -> Self {
        Self { config }
    }

    fn run(&self, request: &GenerationRequest) -> Result<String, LlamaCliError> {
        // Temp file rather than stdin: llama-cli reads `-f` before
        // loading the model, and the file is cleaned up on drop even if
        // the child is killed.
        let mut input = NamedTempFile::new()?;
        write!(input, "User: {}\nAssistant:", request.prompt)?;
        input.flush()?;

        let mut child = Command::new(&self.config.llama_cli_path)
            .arg("-m")
            .arg(&self.config.model_path)
            .arg("-f")
            .arg(input.path())
            .args(["-n", &request.max_tokens.to_string()])
            .args(["-c", &self.config.context_size.to_string()])
            .args(["--temp", &self.config.temperature.to_string()])
            .args(["--top-p", &self.config.top_p.to_string()])
            .args(["--repeat-penalty", &self.config.repeat_penalty.to_string()])
            .arg("-no-cnv")
            .args(["--seed", &self.config.seed.to_string()])
            .args(["-t", &self.config.threads.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            LlamaCliError::Io(std::io::Error::other("child stdout not captured"))
        })?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.config.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "llama-cli deadline hit; killing child"
                );
                child.kill()?;
                child.wait()?;
                return Err(LlamaCliError::Timeout {
                    secs: self.config.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let bytes = reader
            .join()
            .map_err(|_| LlamaCliError::Io(std::io::Error::other("stdout reader panicked")))??;
        if !status.success() {
            return Err(LlamaCliError::NonZeroExit {
                status: status.code().unwrap_or(-1),
            });
        }
        // Model output may contain stray invalid bytes; replace rather
        // than fail the turn.
        let output = String::from_utf8_lossy(&bytes).trim().to_string();
        if output.is_empty() {
            return Err(LlamaCliError::EmptyOutput);
        }
        debug!(chars = output.chars().count(), "llama-cli completed");
        Ok(output)
    }
}

impl Generator for LlamaCliGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(self.run(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cli: &str, timeout: Duration) -> LlamaCliConfig {
        LlamaCliConfig::new(PathBuf::from(cli), PathBuf::from("model.gguf"), timeout)
    }

    #[test]
    fn test_missing_binary_is_a_failure() {
        let gen = LlamaCliGenerator::new(config(
            "/nonexistent/llama-cli",
            Duration::from_secs(5),
        ));
        let err = gen
            .generate(&GenerationRequest::new("안녕하세요", 16))
            .unwrap_err();
        assert!(!err.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        use std::os::unix::fs::PermissionsExt;

        // Stub binary that ignores the llama flags and just blocks.
        let mut script = NamedTempFile::new().unwrap();
        write!(script, "#!/bin/sh\nsleep 60\n").unwrap();
        script.flush().unwrap();
        std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        // Close the write handle; executing a file still open for
        // writing fails with ETXTBSY on Linux.
        let script = script.into_temp_path();

        let gen = LlamaCliGenerator::new(config(
            script.to_str().unwrap(),
            Duration::from_millis(200),
        ));
        let start = Instant::now();
        let err = gen
            .generate(&GenerationRequest::new("안녕하세요", 16))
            .unwrap_err();
        assert!(err.timed_out);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_error_conversion() {
        let err: GenerationError = LlamaCliError::Timeout { secs: 600 }.into();
        assert!(err.timed_out);
        let err: GenerationError = LlamaCliError::EmptyOutput.into();
        assert!(!err.timed_out);
        assert!(err.reason.contains("no output"));
    }
}
