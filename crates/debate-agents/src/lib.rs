//! Persona agents and model plumbing for the debate engine.
//!
//! `debate-core` owns the protocol; this crate supplies the concrete
//! pieces around it: the two Korean personas, stance-filtered evidence
//! retrieval, prompt assembly, and the blocking llama-cli backend.

pub mod agent;
pub mod llama;
pub mod persona;
pub mod retriever;

pub use agent::{post_process, PersonaAgent};
pub use llama::{LlamaCliConfig, LlamaCliError, LlamaCliGenerator};
pub use persona::PersonaConfig;
pub use retriever::{CorpusDocument, InMemoryRetriever, RetrievedPassage, Retriever};
