//! Persona agent — turns a [`TurnContext`] into a statement.
//!
//! Assembles the prompt (persona, topic, opponent statement, retrieved
//! evidence, memory digest, conflict warning), runs the generator, and
//! cleans the raw model output. Generation failures propagate; the
//! orchestrator owns the fallback.

use tracing::debug;

use debate_core::{
    GenerationError, GenerationRequest, Generator, StatementProvider, TurnContext,
};

use crate::persona::PersonaConfig;
use crate::retriever::Retriever;

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TOP_K: usize = 3;

pub struct PersonaAgent {
    persona: PersonaConfig,
    retriever: Box<dyn Retriever>,
    generator: Box<dyn Generator>,
    max_tokens: u32,
    top_k: usize,
}

impl PersonaAgent {
    pub fn new(
        persona: PersonaConfig,
        retriever: Box<dyn Retriever>,
        generator: Box<dyn Generator>,
    ) -> Self {
        Self {
            persona,
            retriever,
            generator,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
        }
    }

    fn build_prompt(&self, context: &TurnContext) -> String {
        let mut prompt = format!(
            "{}\n\n토론 주제: {}\n",
            self.persona.system_prompt, context.topic
        );

        let hits = self
            .retriever
            .search(&context.topic, self.persona.stance, self.top_k);
        if !hits.is_empty() {
            prompt.push_str("\n참고 근거 자료:\n");
            for hit in &hits {
                prompt.push_str(&format!("- ({}) {}\n", hit.source, hit.text));
            }
        }

        if !context.memory_digest.is_empty() {
            prompt.push_str("\n지금까지 나의 주요 발언 요약:\n");
            for entry in &context.memory_digest {
                prompt.push_str(&format!("- {}\n", entry.summary));
            }
        }

        match &context.opponent_statement {
            Some(opponent) => {
                prompt.push_str(&format!(
                    "\n상대방({}) 의견: {}\n\n{}\n",
                    self.persona.stance.opposing().label(),
                    opponent,
                    self.persona.rebuttal_instruction
                ));
            }
            None => {
                prompt.push_str(&format!("\n{}\n", self.persona.opening_instruction));
            }
        }

        if let Some(warning) = &context.conflict_warning {
            prompt.push_str(&format!("\n{}\n", warning));
        }

        prompt.push_str(&format!("\n{} 입장:", self.persona.stance.label()));
        prompt
    }
}

impl StatementProvider for PersonaAgent {
    fn propose(&mut self, context: &TurnContext) -> Result<String, GenerationError> {
        let prompt = self.build_prompt(context);
        debug!(
            stance = %self.persona.stance,
            round = context.round,
            regeneration = context.conflict_warning.is_some(),
            prompt_chars = prompt.chars().count(),
            "proposing statement"
        );
        let raw = self
            .generator
            .generate(&GenerationRequest::new(&prompt, self.max_tokens))?;
        let cleaned = post_process(&raw);
        if cleaned.is_empty() {
            return Err(GenerationError::failed("empty statement after cleanup"));
        }
        Ok(cleaned)
    }
}

/// Strip model scaffolding from raw llama-cli output: everything up to
/// the last `</think>`, end-of-text markers, and any echoed next turn.
pub fn post_process(raw: &str) -> String {
    let mut text = raw;
    if let Some(idx) = text.rfind("</think>").or_else(|| text.rfind("</THINK>")) {
        text = &text[idx + "</think>".len()..];
    }
    let mut cleaned = text
        .replace("[end of text]", "")
        .replace("[END OF TEXT]", "");
    if let Some(idx) = cleaned.find("User:") {
        cleaned.truncate(idx);
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::{MockGenerator, Stance};

    use crate::retriever::{CorpusDocument, InMemoryRetriever, RetrievedPassage};

    struct EmptyRetriever;
    impl Retriever for EmptyRetriever {
        fn search(&self, _query: &str, _stance: Stance, _top_k: usize) -> Vec<RetrievedPassage> {
            Vec::new()
        }
    }

    fn context(topic: &str) -> TurnContext {
        TurnContext {
            topic: topic.to_string(),
            round: 1,
            stance: Stance::Progressive,
            opponent_statement: None,
            memory_digest: Vec::new(),
            conflict_warning: None,
        }
    }

    fn agent_with(generator: MockGenerator) -> PersonaAgent {
        PersonaAgent::new(
            PersonaConfig::progressive(),
            Box::new(EmptyRetriever),
            Box::new(generator),
        )
    }

    #[test]
    fn test_opening_statement() {
        let mut agent = agent_with(MockGenerator::fixed("최저임금 인상이 필요합니다"));
        let text = agent.propose(&context("최저임금 인상")).unwrap();
        assert_eq!(text, "최저임금 인상이 필요합니다");
    }

    #[test]
    fn test_think_block_is_stripped() {
        let raw = "<think>상대 논거를 검토하면...</think>\n인상이 필요합니다 [end of text]";
        let mut agent = agent_with(MockGenerator::fixed(raw));
        let text = agent.propose(&context("최저임금 인상")).unwrap();
        assert_eq!(text, "인상이 필요합니다");
    }

    #[test]
    fn test_echoed_turn_is_cut() {
        assert_eq!(
            post_process("인상이 필요합니다\nUser: 다음 질문입니다"),
            "인상이 필요합니다"
        );
    }

    #[test]
    fn test_post_process_keeps_last_think_marker() {
        let raw = "</think>버림</think>최종 답변";
        assert_eq!(post_process(raw), "최종 답변");
    }

    #[test]
    fn test_empty_after_cleanup_is_an_error() {
        let mut agent = agent_with(MockGenerator::fixed("<think>생각만</think> [end of text]"));
        assert!(agent.propose(&context("주제")).is_err());
    }

    #[test]
    fn test_prompt_assembly() {
        let retriever = InMemoryRetriever::new(vec![CorpusDocument {
            title: "최저임금 기사".to_string(),
            source: "한겨레".to_string(),
            stance: Stance::Progressive,
            text: "최저임금 인상이 소득을 늘렸다".to_string(),
        }]);
        let agent = PersonaAgent::new(
            PersonaConfig::progressive(),
            Box::new(retriever),
            Box::new(MockGenerator::fixed("발언")),
        );

        let mut ctx = context("최저임금 인상");
        ctx.opponent_statement = Some("부작용이 큽니다".to_string());
        ctx.conflict_warning = Some("다른 근거로 다시 논증하세요".to_string());
        let prompt = agent.build_prompt(&ctx);

        assert!(prompt.contains("토론 주제: 최저임금 인상"));
        assert!(prompt.contains("참고 근거 자료"));
        assert!(prompt.contains("한겨레"));
        assert!(prompt.contains("상대방(보수) 의견: 부작용이 큽니다"));
        assert!(prompt.contains("다른 근거로 다시 논증하세요"));
        assert!(prompt.ends_with("진보 입장:"));
    }

    #[test]
    fn test_opening_prompt_has_no_opponent_section() {
        let agent = agent_with(MockGenerator::fixed("발언"));
        let prompt = agent.build_prompt(&context("최저임금 인상"));
        assert!(!prompt.contains("상대방"));
        assert!(prompt.contains("진보적 관점에서 당신의 입장"));
    }

    #[test]
    fn test_generation_failure_propagates() {
        let mut agent = agent_with(MockGenerator::failing());
        assert!(agent.propose(&context("주제")).is_err());
    }
}
