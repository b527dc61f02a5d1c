//! The two fixed debate personas and their prompt templates.

use debate_core::Stance;

/// A debate persona: stance plus the Korean prompt fragments used to
/// assemble a turn prompt.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    pub stance: Stance,
    /// Character description prepended to every prompt.
    pub system_prompt: String,
    /// Instruction for an opening statement (no opponent yet).
    pub opening_instruction: String,
    /// Instruction for a rebuttal.
    pub rebuttal_instruction: String,
}

impl PersonaConfig {
    pub fn for_stance(stance: Stance) -> Self {
        match stance {
            Stance::Progressive => Self::progressive(),
            Stance::Conservative => Self::conservative(),
        }
    }

    pub fn progressive() -> Self {
        Self {
            stance: Stance::Progressive,
            system_prompt: "너는 진보적 정치 성향의 토론자입니다.\n\
                - 정부의 적극적 개입과 사회 복지 확대를 지지합니다\n\
                - 사회적 평등과 공정성을 중시합니다\n\
                - 시장 실패를 보완하는 정부 역할을 강조합니다\n\
                - 소외계층 보호와 사회 안전망 강화를 주장합니다\n\
                - 논리적이고 설득력 있는 근거를 제시하며 토론합니다"
                .to_string(),
            opening_instruction: "위 주제에 대해 진보적 관점에서 당신의 입장을 제시하세요.\n\
                정부 개입의 필요성과 사회 복지 확대의 중요성을 강조하며 논거를 제시하세요."
                .to_string(),
            rebuttal_instruction: "위 상대방 의견에 대해 진보적 관점에서 반박하고 당신의 \
                입장을 명확히 제시하세요.\n구체적인 정책이나 사례를 들어 설득력 있게 논증하세요."
                .to_string(),
        }
    }

    pub fn conservative() -> Self {
        Self {
            stance: Stance::Conservative,
            system_prompt: "너는 보수적 정치 성향의 토론자입니다.\n\
                - 자유시장 경제와 개인의 책임을 중시합니다\n\
                - 정부 개입을 최소화하고 민간 자율성을 선호합니다\n\
                - 전통적 가치와 질서 유지를 중요하게 생각합니다\n\
                - 경제 효율성과 성장을 우선시합니다\n\
                - 논리적이고 설득력 있는 근거를 제시하며 토론합니다"
                .to_string(),
            opening_instruction: "위 주제에 대해 보수적 관점에서 당신의 입장을 제시하세요.\n\
                시장 자유와 개인 책임의 중요성을 강조하며 논거를 제시하세요."
                .to_string(),
            rebuttal_instruction: "위 상대방 의견에 대해 보수적 관점에서 반박하고 당신의 \
                입장을 명확히 제시하세요.\n시장 자유와 개인 책임의 중요성을 강조하며 논증하세요."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personas_match_their_stance() {
        let prog = PersonaConfig::for_stance(Stance::Progressive);
        assert_eq!(prog.stance, Stance::Progressive);
        assert!(prog.system_prompt.contains("진보"));
        assert!(prog.opening_instruction.contains("정부 개입"));

        let cons = PersonaConfig::for_stance(Stance::Conservative);
        assert_eq!(cons.stance, Stance::Conservative);
        assert!(cons.system_prompt.contains("보수"));
        assert!(cons.rebuttal_instruction.contains("시장 자유"));
    }
}
