use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use debate_agents::{
    CorpusDocument, InMemoryRetriever, LlamaCliConfig, LlamaCliGenerator, PersonaAgent,
    PersonaConfig,
};
use debate_core::{
    DebateOrchestrator, Generator, GeneratorOps, MockGenerator, OrchestratorConfig, Stance,
};

/// Two-persona Korean policy debate over a local llama-cli model.
#[derive(Debug, Parser)]
#[command(name = "debate-agents", version)]
struct Args {
    /// Debate topic.
    #[arg(long, default_value = "최저임금 인상 정책에 대한 찬반 토론")]
    topic: String,

    /// Number of rounds (one statement per side per round).
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Path to the GGUF model file.
    #[arg(long, default_value = "models/EXAONE-4.0-32B-Q4_K_M.gguf")]
    model: PathBuf,

    /// Path to the llama-cli binary.
    #[arg(long, default_value = "llama-cli")]
    llama_cli: PathBuf,

    /// JSON corpus of stance-tagged evidence articles.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Per-generation timeout in seconds.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Run with canned statements instead of a model (dry run).
    #[arg(long)]
    mock: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    info!(topic = %args.topic, rounds = args.rounds, mock = args.mock, "debate starting");

    let retriever = || -> Result<InMemoryRetriever> {
        match &args.corpus {
            Some(path) => InMemoryRetriever::from_json_file(path),
            None => Ok(InMemoryRetriever::new(seed_corpus())),
        }
    };

    let generator = |stance: Stance| -> Box<dyn Generator> {
        if args.mock {
            Box::new(mock_generator(stance))
        } else {
            Box::new(LlamaCliGenerator::new(LlamaCliConfig::new(
                args.llama_cli.clone(),
                args.model.clone(),
                Duration::from_secs(args.timeout_secs),
            )))
        }
    };

    let mut progressive = PersonaAgent::new(
        PersonaConfig::progressive(),
        Box::new(retriever()?),
        generator(Stance::Progressive),
    );
    let mut conservative = PersonaAgent::new(
        PersonaConfig::conservative(),
        Box::new(retriever()?),
        generator(Stance::Conservative),
    );

    let ops: Box<dyn debate_core::LanguageOps> = if args.mock {
        Box::new(debate_core::MockOps::new())
    } else {
        Box::new(GeneratorOps::new(LlamaCliGenerator::new(LlamaCliConfig::new(
            args.llama_cli.clone(),
            args.model.clone(),
            Duration::from_secs(args.timeout_secs),
        ))))
    };

    let mut orchestrator = DebateOrchestrator::with_config(
        ops,
        OrchestratorConfig {
            max_rounds: args.rounds,
            ..OrchestratorConfig::default()
        },
    );

    orchestrator.start(&args.topic)?;
    println!("=== 토론 주제: {} ===\n", args.topic);
    for round in 1..=args.rounds {
        println!("--- 라운드 {} ---", round);
        let (first, second) = orchestrator.run_round(&mut progressive, &mut conservative)?;
        for outcome in [&first, &second] {
            println!("[{}] {}", outcome.stance.label(), outcome.text);
            if outcome.regenerated {
                println!("  (근거 중복으로 재생성됨)");
            }
            if !outcome.consistent {
                println!("  (이전 발언과의 일관성 경고)");
            }
        }
        println!();
    }

    let outcome = orchestrator.conclude()?;
    println!("=== 토론 요약 ===\n{}", outcome.closing_summary);
    for side in &outcome.violations {
        if !side.violations.is_empty() {
            println!(
                "{} 측 일관성 경고 {}건",
                side.stance.label(),
                side.violations.len()
            );
        }
    }
    info!(
        progressive_evidence = outcome.ledger.progressive_entries,
        conservative_evidence = outcome.ledger.conservative_entries,
        "debate finished"
    );
    Ok(())
}

/// Built-in sample corpus used when no `--corpus` file is given.
fn seed_corpus() -> Vec<CorpusDocument> {
    vec![
        CorpusDocument {
            title: "최저임금 인상의 소득 개선 효과".to_string(),
            source: "한겨레".to_string(),
            stance: Stance::Progressive,
            text: "최저임금 인상 이후 저임금 노동자의 월평균 소득이 증가했다는 통계청 분석"
                .to_string(),
        },
        CorpusDocument {
            title: "독일 최저임금제 도입 경험".to_string(),
            source: "경향신문".to_string(),
            stance: Stance::Progressive,
            text: "독일 사례에서 최저임금 도입이 대량 실업으로 이어지지 않았다는 연구".to_string(),
        },
        CorpusDocument {
            title: "소상공인 고용 부담 조사".to_string(),
            source: "조선일보".to_string(),
            stance: Stance::Conservative,
            text: "최저임금 인상 이후 소상공인 고용이 감소했다는 KDI 조사".to_string(),
        },
        CorpusDocument {
            title: "인건비 상승과 물가".to_string(),
            source: "중앙일보".to_string(),
            stance: Stance::Conservative,
            text: "급격한 최저임금 인상이 외식 물가 상승률을 끌어올렸다는 한국은행 분석"
                .to_string(),
        },
    ]
}

/// Canned statements for `--mock` dry runs.
fn mock_generator(stance: Stance) -> MockGenerator {
    match stance {
        Stance::Progressive => MockGenerator::sequence_then(
            [
                "최저임금 인상은 저소득층의 소득을 직접 끌어올립니다. 통계청 분석에 따르면 \
                 저임금 노동자의 월평균 소득이 증가했습니다.",
                "독일 사례를 보면 최저임금 도입이 대량 실업으로 이어지지 않았습니다.",
                "사회 안전망 강화를 위해 정부의 적극적 역할이 필요합니다.",
            ],
            "진보 측은 기존 입장을 유지합니다.",
        ),
        Stance::Conservative => MockGenerator::sequence_then(
            [
                "급격한 인상은 소상공인의 인건비 부담을 키웁니다. KDI 조사에서 고용 감소가 \
                 확인되었습니다.",
                "한국은행 분석처럼 인건비 상승은 물가로 전가됩니다.",
                "시장 자율과 개인 책임이 장기 성장의 기반입니다.",
            ],
            "보수 측은 기존 입장을 유지합니다.",
        ),
    }
}
