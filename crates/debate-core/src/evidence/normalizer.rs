//! Evidence extraction and canonicalization.
//!
//! Pulls structured evidence mentions (statistics, institutions, country
//! examples, policy terms, indicators) out of free-text Korean statements
//! and folds them into canonical keys. Normalization is idempotent:
//! `normalize(normalize(x)) == normalize(x)` for every category.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of evidence categories.
///
/// Determines which extraction patterns and alias rules apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    /// Numeric claims: percentages, currency amounts, multiples.
    Statistic,
    /// Named institutions and data sources.
    Source,
    /// "<country> 사례/모델/정책/경험/제도" references.
    GeographicExample,
    /// Named policy terms.
    Policy,
    /// Named economic indicators.
    EconomicIndicator,
}

impl EvidenceCategory {
    /// Every category, for exhaustive extraction passes.
    pub const ALL: [EvidenceCategory; 5] = [
        Self::Statistic,
        Self::Source,
        Self::GeographicExample,
        Self::Policy,
        Self::EconomicIndicator,
    ];
}

impl std::fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Statistic => write!(f, "statistic"),
            Self::Source => write!(f, "source"),
            Self::GeographicExample => write!(f, "geographic_example"),
            Self::Policy => write!(f, "policy"),
            Self::EconomicIndicator => write!(f, "economic_indicator"),
        }
    }
}

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?\s*%").expect("PERCENT_RE regex should compile")
});

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?\s*(?:조|억|만)(?:\s*원)?").expect("CURRENCY_RE regex should compile")
});

static MULTIPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?\s*배").expect("MULTIPLE_RE regex should compile")
});

static GEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(독일|스웨덴|핀란드|덴마크|노르웨이|프랑스|영국|미국|일본|네덜란드|싱가포르)(?:의)?\s*(사례|모델|정책|경험|제도)",
    )
    .expect("GEO_RE regex should compile")
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:19|20)\d{2}").expect("YEAR_RE regex should compile")
});

/// Joins a number to its `%` sign: "3.6 %" → "3.6%".
static PERCENT_JOIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("PERCENT_JOIN_RE regex should compile")
});

/// Joins a number to its magnitude unit and drops a trailing 원:
/// "1조 원" → "1조", "5 억" → "5억".
static UNIT_JOIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(조|억|만)(?:\s*원)?").expect("UNIT_JOIN_RE regex should compile")
});

/// Institution alias table: canonical key first, then every variant that
/// folds to it. Variants are matched against lowercased text; each
/// canonical key appears among its own variants so folding is idempotent.
const INSTITUTION_ALIASES: &[(&str, &[&str])] = &[
    ("한국은행", &["한국은행", "bok", "한은"]),
    ("kdi", &["kdi", "한국개발연구원"]),
    ("통계청", &["통계청", "kosis", "국가통계포털"]),
    ("oecd", &["oecd", "경제협력개발기구"]),
    ("imf", &["imf", "국제통화기금"]),
    ("기획재정부", &["기획재정부", "기재부"]),
    ("국회예산정책처", &["국회예산정책처", "예정처"]),
    ("한국노동연구원", &["한국노동연구원", "kli"]),
    ("보건복지부", &["보건복지부", "복지부"]),
    ("고용노동부", &["고용노동부", "노동부"]),
];

/// Named policy terms recognized as evidence mentions.
const POLICY_TERMS: &[&str] = &[
    "최저임금",
    "기본소득",
    "소득주도성장",
    "종합부동산세",
    "법인세",
    "주 52시간",
    "국민연금",
    "무상급식",
    "탈원전",
    "규제 샌드박스",
    "부동산 규제",
    "재정 준칙",
];

/// Named economic indicators recognized as evidence mentions.
const INDICATOR_TERMS: &[&str] = &[
    "gdp",
    "국가부채",
    "가계부채",
    "실업률",
    "고용률",
    "물가상승률",
    "성장률",
    "경상수지",
    "기준금리",
    "지니계수",
    "출산율",
];

/// Generic authority hints used only for confidence scoring, on top of
/// the explicit institution aliases.
const AUTHORITY_HINTS: &[&str] = &["연구원", "연구소", "통계", "보고서", "백서"];

/// Extracts and canonicalizes evidence mentions.
///
/// Stateless; all pattern tables are compile-time constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceNormalizer;

impl EvidenceNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extract every evidence mention from a statement, grouped by
    /// category. Exhaustive: one statement may contribute to multiple
    /// categories. Unmatched or empty input yields an empty map.
    pub fn extract(&self, text: &str) -> BTreeMap<EvidenceCategory, Vec<String>> {
        let mut out = BTreeMap::new();
        if text.trim().is_empty() {
            return out;
        }
        let lower = text.to_lowercase();

        for category in EvidenceCategory::ALL {
            let matches = match category {
                EvidenceCategory::Statistic => {
                    let mut found = Vec::new();
                    for re in [&*PERCENT_RE, &*CURRENCY_RE, &*MULTIPLE_RE] {
                        found.extend(re.find_iter(text).map(|m| m.as_str().to_string()));
                    }
                    found
                }
                EvidenceCategory::Source => INSTITUTION_ALIASES
                    .iter()
                    .flat_map(|(_, variants)| variants.iter())
                    .filter(|v| lower.contains(**v))
                    .map(|v| v.to_string())
                    .collect(),
                EvidenceCategory::GeographicExample => GEO_RE
                    .find_iter(text)
                    .map(|m| m.as_str().to_string())
                    .collect(),
                EvidenceCategory::Policy => POLICY_TERMS
                    .iter()
                    .filter(|t| lower.contains(**t))
                    .map(|t| t.to_string())
                    .collect(),
                EvidenceCategory::EconomicIndicator => INDICATOR_TERMS
                    .iter()
                    .filter(|t| lower.contains(**t))
                    .map(|t| t.to_string())
                    .collect(),
            };
            let deduped = dedupe_preserving_order(matches);
            if !deduped.is_empty() {
                out.insert(category, deduped);
            }
        }
        out
    }

    /// Canonicalize a raw evidence mention into its ledger key.
    ///
    /// Lowercases, collapses whitespace, then applies the category's
    /// rewrite rules. Idempotent for every category.
    pub fn normalize(&self, raw: &str, category: EvidenceCategory) -> String {
        let collapsed = collapse(raw);
        if collapsed.is_empty() {
            return collapsed;
        }
        match category {
            EvidenceCategory::Statistic => {
                let joined = UNIT_JOIN_RE.replace_all(&collapsed, "${1}${2}");
                PERCENT_JOIN_RE.replace_all(&joined, "${1}%").into_owned()
            }
            EvidenceCategory::Source => self
                .fold_source(&collapsed)
                .map(|c| c.to_string())
                .unwrap_or(collapsed),
            EvidenceCategory::GeographicExample => match GEO_RE.captures(&collapsed) {
                Some(caps) => format!("{} {}", &caps[1], &caps[2]),
                None => collapsed,
            },
            EvidenceCategory::Policy | EvidenceCategory::EconomicIndicator => collapsed,
        }
    }

    /// Canonical names of every institution mentioned in `text`.
    pub fn sources_in(&self, text: &str) -> Vec<&'static str> {
        let lower = text.to_lowercase();
        let mut out = Vec::new();
        for (canonical, variants) in INSTITUTION_ALIASES {
            if variants.iter().any(|v| lower.contains(v)) && !out.contains(canonical) {
                out.push(*canonical);
            }
        }
        out
    }

    /// Whether `text` mentions a known institution or a generic
    /// authority hint. Used for confidence scoring only.
    pub fn has_authority_mention(&self, text: &str) -> bool {
        if !self.sources_in(text).is_empty() {
            return true;
        }
        let lower = text.to_lowercase();
        AUTHORITY_HINTS.iter().any(|h| lower.contains(h))
    }

    /// Whether `text` contains a year token within the last five years
    /// of `now_year`.
    pub fn has_recent_year(&self, text: &str, now_year: i32) -> bool {
        YEAR_RE
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<i32>().ok())
            .any(|y| y >= now_year - 5 && y <= now_year + 1)
    }

    fn fold_source(&self, collapsed: &str) -> Option<&'static str> {
        for (canonical, variants) in INSTITUTION_ALIASES {
            if variants.iter().any(|v| collapsed.contains(v)) {
                return Some(canonical);
            }
        }
        None
    }
}

fn collapse(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm() -> EvidenceNormalizer {
        EvidenceNormalizer::new()
    }

    #[test]
    fn test_extract_statistics() {
        let map = norm().extract("최저임금을 올리면 고용이 3.6% 감소하고 비용이 1조 원 늘어납니다");
        let stats = &map[&EvidenceCategory::Statistic];
        assert!(stats.contains(&"3.6%".to_string()));
        assert!(stats.iter().any(|s| s.contains("1조")));
    }

    #[test]
    fn test_extract_is_exhaustive_across_categories() {
        let map = norm().extract("한국은행에 따르면 GDP 대비 국가부채는 50%이다.");
        assert!(map.contains_key(&EvidenceCategory::Statistic));
        assert!(map.contains_key(&EvidenceCategory::Source));
        assert!(map.contains_key(&EvidenceCategory::EconomicIndicator));
        let indicators = &map[&EvidenceCategory::EconomicIndicator];
        assert!(indicators.contains(&"gdp".to_string()));
        assert!(indicators.contains(&"국가부채".to_string()));
    }

    #[test]
    fn test_extract_geographic_examples() {
        let map = norm().extract("독일의 사례와 스웨덴 모델을 참고해야 합니다");
        let geo = &map[&EvidenceCategory::GeographicExample];
        assert_eq!(geo.len(), 2);
        assert!(geo[0].contains("독일"));
        assert!(geo[1].contains("스웨덴"));
    }

    #[test]
    fn test_extract_policy_terms() {
        let map = norm().extract("기본소득과 최저임금 논의가 함께 필요합니다");
        let policies = &map[&EvidenceCategory::Policy];
        assert!(policies.contains(&"기본소득".to_string()));
        assert!(policies.contains(&"최저임금".to_string()));
    }

    #[test]
    fn test_extract_empty_input() {
        assert!(norm().extract("").is_empty());
        assert!(norm().extract("   ").is_empty());
    }

    #[test]
    fn test_extract_no_match_yields_empty() {
        let map = norm().extract("그냥 일반적인 의견입니다");
        assert!(map.is_empty());
    }

    #[test]
    fn test_normalize_statistic_canonical_forms() {
        let n = norm();
        assert_eq!(n.normalize("3.6 %", EvidenceCategory::Statistic), "3.6%");
        assert_eq!(n.normalize("3.6%", EvidenceCategory::Statistic), "3.6%");
        assert_eq!(n.normalize("1조 원", EvidenceCategory::Statistic), "1조");
        assert_eq!(n.normalize("1조", EvidenceCategory::Statistic), "1조");
        assert_eq!(n.normalize("5 억 원", EvidenceCategory::Statistic), "5억");
    }

    #[test]
    fn test_normalize_alias_folding() {
        let n = norm();
        let a = n.normalize("KDI", EvidenceCategory::Source);
        let b = n.normalize("한국개발연구원", EvidenceCategory::Source);
        assert_eq!(a, b);

        let bok = n.normalize("BOK", EvidenceCategory::Source);
        let bank = n.normalize("한국은행", EvidenceCategory::Source);
        assert_eq!(bok, bank);
        assert_eq!(bok, "한국은행");
    }

    #[test]
    fn test_normalize_geographic_particle_variants() {
        let n = norm();
        assert_eq!(
            n.normalize("독일의 사례", EvidenceCategory::GeographicExample),
            n.normalize("독일 사례", EvidenceCategory::GeographicExample),
        );
        assert_eq!(
            n.normalize("독일사례", EvidenceCategory::GeographicExample),
            "독일 사례"
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        let n = norm();
        let cases = [
            ("3.6 %", EvidenceCategory::Statistic),
            ("1조 원", EvidenceCategory::Statistic),
            ("KDI", EvidenceCategory::Source),
            ("한국개발연구원", EvidenceCategory::Source),
            ("독일의 사례", EvidenceCategory::GeographicExample),
            ("최저임금", EvidenceCategory::Policy),
            ("GDP", EvidenceCategory::EconomicIndicator),
            ("  여러   공백  ", EvidenceCategory::Policy),
        ];
        for (raw, category) in cases {
            let once = n.normalize(raw, category);
            let twice = n.normalize(&once, category);
            assert_eq!(once, twice, "normalize not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(norm().normalize("", EvidenceCategory::Statistic), "");
        assert_eq!(norm().normalize("   ", EvidenceCategory::Source), "");
    }

    #[test]
    fn test_sources_in() {
        let n = norm();
        let sources = n.sources_in("한국은행과 KDI 모두 같은 전망을 내놓았다");
        assert!(sources.contains(&"한국은행"));
        assert!(sources.contains(&"kdi"));
        assert!(n.sources_in("근거 없는 주장").is_empty());
    }

    #[test]
    fn test_authority_and_year_hints() {
        let n = norm();
        assert!(n.has_authority_mention("한국은행 보고서에 따르면"));
        assert!(n.has_authority_mention("모 연구소 발표"));
        assert!(!n.has_authority_mention("제 개인적인 생각으로는"));

        assert!(n.has_recent_year("2024년 통계 기준", 2026));
        assert!(!n.has_recent_year("1998년 외환위기 당시", 2026));
        assert!(!n.has_recent_year("연도 없음", 2026));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(EvidenceCategory::Statistic.to_string(), "statistic");
        assert_eq!(
            EvidenceCategory::GeographicExample.to_string(),
            "geographic_example"
        );
        assert_eq!(
            EvidenceCategory::EconomicIndicator.to_string(),
            "economic_indicator"
        );
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&EvidenceCategory::Source).unwrap();
        assert_eq!(json, "\"source\"");
        let parsed: EvidenceCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EvidenceCategory::Source);
    }
}
