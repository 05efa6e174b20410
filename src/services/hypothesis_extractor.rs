use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    errors::{AppError, AppResult},
    models::domain::extraction::{
        ExtractedDependentVariable, ExtractedIndependentVariable, HypothesisExtraction,
        ModelExtraction, ParsedHypothesis,
    },
    services::llm_service::{CompletionRequest, LanguageModel},
};

const SYSTEM_PROMPT: &str =
    "You are an expert in research methods and experimental design. Always return valid JSON.";

const DEFAULT_RELATIONSHIP: &str = "affects";

/// Suggestions for a variable that matches no known instrument.
const GENERIC_MEASURES: [&str; 3] = ["Custom Scale", "Likert Scale", "Self-Report Measure"];
/// Suggestions when the model could not be asked either.
const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Custom Likert Scale",
    "Behavioral Measure",
    "Self-Report Questionnaire",
];

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON_OBJECT is a valid regex pattern"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pattern {
    Arrow,
    Verb,
    Effect,
    Directional,
    Correlation,
    Conjunction,
}

static PATTERNS: Lazy<Vec<(Regex, Pattern)>> = Lazy::new(|| {
    [
        (r"(.+?)\s*(?:→|->)\s*(.+)", Pattern::Arrow),
        (r"(?i)(.+?)\s+(?:affects?|influences?|impacts?|predicts?)\s+(.+)", Pattern::Verb),
        (r"(?i)The\s+effect\s+of\s+(.+?)\s+on\s+(.+)", Pattern::Effect),
        (r"(?i)(.+?)\s+will\s+(?:increase|decrease|improve|reduce)\s+(.+)", Pattern::Directional),
        (
            r"(?i)(.+?)\s+(?:is\s+)?(?:associated|correlated|related)\s+(?:with|to)\s+(.+)",
            Pattern::Correlation,
        ),
        (r"(?i)(.+?)\s+and\s+(.+)", Pattern::Conjunction),
    ]
    .into_iter()
    .map(|(pattern, kind)| {
        (
            Regex::new(pattern).expect("hypothesis patterns are valid regex patterns"),
            kind,
        )
    })
    .collect()
});

const DV_KEYWORDS: [&str; 11] = [
    "performance",
    "satisfaction",
    "anxiety",
    "depression",
    "scores",
    "levels",
    "outcomes",
    "grades",
    "achievement",
    "behavior",
    "attitudes",
];

const IV_KEYWORDS: [&str; 8] = [
    "treatment",
    "intervention",
    "exposure",
    "use",
    "usage",
    "social media",
    "therapy",
    "training",
];

const COMMON_SCALES: [(&str, [&str; 3]); 11] = [
    (
        "anxiety",
        [
            "State-Trait Anxiety Inventory (STAI)",
            "Beck Anxiety Inventory (BAI)",
            "Generalized Anxiety Disorder 7 (GAD-7)",
        ],
    ),
    (
        "depression",
        [
            "Beck Depression Inventory (BDI)",
            "Patient Health Questionnaire-9 (PHQ-9)",
            "Center for Epidemiologic Studies Depression Scale (CES-D)",
        ],
    ),
    (
        "self-esteem",
        [
            "Rosenberg Self-Esteem Scale",
            "State Self-Esteem Scale",
            "Coopersmith Self-Esteem Inventory",
        ],
    ),
    (
        "stress",
        [
            "Perceived Stress Scale (PSS)",
            "Depression Anxiety Stress Scales (DASS)",
            "Stress Response Inventory",
        ],
    ),
    (
        "satisfaction",
        [
            "Satisfaction with Life Scale (SWLS)",
            "Customer Satisfaction Scale",
            "Job Satisfaction Survey",
        ],
    ),
    (
        "attitude",
        ["Attitude Scale", "Semantic Differential Scale", "Likert Scale Items"],
    ),
    (
        "behavior",
        ["Behavioral Checklist", "Frequency Scale", "Behavioral Intention Scale"],
    ),
    (
        "well-being",
        [
            "PERMA Scale",
            "Warwick-Edinburgh Mental Well-being Scale",
            "WHO-5 Well-Being Index",
        ],
    ),
    (
        "performance",
        [
            "Academic Performance Scale",
            "Task Performance Measure",
            "Performance Rating Scale",
        ],
    ),
    ("grades", ["GPA", "Course Grades", "Academic Achievement Scale"]),
    (
        "achievement",
        [
            "Academic Achievement Scale",
            "Achievement Goal Questionnaire",
            "Achievement Motivation Scale",
        ],
    ),
];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Known instruments for a variable name, if any keyword matches.
fn known_measures(dv_name: &str) -> Option<Vec<String>> {
    let lower = dv_name.to_lowercase();
    COMMON_SCALES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, scales)| to_strings(scales))
}

pub fn suggested_measures(dv_name: &str) -> Vec<String> {
    known_measures(dv_name).unwrap_or_else(|| to_strings(&GENERIC_MEASURES))
}

pub struct HypothesisExtractor {
    model: Arc<dyn LanguageModel>,
}

impl HypothesisExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Asks the model first and falls back to pattern matching on any failure.
    pub async fn extract(&self, hypotheses: &[String]) -> HypothesisExtraction {
        match self.extract_with_model(hypotheses).await {
            Ok(extraction) => extraction,
            Err(e) => {
                log::warn!("Model extraction failed, using pattern fallback: {}", e);
                fallback_extraction(hypotheses)
            }
        }
    }

    async fn extract_with_model(&self, hypotheses: &[String]) -> AppResult<HypothesisExtraction> {
        let request = CompletionRequest::new(extraction_prompt(hypotheses)?).with_system(SYSTEM_PROMPT);
        let reply = self.model.complete(request).await?;
        parse_model_reply(&reply)
    }

    pub async fn suggest_scales(&self, dv_name: &str) -> Vec<String> {
        if let Some(measures) = known_measures(dv_name) {
            return measures;
        }

        let request = CompletionRequest::new(format!(
            "Suggest 3 validated psychological scales or measures for assessing \"{}\". Return only scale names, one per line.",
            dv_name
        ))
        .with_max_tokens(100);

        match self.model.complete(request).await {
            Ok(reply) => {
                let suggestions: Vec<String> = reply
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .take(3)
                    .map(str::to_string)
                    .collect();
                if suggestions.is_empty() {
                    to_strings(&FALLBACK_SUGGESTIONS)
                } else {
                    suggestions
                }
            }
            Err(e) => {
                log::error!("Failed to get scale suggestions for '{}': {}", dv_name, e);
                to_strings(&FALLBACK_SUGGESTIONS)
            }
        }
    }
}

fn extraction_prompt(hypotheses: &[String]) -> AppResult<String> {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(ModelExtraction))?;
    let listed = hypotheses
        .iter()
        .enumerate()
        .map(|(i, h)| format!("H{}: {}", i + 1, h))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "You are a research methods expert. Analyze these research hypotheses and extract:
1. Independent Variables (IVs)
2. Dependent Variables (DVs)
3. The relationship between them

Hypotheses:
{listed}

For each hypothesis, identify the IV (what is manipulated), the DV (what is measured as the \
outcome) and the direction of the relationship. Merge similar DVs and suggest established \
psychological scales where possible.

Common patterns to recognize:
- \"X → Y\" or \"X -> Y\" means X affects Y
- \"The effect of X on Y\" means X is IV, Y is DV
- \"X influences/impacts/affects Y\" means X is IV, Y is DV

Return ONLY a JSON object matching this schema:
{schema}"
    ))
}

/// Pulls the first JSON object out of a model reply and gives every entry an id.
pub fn parse_model_reply(reply: &str) -> AppResult<HypothesisExtraction> {
    let candidate = JSON_OBJECT
        .find(reply)
        .map(|m| m.as_str())
        .unwrap_or(reply);
    let parsed: ModelExtraction = serde_json::from_str(candidate).map_err(|e| {
        AppError::ExtractionError(format!("model reply is not valid extraction JSON: {}", e))
    })?;

    Ok(HypothesisExtraction {
        hypotheses: parsed
            .hypotheses
            .into_iter()
            .enumerate()
            .map(|(i, h)| ParsedHypothesis {
                id: format!("h_{}", i + 1),
                original: h.original,
                iv: h.iv,
                dv: h.dv,
                relationship: h.relationship.unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string()),
                parsed: h.parsed.unwrap_or(true),
            })
            .collect(),
        unique_dvs: parsed
            .unique_dvs
            .into_iter()
            .enumerate()
            .map(|(i, dv)| ExtractedDependentVariable {
                id: format!("dv_{}", i + 1),
                name: dv.name,
                hypothesis_indices: dv.hypothesis_indices,
                suggested_measures: dv.suggested_measures,
                operationalizations: Vec::new(),
            })
            .collect(),
        unique_ivs: parsed
            .unique_ivs
            .into_iter()
            .enumerate()
            .map(|(i, iv)| ExtractedIndependentVariable {
                id: format!("iv_{}", i + 1),
                name: iv.name,
                hypothesis_indices: iv.hypothesis_indices,
                suggested_levels: iv.suggested_levels,
            })
            .collect(),
    })
}

struct Match {
    iv: Option<String>,
    dv: Option<String>,
    relationship: String,
    parsed: bool,
}

fn match_hypothesis(hypothesis: &str) -> Match {
    for (regex, kind) in PATTERNS.iter() {
        if let Some(captures) = regex.captures(hypothesis) {
            let relationship = match kind {
                Pattern::Directional if hypothesis.contains("increase") => "increases",
                Pattern::Directional if hypothesis.contains("decrease") => "decreases",
                Pattern::Directional if hypothesis.contains("improve") => "improves",
                Pattern::Directional => "reduces",
                Pattern::Correlation => "is associated with",
                Pattern::Conjunction => "is related to",
                Pattern::Arrow | Pattern::Verb | Pattern::Effect => DEFAULT_RELATIONSHIP,
            };
            return Match {
                iv: captures.get(1).map(|m| m.as_str().trim().to_string()),
                dv: captures.get(2).map(|m| m.as_str().trim().to_string()),
                relationship: relationship.to_string(),
                parsed: true,
            };
        }
    }

    let mut result = Match {
        iv: None,
        dv: None,
        relationship: DEFAULT_RELATIONSHIP.to_string(),
        parsed: false,
    };
    if hypothesis.is_empty() {
        return result;
    }

    let lower = hypothesis.to_lowercase();
    for dv in DV_KEYWORDS.iter().filter(|k| lower.contains(*k)) {
        result.dv = Some(dv.to_string());
        if let Some(iv) = IV_KEYWORDS.iter().find(|k| lower.contains(*k)) {
            result.iv = Some(iv.to_string());
            result.parsed = true;
            return result;
        }
    }

    let words: Vec<&str> = hypothesis.split_whitespace().collect();
    if let [first, .., last] = words.as_slice() {
        result.iv = Some(first.to_string());
        result.dv = Some(last.to_string());
        result.parsed = true;
    }
    result
}

/// Rule-based extraction used when the language model is unavailable or unparseable.
pub fn fallback_extraction(hypotheses: &[String]) -> HypothesisExtraction {
    let mut parsed = Vec::with_capacity(hypotheses.len());
    // (name, hypothesis indices) keyed case-insensitively, in first-seen order
    let mut dvs: Vec<(String, Vec<usize>)> = Vec::new();
    let mut ivs: Vec<(String, Vec<usize>)> = Vec::new();

    for (index, hypothesis) in hypotheses.iter().enumerate() {
        let found = match_hypothesis(hypothesis);
        if let Some(dv) = &found.dv {
            collect_unique(&mut dvs, dv, index);
        }
        if let Some(iv) = &found.iv {
            collect_unique(&mut ivs, iv, index);
        }
        parsed.push(ParsedHypothesis {
            id: format!("h_{}", index + 1),
            original: hypothesis.clone(),
            iv: found.iv,
            dv: found.dv,
            relationship: found.relationship,
            parsed: found.parsed,
        });
    }

    HypothesisExtraction {
        hypotheses: parsed,
        unique_dvs: dvs
            .into_iter()
            .enumerate()
            .map(|(i, (name, hypothesis_indices))| ExtractedDependentVariable {
                id: format!("dv_{}", i + 1),
                suggested_measures: suggested_measures(&name),
                name,
                hypothesis_indices,
                operationalizations: Vec::new(),
            })
            .collect(),
        unique_ivs: ivs
            .into_iter()
            .enumerate()
            .map(|(i, (name, hypothesis_indices))| ExtractedIndependentVariable {
                id: format!("iv_{}", i + 1),
                name,
                hypothesis_indices,
                suggested_levels: Vec::new(),
            })
            .collect(),
    }
}

fn collect_unique(seen: &mut Vec<(String, Vec<usize>)>, name: &str, index: usize) {
    match seen
        .iter_mut()
        .find(|(existing, _)| existing.to_lowercase() == name.to_lowercase())
    {
        Some((_, indices)) => indices.push(index),
        None => seen.push((name.to_string(), vec![index])),
    }
}
