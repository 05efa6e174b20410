use crate::models::domain::study::{DemographicSelection, Item, ResponseScale};

use super::{
    error::{SurveyError, SurveyResult},
    ids::IdGenerator,
    model::{Question, QuestionKind},
    templates,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DemographicKind {
    Numeric,
    MultipleChoice,
    Text,
}

impl DemographicKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "numeric" => Some(DemographicKind::Numeric),
            "multiple_choice" => Some(DemographicKind::MultipleChoice),
            "text" => Some(DemographicKind::Text),
            _ => None,
        }
    }
}

fn question(
    ids: &mut IdGenerator,
    label: &str,
    text: String,
    force_response: bool,
    kind: QuestionKind,
) -> Question {
    let reference = ids.next_question();
    Question {
        id: reference.id,
        export_tag: reference.tag,
        label: label.to_string(),
        text,
        force_response,
        kind,
    }
}

pub fn build_consent_question(ids: &mut IdGenerator) -> Question {
    question(
        ids,
        "Consent",
        templates::CONSENT_TEXT.to_string(),
        true,
        QuestionKind::Consent {
            choices: vec![
                templates::CONSENT_CHOICE.to_string(),
                templates::DECLINE_CHOICE.to_string(),
            ],
        },
    )
}

/// Builds one demographic question. The type is checked before an id is allocated.
pub fn build_demographic_question(
    ids: &mut IdGenerator,
    selection: &DemographicSelection,
) -> SurveyResult<Question> {
    let field = selection.field.as_str();
    let config = &selection.config;
    let kind = DemographicKind::parse(&config.kind).ok_or_else(|| {
        SurveyError::UnsupportedDemographicType {
            field: field.to_string(),
            kind: config.kind.clone(),
        }
    })?;

    let kind = match kind {
        DemographicKind::Numeric => {
            let bounds = config.validation.unwrap_or_default();
            let mut min = bounds.min.unwrap_or(templates::DEFAULT_NUMERIC_MIN);
            let mut max = bounds.max.unwrap_or(templates::DEFAULT_NUMERIC_MAX);
            if min > max {
                log::warn!("Swapping inverted numeric range {}..{} for '{}'", min, max, field);
                std::mem::swap(&mut min, &mut max);
            }
            QuestionKind::DemographicNumeric { min, max }
        }
        DemographicKind::MultipleChoice => {
            let choices = if config.options.is_empty() {
                log::warn!("No options given for '{}', using default choices", field);
                templates::DEFAULT_CHOICES.iter().map(|c| c.to_string()).collect()
            } else {
                config.options.clone()
            };
            QuestionKind::DemographicChoice { choices }
        }
        DemographicKind::Text => QuestionKind::FreeText { multiline: false },
    };

    Ok(question(
        ids,
        field,
        templates::demographic_prompt(field),
        true,
        kind,
    ))
}

/// Builds a Likert matrix with one statement row per item.
pub fn build_matrix_question(
    ids: &mut IdGenerator,
    scale_name: &str,
    items: &[Item],
    scale: Option<&ResponseScale>,
) -> Question {
    let instruction = if scale.is_some() {
        templates::RATING_INSTRUCTION
    } else {
        templates::AGREEMENT_INSTRUCTION
    };
    question(
        ids,
        scale_name,
        format!("<h4>{}</h4><p>{}</p>", scale_name, instruction),
        true,
        QuestionKind::LikertMatrix {
            statements: items.iter().map(|item| item.text.clone()).collect(),
            scale: scale_points(scale),
        },
    )
}

/// Answer labels for a matrix: verbatim labels, anchored endpoints or plain numbers.
fn scale_points(scale: Option<&ResponseScale>) -> Vec<String> {
    let Some(scale) = scale.filter(|s| s.points >= 2) else {
        return templates::AGREEMENT_SCALE.iter().map(|p| p.to_string()).collect();
    };

    let points = usize::from(scale.points);
    if scale.labels.len() == points {
        return scale.labels.clone();
    }

    (1..=points)
        .map(|point| match scale.labels.as_slice() {
            [low, _] if point == 1 => format!("{point} - {low}"),
            [_, high] if point == points => format!("{point} - {high}"),
            _ => point.to_string(),
        })
        .collect()
}

pub fn build_manipulation_check_question(ids: &mut IdGenerator, prompt: Option<&str>) -> Question {
    let text = prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(templates::DEFAULT_MANIPULATION_CHECK);
    question(
        ids,
        "Manipulation Check",
        text.to_string(),
        true,
        QuestionKind::FreeText { multiline: true },
    )
}

pub fn build_debrief_question(ids: &mut IdGenerator) -> Question {
    question(
        ids,
        "Debrief",
        templates::DEBRIEF_TEXT.to_string(),
        false,
        QuestionKind::DebriefText,
    )
}
